//! Settlement recorder
//!
//! Appends a settlement to a group's history and re-derives the group's
//! balances. Stored edges are never edited directly.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::error::{SplitError, SplitResult};
use crate::models::amount::format_amount;
use crate::models::{BalanceEdge, GroupId, NotificationKind, ParticipantKey, Settlement};
use crate::storage::{Ledger, LedgerStore};

use super::{BalanceService, NotificationService};

/// A payment from one member to another
#[derive(Debug, Clone)]
pub struct SettlementInput {
    pub group_id: GroupId,
    pub from: ParticipantKey,
    pub to: ParticipantKey,
    pub amount: f64,
    /// Defaults to the group currency
    pub currency: Option<String>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub method: Option<String>,
    pub notes: Option<String>,
}

impl SettlementInput {
    pub fn new(group_id: GroupId, from: ParticipantKey, to: ParticipantKey, amount: f64) -> Self {
        Self {
            group_id,
            from,
            to,
            amount,
            currency: None,
            date: None,
            method: None,
            notes: None,
        }
    }
}

pub struct SettlementService<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> SettlementService<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    /// Record a settlement and return the group's refreshed balances
    ///
    /// All validation happens before the first write. Paying more than is
    /// owed is allowed and reverses the direction of the debt.
    pub async fn record(&self, input: SettlementInput) -> SplitResult<Vec<BalanceEdge>> {
        let group = self.ledger.require_group(input.group_id).await?;

        let currency = input
            .currency
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_else(|| group.currency.clone());

        let mut settlement = Settlement::new(
            group.id,
            input.from,
            input.to,
            input.amount,
            currency,
            input.date.unwrap_or_else(|| Utc::now().date_naive()),
        );
        settlement.method = input.method;
        settlement.notes = input.notes;

        let mut errors = settlement.validate().err().unwrap_or_default();
        if group.archived {
            errors.push(format!("group '{}' is archived", group.name));
        }
        for who in [&settlement.from, &settlement.to] {
            if !who.is_empty() && !group.is_member(who) {
                errors.push(format!("'{}' is not a member of '{}'", who, group.name));
            }
        }
        if settlement.currency != group.currency {
            errors.push(format!(
                "settlement currency {} does not match group currency {}",
                settlement.currency, group.currency
            ));
        }
        if !errors.is_empty() {
            return Err(SplitError::Validation(errors));
        }

        self.ledger.store().create(settlement.clone()).await?;
        info!(
            group_id = %group.id,
            settlement_id = %settlement.id,
            amount = settlement.amount,
            "recorded settlement"
        );

        let edges = BalanceService::new(self.ledger).recompute(group.id).await?;

        NotificationService::new(self.ledger)
            .notify(
                &settlement.to,
                NotificationKind::Settlement,
                format!(
                    "{} paid you {} in {}",
                    settlement.from,
                    format_amount(settlement.amount, &settlement.currency),
                    group.name
                ),
            )
            .await?;

        self.ledger.log_create(
            EntityType::Settlement,
            settlement.id.to_string(),
            Some(format!("{} -> {}", settlement.from, settlement.to)),
            &settlement,
        )?;

        Ok(edges)
    }

    /// Settlements of a group, oldest first
    pub async fn list(&self, group_id: GroupId) -> SplitResult<Vec<Settlement>> {
        let (_, mut settlements) = self.ledger.group_history(group_id).await?;
        settlements.sort_by(|a, b| a.date.cmp(&b.date).then(a.settled_at.cmp(&b.settled_at)));
        Ok(settlements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitItPaths;
    use crate::models::{Expense, Group, Notification, Split};
    use crate::storage::JsonStore;
    use tempfile::TempDir;

    fn key(s: &str) -> ParticipantKey {
        ParticipantKey::new(s)
    }

    async fn create_test_ledger() -> (Ledger<JsonStore>, Group, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().to_path_buf());
        let ledger = Ledger::new(JsonStore::open(paths).await.unwrap());

        let group = Group::new("Trip", "USD", key("a"), vec![key("b"), key("c")]);
        ledger.store().create(group.clone()).await.unwrap();
        let dinner = Expense::new(
            group.id,
            key("a"),
            90.0,
            "USD",
            vec![
                Split::new(key("a"), 30.0),
                Split::new(key("b"), 30.0),
                Split::new(key("c"), 30.0),
            ],
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        ledger.store().create(dinner).await.unwrap();

        (ledger, group, temp_dir)
    }

    #[tokio::test]
    async fn test_settlement_removes_debt() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let service = SettlementService::new(&ledger);

        let edges = service
            .record(SettlementInput::new(group.id, key("b"), key("a"), 30.0))
            .await
            .unwrap();

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, key("c"));
        assert_eq!(edges[0].to, key("a"));
        assert_eq!(edges[0].amount, 30.0);
        assert_eq!(service.list(group.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settlement_notifies_creditor() {
        let (ledger, group, _temp) = create_test_ledger().await;
        SettlementService::new(&ledger)
            .record(SettlementInput::new(group.id, key("b"), key("a"), 10.0))
            .await
            .unwrap();

        let notes: Vec<Notification> = ledger.store().list().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient, key("a"));
        assert_eq!(notes[0].kind, NotificationKind::Settlement);
    }

    #[tokio::test]
    async fn test_validation_collects_all_reasons() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let mut input = SettlementInput::new(group.id, key("x"), key("x"), -5.0);
        input.currency = Some("EUR".into());

        let err = SettlementService::new(&ledger)
            .record(input)
            .await
            .unwrap_err();
        let reasons = err.reasons();
        assert!(err.is_validation());
        assert!(reasons.iter().any(|r| r.contains("positive")));
        assert!(reasons.iter().any(|r| r.contains("themselves")));
        assert!(reasons.iter().any(|r| r.contains("not a member")));
        assert!(reasons.iter().any(|r| r.contains("currency")));

        let stored: Vec<Settlement> = ledger.store().list().await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_archived_group_rejected() {
        let (ledger, group, _temp) = create_test_ledger().await;
        ledger.store().archive_group(group.id).await.unwrap();

        let err = SettlementService::new(&ledger)
            .record(SettlementInput::new(group.id, key("b"), key("a"), 5.0))
            .await
            .unwrap_err();
        assert!(err.reasons().iter().any(|r| r.contains("archived")));
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let (ledger, _group, _temp) = create_test_ledger().await;
        let err = SettlementService::new(&ledger)
            .record(SettlementInput::new(GroupId::new(), key("b"), key("a"), 5.0))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_overpayment_reverses_edge() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let edges = SettlementService::new(&ledger)
            .record(SettlementInput::new(group.id, key("b"), key("a"), 50.0))
            .await
            .unwrap();

        // b now holds a 20 credit, so c's debt is split between b and a
        assert!(edges.iter().all(|e| e.from == key("c")));
        let to_b = edges.iter().find(|e| e.to == key("b")).unwrap();
        let to_a = edges.iter().find(|e| e.to == key("a")).unwrap();
        assert_eq!(to_b.amount, 20.0);
        assert_eq!(to_a.amount, 10.0);
    }
}
