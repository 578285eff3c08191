//! Expense service
//!
//! Creates, edits, and deletes expenses. Every mutation is followed by a
//! balance recompute for the expense's group.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::error::{SplitError, SplitResult};
use crate::models::amount::{format_amount, is_positive};
use crate::models::{
    compute_splits, Comment, Expense, ExpenseId, Group, GroupId, NotificationKind,
    ParticipantKey, SplitShare, SplitType,
};
use crate::storage::{Ledger, LedgerStore};

use super::{BalanceService, NotificationService};

/// Input for a new expense
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub group_id: GroupId,
    pub title: String,
    pub payer: ParticipantKey,
    pub amount: f64,
    /// Defaults to the group currency
    pub currency: Option<String>,
    pub split_type: SplitType,
    /// Who shares the cost; for `Equal` an empty list means every member
    pub shares: Vec<SplitShare>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
}

impl ExpenseInput {
    /// Equal split across the whole group
    pub fn equal(
        group_id: GroupId,
        title: impl Into<String>,
        payer: ParticipantKey,
        amount: f64,
    ) -> Self {
        Self {
            group_id,
            title: title.into(),
            payer,
            amount,
            currency: None,
            split_type: SplitType::Equal,
            shares: Vec::new(),
            category: None,
            tags: Vec::new(),
            notes: None,
            date: None,
        }
    }
}

/// Fields that may change on an existing expense
#[derive(Debug, Clone, Default)]
pub struct ExpenseEdit {
    pub title: Option<String>,
    /// New total; splits are rescaled in proportion to the current ones
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
}

pub struct ExpenseService<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> ExpenseService<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    pub async fn create(&self, input: ExpenseInput) -> SplitResult<Expense> {
        let group = self.ledger.require_group(input.group_id).await?;

        let shares = if input.shares.is_empty() && input.split_type == SplitType::Equal {
            group
                .members
                .iter()
                .map(|m| SplitShare::new(m.clone(), 1.0))
                .collect()
        } else {
            input.shares
        };

        let mut errors = Vec::new();
        if input.title.trim().is_empty() {
            errors.push("expense title is required".to_string());
        }
        let currency = input
            .currency
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_else(|| group.currency.clone());
        errors.extend(membership_errors(
            &group,
            &currency,
            std::iter::once(&input.payer).chain(shares.iter().map(|s| &s.participant)),
        ));

        let splits = match compute_splits(input.amount, input.split_type, &shares) {
            Ok(splits) => splits,
            Err(reasons) => {
                errors.extend(reasons);
                Vec::new()
            }
        };
        if !errors.is_empty() {
            return Err(SplitError::Validation(errors));
        }

        let mut expense = Expense::new(
            group.id,
            input.payer,
            input.amount,
            currency,
            splits,
            input.date.unwrap_or_else(|| Utc::now().date_naive()),
        );
        expense.title = input.title.trim().to_string();
        expense.split_type = input.split_type;
        expense.tags = input.tags;
        expense.notes = input.notes;
        if let Some(category) = input.category {
            expense.category = category;
        }
        expense.validate().map_err(SplitError::Validation)?;

        self.ledger.store().create(expense.clone()).await?;
        info!(group_id = %group.id, expense_id = %expense.id, amount = expense.amount, "created expense");

        BalanceService::new(self.ledger).recompute(group.id).await?;

        let message = format!(
            "{} added '{}' ({}) in {}",
            expense.payer,
            expense.title,
            format_amount(expense.amount, &expense.currency),
            group.name
        );
        NotificationService::new(self.ledger)
            .notify_all(
                expense.splits.iter().map(|s| &s.participant),
                &expense.payer,
                NotificationKind::Expense,
                &message,
            )
            .await?;

        self.ledger.log_create(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.title.clone()),
            &expense,
        )?;

        Ok(expense)
    }

    pub async fn get(&self, id: ExpenseId) -> SplitResult<Expense> {
        self.ledger
            .store()
            .get(&id.key())
            .await?
            .ok_or_else(|| SplitError::expense_not_found(id.to_string()))
    }

    /// Find an expense by full id or short id (`exp-1a2b3c4d`)
    pub async fn find(&self, identifier: &str) -> SplitResult<Expense> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<ExpenseId>() {
            return self.get(id).await;
        }

        let expenses: Vec<Expense> = self.ledger.store().list().await?;
        expenses
            .into_iter()
            .find(|e| e.id.to_string() == identifier)
            .ok_or_else(|| SplitError::expense_not_found(identifier))
    }

    /// Expenses of a group, oldest first
    pub async fn list(&self, group_id: GroupId) -> SplitResult<Vec<Expense>> {
        let (mut expenses, _) = self.ledger.group_history(group_id).await?;
        expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(expenses)
    }

    pub async fn edit(&self, id: ExpenseId, edit: ExpenseEdit) -> SplitResult<Expense> {
        let before = self.get(id).await?;
        let group = self.ledger.require_group(before.group_id).await?;
        if group.archived {
            return Err(SplitError::invalid(format!("group '{}' is archived", group.name)));
        }

        let mut after = before.clone();
        if let Some(title) = edit.title {
            after.title = title.trim().to_string();
        }
        if let Some(category) = edit.category {
            after.category = category;
        }
        if let Some(notes) = edit.notes {
            after.notes = Some(notes);
        }
        if let Some(date) = edit.date {
            after.date = date;
        }
        if let Some(amount) = edit.amount {
            if !is_positive(amount) {
                return Err(SplitError::invalid(format!(
                    "expense amount must be positive, got {}",
                    amount
                )));
            }
            let weights: Vec<SplitShare> = before
                .splits
                .iter()
                .map(|s| SplitShare::new(s.participant.clone(), s.amount))
                .collect();
            after.splits =
                compute_splits(amount, SplitType::Shares, &weights).map_err(SplitError::Validation)?;
            after.amount = amount;
        }
        after.validate().map_err(SplitError::Validation)?;
        after.touch();

        self.ledger.store().update(&id.key(), after.clone()).await?;
        BalanceService::new(self.ledger).recompute(after.group_id).await?;

        self.ledger.log_update(
            EntityType::Expense,
            id.to_string(),
            Some(after.title.clone()),
            &before,
            &after,
        )?;
        Ok(after)
    }

    pub async fn delete(&self, id: ExpenseId) -> SplitResult<Expense> {
        let expense = self.get(id).await?;

        self.ledger.store().delete::<Expense>(&id.key()).await?;
        BalanceService::new(self.ledger).recompute(expense.group_id).await?;

        self.ledger.log_delete(
            EntityType::Expense,
            id.to_string(),
            Some(expense.title.clone()),
            &expense,
        )?;
        Ok(expense)
    }

    /// Attach a comment to an expense
    pub async fn comment(
        &self,
        id: ExpenseId,
        author: ParticipantKey,
        text: &str,
    ) -> SplitResult<Comment> {
        let expense = self.get(id).await?;
        let group = self.ledger.require_group(expense.group_id).await?;

        let mut errors = Vec::new();
        if text.trim().is_empty() {
            errors.push("comment text is required".to_string());
        }
        if !group.is_member(&author) {
            errors.push(format!("'{}' is not a member of '{}'", author, group.name));
        }
        if !errors.is_empty() {
            return Err(SplitError::Validation(errors));
        }

        let comment = Comment::new(id, author, text.trim());
        self.ledger.store().create(comment.clone()).await?;
        Ok(comment)
    }

    pub async fn comments(&self, id: ExpenseId) -> SplitResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self.ledger.store().list().await?;
        comments.retain(|c| c.expense_id == id);
        comments.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(comments)
    }
}

fn membership_errors<'k>(
    group: &Group,
    currency: &str,
    people: impl Iterator<Item = &'k ParticipantKey>,
) -> Vec<String> {
    let mut errors = Vec::new();
    if group.archived {
        errors.push(format!("group '{}' is archived", group.name));
    }
    if currency != group.currency {
        errors.push(format!(
            "expense currency {} does not match group currency {}",
            currency, group.currency
        ));
    }
    let mut reported = std::collections::BTreeSet::new();
    for who in people {
        if !group.is_member(who) && reported.insert(who) {
            errors.push(format!("'{}' is not a member of '{}'", who, group.name));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitItPaths;
    use crate::models::{BalanceEdge, Notification};
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
        (ledger, group, temp_dir)
    }

    #[tokio::test]
    async fn test_equal_split_defaults_to_all_members() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let service = ExpenseService::new(&ledger);

        let expense = service
            .create(ExpenseInput::equal(group.id, "Dinner", key("a"), 100.0))
            .await
            .unwrap();

        let amounts: Vec<f64> = expense.splits.iter().map(|s| s.amount).collect();
        assert_eq!(amounts, vec![33.34, 33.33, 33.33]);
        assert_eq!(expense.currency, "USD");

        let edges: Vec<BalanceEdge> = ledger.store().list().await.unwrap();
        assert_eq!(edges.len(), 2);

        let notes: Vec<Notification> = ledger.store().list().await.unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.recipient != key("a")));
    }

    #[tokio::test]
    async fn test_exact_split_must_sum() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let mut input = ExpenseInput::equal(group.id, "Taxi", key("a"), 50.0);
        input.split_type = SplitType::Exact;
        input.shares = vec![
            SplitShare::new(key("a"), 20.0),
            SplitShare::new(key("b"), 20.0),
        ];

        let err = ExpenseService::new(&ledger)
            .create(input)
            .await
            .unwrap_err();
        assert!(err.reasons().iter().any(|r| r.contains("exact splits")));
    }

    #[tokio::test]
    async fn test_non_member_and_currency_rejected() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let mut input = ExpenseInput::equal(group.id, "Hotel", key("z"), 50.0);
        input.currency = Some("eur".into());

        let err = ExpenseService::new(&ledger)
            .create(input)
            .await
            .unwrap_err();
        let reasons = err.reasons();
        assert!(reasons.iter().any(|r| r.contains("'z' is not a member")));
        assert!(reasons.iter().any(|r| r.contains("currency EUR")));
    }

    #[tokio::test]
    async fn test_edit_rescales_and_recomputes() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let service = ExpenseService::new(&ledger);
        let expense = service
            .create(ExpenseInput::equal(group.id, "Dinner", key("a"), 90.0))
            .await
            .unwrap();

        let edited = service
            .edit(
                expense.id,
                ExpenseEdit {
                    amount: Some(120.0),
                    title: Some("Late dinner".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.title, "Late dinner");
        assert!(edited.updated_at >= expense.updated_at);
        assert!(edited.splits.iter().all(|s| s.amount == 40.0));

        let edges = BalanceService::new(&ledger)
            .edges_for_group(group.id)
            .await
            .unwrap();
        assert!(edges.iter().all(|e| e.amount == 40.0));
    }

    #[tokio::test]
    async fn test_delete_clears_balances() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let service = ExpenseService::new(&ledger);
        let expense = service
            .create(ExpenseInput::equal(group.id, "Dinner", key("a"), 90.0))
            .await
            .unwrap();

        service.delete(expense.id).await.unwrap();
        assert!(service.list(group.id).await.unwrap().is_empty());
        assert!(service.get(expense.id).await.unwrap_err().is_not_found());

        let edges: Vec<BalanceEdge> = ledger.store().list().await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn test_comments() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let service = ExpenseService::new(&ledger);
        let expense = service
            .create(ExpenseInput::equal(group.id, "Dinner", key("a"), 90.0))
            .await
            .unwrap();

        service.comment(expense.id, key("b"), "thanks!").await.unwrap();
        assert!(service
            .comment(expense.id, key("z"), "hi")
            .await
            .unwrap_err()
            .is_validation());

        let comments = service.comments(expense.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "thanks!");
    }

    #[tokio::test]
    async fn test_find_by_short_id() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let service = ExpenseService::new(&ledger);
        let expense = service
            .create(ExpenseInput::equal(group.id, "Dinner", key("a"), 90.0))
            .await
            .unwrap();

        assert_eq!(service.find(&expense.id.to_string()).await.unwrap().id, expense.id);
        assert_eq!(service.find(&expense.id.key()).await.unwrap().id, expense.id);
        assert!(service.find("exp-00000000").await.unwrap_err().is_not_found());
    }
}
