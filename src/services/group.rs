//! Group service
//!
//! Groups are never hard-deleted; archiving hides them from new activity
//! while keeping their history for balances and snapshots.

use tracing::info;

use crate::audit::EntityType;
use crate::error::{SplitError, SplitResult};
use crate::models::amount::{format_amount, is_negligible};
use crate::models::{Group, GroupId, NotificationKind, ParticipantKey};
use crate::storage::{Ledger, LedgerStore};

use super::{BalanceService, NotificationService, ParticipantService};

pub struct GroupService<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> GroupService<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    /// Create a group; the creator is always a member
    ///
    /// Unknown member keys are registered as participants on the fly.
    pub async fn create(
        &self,
        name: &str,
        currency: &str,
        created_by: ParticipantKey,
        members: Vec<ParticipantKey>,
    ) -> SplitResult<Group> {
        let group = Group::new(name, currency, created_by, members);
        group.validate().map_err(SplitError::Validation)?;

        let participants = ParticipantService::new(self.ledger);
        for member in &group.members {
            participants.get_or_create(member).await?;
        }

        self.ledger.store().create(group.clone()).await?;
        info!(group_id = %group.id, members = group.members.len(), "created group");

        NotificationService::new(self.ledger)
            .notify_all(
                &group.members,
                &group.created_by,
                NotificationKind::GroupUpdate,
                &format!("{} added you to {}", group.created_by, group.name),
            )
            .await?;

        self.ledger.log_create(
            EntityType::Group,
            group.id.to_string(),
            Some(group.name.clone()),
            &group,
        )?;
        Ok(group)
    }

    pub async fn get(&self, id: GroupId) -> SplitResult<Group> {
        self.ledger.require_group(id).await
    }

    /// Find a group by full id, short id (`grp-1a2b3c4d`), or name
    pub async fn find(&self, identifier: &str) -> SplitResult<Group> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<GroupId>() {
            if let Some(group) = self.ledger.store().get::<Group>(&id.key()).await? {
                return Ok(group);
            }
        }

        let groups = self.list(true).await?;
        groups
            .into_iter()
            .find(|g| g.id.to_string() == identifier || g.name.eq_ignore_ascii_case(identifier))
            .ok_or_else(|| SplitError::group_not_found(identifier))
    }

    /// All groups ordered by name
    pub async fn list(&self, include_archived: bool) -> SplitResult<Vec<Group>> {
        let mut groups: Vec<Group> = self.ledger.store().list().await?;
        if !include_archived {
            groups.retain(|g| !g.archived);
        }
        groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(groups)
    }

    pub async fn add_member(&self, id: GroupId, member: ParticipantKey) -> SplitResult<Group> {
        let before = self.active_group(id).await?;
        if member.is_empty() {
            return Err(SplitError::invalid("member key cannot be empty"));
        }
        if before.is_member(&member) {
            return Err(SplitError::invalid(format!(
                "'{}' is already a member of '{}'",
                member, before.name
            )));
        }

        ParticipantService::new(self.ledger)
            .get_or_create(&member)
            .await?;

        let mut after = before.clone();
        after.add_member(member.clone());
        after.touch();
        self.save(&before, &after).await?;

        NotificationService::new(self.ledger)
            .notify(
                &member,
                NotificationKind::GroupUpdate,
                format!("You were added to {}", after.name),
            )
            .await?;
        Ok(after)
    }

    /// Remove a member who has nothing outstanding in the group
    pub async fn remove_member(&self, id: GroupId, member: &ParticipantKey) -> SplitResult<Group> {
        let before = self.active_group(id).await?;
        if !before.is_member(member) {
            return Err(SplitError::invalid(format!(
                "'{}' is not a member of '{}'",
                member, before.name
            )));
        }
        if before.created_by == *member {
            return Err(SplitError::invalid("the group creator cannot be removed"));
        }

        let net = BalanceService::new(self.ledger).net_positions(id).await?;
        let position = net.get(member).copied().unwrap_or(0.0);
        if !is_negligible(position) {
            return Err(SplitError::invalid(format!(
                "'{}' still has an outstanding balance of {} in '{}'",
                member,
                format_amount(position, &before.currency),
                before.name
            )));
        }

        let mut after = before.clone();
        after.remove_member(member);
        after.touch();
        self.save(&before, &after).await?;
        Ok(after)
    }

    pub async fn rename(&self, id: GroupId, name: &str) -> SplitResult<Group> {
        let before = self.active_group(id).await?;
        let mut after = before.clone();
        after.name = name.trim().to_string();
        after.validate().map_err(SplitError::Validation)?;
        after.touch();
        self.save(&before, &after).await?;
        Ok(after)
    }

    pub async fn archive(&self, id: GroupId) -> SplitResult<Group> {
        let before = self.get(id).await?;
        if before.archived {
            return Ok(before);
        }

        self.ledger.store().archive_group(id).await?;
        let after = self.get(id).await?;
        info!(group_id = %id, "archived group");

        self.ledger.log_update(
            EntityType::Group,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        )?;
        Ok(after)
    }

    async fn active_group(&self, id: GroupId) -> SplitResult<Group> {
        let group = self.get(id).await?;
        if group.archived {
            return Err(SplitError::invalid(format!("group '{}' is archived", group.name)));
        }
        Ok(group)
    }

    async fn save(&self, before: &Group, after: &Group) -> SplitResult<()> {
        self.ledger
            .store()
            .update(&after.id.key(), after.clone())
            .await?
            .ok_or_else(|| SplitError::group_not_found(after.id.to_string()))?;

        self.ledger.log_update(
            EntityType::Group,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitItPaths;
    use crate::models::Participant;
    use crate::services::{ExpenseInput, ExpenseService, SettlementInput, SettlementService};
    use crate::storage::JsonStore;
    use tempfile::TempDir;

    fn key(s: &str) -> ParticipantKey {
        ParticipantKey::new(s)
    }

    async fn create_test_ledger() -> (Ledger<JsonStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().to_path_buf());
        (Ledger::new(JsonStore::open(paths).await.unwrap()), temp_dir)
    }

    #[tokio::test]
    async fn test_create_registers_members() {
        let (ledger, _temp) = create_test_ledger().await;
        let group = GroupService::new(&ledger)
            .create("Trip", "usd", key("a@x.com"), vec![key("b@x.com"), key("A@x.com")])
            .await
            .unwrap();

        assert_eq!(group.currency, "USD");
        assert_eq!(group.members, vec![key("a@x.com"), key("b@x.com")]);

        let participants: Vec<Participant> = ledger.store().list().await.unwrap();
        assert_eq!(participants.len(), 2);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let (ledger, _temp) = create_test_ledger().await;
        let err = GroupService::new(&ledger)
            .create("  ", "USD", key("a"), Vec::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_find_by_name_or_id() {
        let (ledger, _temp) = create_test_ledger().await;
        let service = GroupService::new(&ledger);
        let group = service.create("Flat", "EUR", key("a"), Vec::new()).await.unwrap();

        assert_eq!(service.find("flat").await.unwrap().id, group.id);
        assert_eq!(service.find(&group.id.to_string()).await.unwrap().id, group.id);
        assert!(service.find("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_remove_member_with_balance_refused() {
        let (ledger, _temp) = create_test_ledger().await;
        let service = GroupService::new(&ledger);
        let group = service
            .create("Trip", "USD", key("a"), vec![key("b")])
            .await
            .unwrap();

        ExpenseService::new(&ledger)
            .create(ExpenseInput::equal(group.id, "Fuel", key("a"), 40.0))
            .await
            .unwrap();

        let err = service.remove_member(group.id, &key("b")).await.unwrap_err();
        assert!(err.reasons()[0].contains("outstanding balance"));

        SettlementService::new(&ledger)
            .record(SettlementInput::new(group.id, key("b"), key("a"), 20.0))
            .await
            .unwrap();

        let group = service.remove_member(group.id, &key("b")).await.unwrap();
        assert_eq!(group.members, vec![key("a")]);
    }

    #[tokio::test]
    async fn test_archive_blocks_changes() {
        let (ledger, _temp) = create_test_ledger().await;
        let service = GroupService::new(&ledger);
        let group = service.create("Trip", "USD", key("a"), Vec::new()).await.unwrap();

        let archived = service.archive(group.id).await.unwrap();
        assert!(archived.archived);
        assert!(service.list(false).await.unwrap().is_empty());
        assert_eq!(service.list(true).await.unwrap().len(), 1);

        let err = service.add_member(group.id, key("b")).await.unwrap_err();
        assert!(err.is_validation());
    }
}
