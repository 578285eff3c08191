//! Participant service

use crate::audit::EntityType;
use crate::error::{SplitError, SplitResult};
use crate::models::{Participant, ParticipantKey};
use crate::storage::{Ledger, LedgerStore};

pub struct ParticipantService<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> ParticipantService<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    /// Register a new participant; fails if the key is taken
    pub async fn register(
        &self,
        key: impl Into<ParticipantKey>,
        name: &str,
        currency: Option<&str>,
    ) -> SplitResult<Participant> {
        let mut participant = Participant::new(key, name.trim());
        if let Some(currency) = currency {
            participant.currency = currency.trim().to_uppercase();
        }
        participant.validate().map_err(SplitError::Validation)?;

        if self.get(&participant.key).await?.is_some() {
            return Err(SplitError::invalid(format!(
                "participant '{}' already exists",
                participant.key
            )));
        }

        self.ledger.store().create(participant.clone()).await?;
        self.ledger.log_create(
            EntityType::Participant,
            participant.key.as_str(),
            Some(participant.display_name().to_string()),
            &participant,
        )?;

        Ok(participant)
    }

    pub async fn get(&self, key: &ParticipantKey) -> SplitResult<Option<Participant>> {
        Ok(self.ledger.store().get(key.as_str()).await?)
    }

    /// Return the participant, registering it under its key if unknown
    pub async fn get_or_create(&self, key: &ParticipantKey) -> SplitResult<Participant> {
        match self.get(key).await? {
            Some(existing) => Ok(existing),
            None => {
                let name = key.as_str().split('@').next().unwrap_or_default();
                self.register(key.clone(), name, None).await
            }
        }
    }

    /// Rename a participant
    pub async fn rename(&self, key: &ParticipantKey, name: &str) -> SplitResult<Participant> {
        let before = self.get(key).await?.ok_or_else(|| SplitError::NotFound {
            entity_type: "Participant",
            identifier: key.to_string(),
        })?;

        let mut after = before.clone();
        after.name = name.trim().to_string();
        after.updated_at = Some(chrono::Utc::now());
        self.ledger.store().update(key.as_str(), after.clone()).await?;

        self.ledger.log_update(
            EntityType::Participant,
            key.as_str(),
            Some(after.display_name().to_string()),
            &before,
            &after,
        )?;
        Ok(after)
    }

    pub async fn list(&self) -> SplitResult<Vec<Participant>> {
        Ok(self.ledger.store().list().await?)
    }
}
