//! Participant model
//!
//! A person identified by a stable key. Participants have no lifecycle of
//! their own beyond being referenced by group membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ParticipantKey;
use super::Recency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub key: ParticipantKey,

    #[serde(default)]
    pub name: String,

    /// Preferred display currency
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Participant {
    pub fn new(key: impl Into<ParticipantKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            currency: default_currency(),
            timezone: default_timezone(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Name for display, falling back to the key
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.key.as_str()
        } else {
            &self.name
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.key.is_empty() {
            errors.push("participant key cannot be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Recency for Participant {
    fn recency(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_key() {
        let p = Participant::new("ana@example.com", "");
        assert_eq!(p.display_name(), "ana@example.com");

        let p = Participant::new("ana@example.com", "Ana");
        assert_eq!(p.display_name(), "Ana");
    }

    #[test]
    fn test_recency_prefers_updated_at() {
        let mut p = Participant::new("ana@example.com", "Ana");
        assert_eq!(p.recency(), p.created_at);

        let later = p.created_at + chrono::Duration::hours(1);
        p.updated_at = Some(later);
        assert_eq!(p.recency(), later);
    }

    #[test]
    fn test_empty_key_rejected() {
        let p = Participant::new("   ", "Nobody");
        assert!(p.validate().is_err());
    }
}
