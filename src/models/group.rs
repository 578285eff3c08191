//! Group model
//!
//! A group of participants sharing expenses in a single currency. Groups are
//! archived rather than deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{GroupId, ParticipantKey};
use super::Recency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,

    pub name: String,

    /// Fixed for the lifetime of the group
    pub currency: String,

    /// Unique member keys; order carries no meaning
    pub members: Vec<ParticipantKey>,

    pub created_by: ParticipantKey,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub archived: bool,
}

impl Group {
    /// Create a group; the creator is always a member and duplicates are dropped
    pub fn new(
        name: impl Into<String>,
        currency: impl Into<String>,
        created_by: ParticipantKey,
        members: impl IntoIterator<Item = ParticipantKey>,
    ) -> Self {
        let mut group = Self {
            id: GroupId::new(),
            name: name.into().trim().to_string(),
            currency: currency.into().trim().to_uppercase(),
            members: Vec::new(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
            updated_at: None,
            archived: false,
        };
        group.add_member(created_by);
        for member in members {
            group.add_member(member);
        }
        group
    }

    pub fn is_member(&self, key: &ParticipantKey) -> bool {
        self.members.contains(key)
    }

    /// Add a member; returns false if already present or the key is empty
    pub fn add_member(&mut self, key: ParticipantKey) -> bool {
        if key.is_empty() || self.is_member(&key) {
            return false;
        }
        self.members.push(key);
        true
    }

    /// Remove a member; returns false if not present
    pub fn remove_member(&mut self, key: &ParticipantKey) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != key);
        self.members.len() != before
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("group name is required".to_string());
        }
        if self.currency.is_empty() {
            errors.push("group currency is required".to_string());
        }
        if self.members.is_empty() {
            errors.push("at least one member is required".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for member in &self.members {
            if member.is_empty() {
                errors.push("member key cannot be empty".to_string());
            } else if !seen.insert(member) {
                errors.push(format!("duplicate member '{}'", member));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Recency for Group {
    fn recency(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ParticipantKey {
        ParticipantKey::new(s)
    }

    #[test]
    fn test_creator_is_member_and_duplicates_dropped() {
        let group = Group::new(
            "Trip",
            "usd",
            key("a@x.com"),
            vec![key("b@x.com"), key("A@x.com"), key("b@x.com")],
        );
        assert_eq!(group.members, vec![key("a@x.com"), key("b@x.com")]);
        assert_eq!(group.currency, "USD");
        assert!(group.validate().is_ok());
    }

    #[test]
    fn test_add_and_remove_member() {
        let mut group = Group::new("Flat", "EUR", key("a@x.com"), Vec::new());
        assert!(group.add_member(key("c@x.com")));
        assert!(!group.add_member(key("c@x.com")));
        assert!(group.remove_member(&key("c@x.com")));
        assert!(!group.remove_member(&key("c@x.com")));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut group = Group::new("", "", key("a@x.com"), Vec::new());
        group.members.push(key("a@x.com"));
        let errors = group.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
