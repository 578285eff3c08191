//! Strongly-typed ID wrappers for all entity types
//!
//! Using newtype wrappers prevents accidentally mixing up IDs from different
//! entity types at compile time. Participants are keyed by a stable string
//! (their email) rather than a UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Full hyphenated form, used as the store primary key
            pub fn key(&self) -> String {
                self.0.to_string()
            }

            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if let Ok(uuid) = Uuid::parse_str(s) {
                    return Ok(Self(uuid));
                }
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(GroupId, "grp-");
define_id!(ExpenseId, "exp-");
define_id!(SettlementId, "stl-");
define_id!(CommentId, "cmt-");
define_id!(NotificationId, "ntf-");
define_id!(SnapshotId, "snap-");

/// Stable key identifying a participant (normally an email address)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantKey(String);

impl ParticipantKey {
    /// Keys are trimmed and lowercased so `Ana@Example.com` and
    /// `ana@example.com` name the same person
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(key.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ParticipantKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = GroupId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("grp-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_key_is_full_uuid() {
        let id = ExpenseId::new();
        assert_eq!(id.key().len(), 36);
        assert_eq!(ExpenseId::parse(&id.key()).unwrap(), id);
    }

    #[test]
    fn test_id_serialization() {
        let id = SettlementId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: SettlementId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_from_str_with_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: GroupId = format!("grp-{}", uuid_str).parse().unwrap();
        assert_eq!(id.as_uuid().to_string(), uuid_str);
    }

    #[test]
    fn test_participant_key_normalized() {
        let a = ParticipantKey::new("  Ana@Example.com ");
        let b = ParticipantKey::from("ana@example.com");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "ana@example.com");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"ana@example.com\"");
    }
}
