//! Notification model
//!
//! Activity messages delivered to a participant when something in one of
//! their groups changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{NotificationId, ParticipantKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Expense,
    Settlement,
    GroupUpdate,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Settlement => write!(f, "settlement"),
            Self::GroupUpdate => write!(f, "group_update"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: ParticipantKey,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient: ParticipantKey, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            recipient,
            kind,
            message: message.into(),
            read: false,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationKind::GroupUpdate).unwrap();
        assert_eq!(json, "\"group_update\"");
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new("a@x.com".into(), NotificationKind::Settlement, "paid");
        assert!(!n.read);
        assert_eq!(n.kind.to_string(), "settlement");
    }
}
