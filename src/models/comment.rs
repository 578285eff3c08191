//! Comment model
//!
//! Free-text remarks attached to an expense. Append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, ExpenseId, ParticipantKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub expense_id: ExpenseId,
    pub author: ParticipantKey,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(expense_id: ExpenseId, author: ParticipantKey, text: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(),
            expense_id,
            author,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
