//! Balance edge model
//!
//! A directed net debt between two participants of a group. Edges are a
//! materialized view of the netting engine and are only ever written by a
//! full recomputation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{GroupId, ParticipantKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEdge {
    pub group_id: GroupId,

    /// Participant who owes
    pub from: ParticipantKey,

    /// Participant who is owed
    pub to: ParticipantKey,

    pub amount: f64,

    pub currency: String,
}

impl BalanceEdge {
    pub fn new(
        group_id: GroupId,
        from: ParticipantKey,
        to: ParticipantKey,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            group_id,
            from,
            to,
            amount,
            currency: currency.into(),
        }
    }

    /// Store key; one edge per ordered pair within a group
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group_id.key(), self.from, self.to)
    }

    /// Whether this edge touches the given participant
    pub fn involves(&self, participant: &ParticipantKey) -> bool {
        &self.from == participant || &self.to == participant
    }

    /// Same debt within [`EPSILON`](super::amount::EPSILON)
    pub fn same_debt(&self, other: &BalanceEdge) -> bool {
        self.group_id == other.group_id
            && self.from == other.from
            && self.to == other.to
            && super::amount::approx_eq(self.amount, other.amount)
    }
}

impl fmt::Display for BalanceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} owes {} {:.2} {}",
            self.from, self.to, self.amount, self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_display() {
        let group = GroupId::new();
        let edge = BalanceEdge::new(group, "b".into(), "a".into(), 30.0, "USD");
        assert_eq!(edge.key(), format!("{}:b:a", group.key()));
        assert_eq!(edge.to_string(), "b owes a 30.00 USD");
        assert!(edge.involves(&"a".into()));
        assert!(!edge.involves(&"c".into()));
    }
}
