//! Settlement model
//!
//! A payment from a debtor to a creditor. Settlements are append-only: they
//! are created and never edited.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::amount::{is_positive, within_limit, MAX_AMOUNT};
use super::ids::{GroupId, ParticipantKey, SettlementId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,

    pub group_id: GroupId,

    /// Debtor paying
    pub from: ParticipantKey,

    /// Creditor receiving
    pub to: ParticipantKey,

    pub amount: f64,

    pub currency: String,

    /// How the money changed hands (cash, bank transfer, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub date: NaiveDate,

    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        group_id: GroupId,
        from: ParticipantKey,
        to: ParticipantKey,
        amount: f64,
        currency: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: SettlementId::new(),
            group_id,
            from,
            to,
            amount,
            currency: currency.into(),
            method: None,
            notes: None,
            date,
            settled_at: Utc::now(),
        }
    }

    /// Checks that need no knowledge of the group
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !is_positive(self.amount) {
            errors.push(format!("settlement amount must be positive, got {}", self.amount));
        } else if !within_limit(self.amount) {
            errors.push(format!(
                "settlement amount must not exceed {:.2}, got {}",
                MAX_AMOUNT, self.amount
            ));
        }
        if self.from.is_empty() || self.to.is_empty() {
            errors.push("settlement needs both a payer and a recipient".to_string());
        } else if self.from == self.to {
            errors.push(format!("'{}' cannot settle with themselves", self.from));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
