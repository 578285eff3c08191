//! Expense model
//!
//! An expense is paid by one participant and split across several. The
//! splits must add up to the expense amount; the payer may appear in the
//! splits for their own share.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::amount::{self, approx_eq, is_positive, within_limit, MAX_AMOUNT};
use super::ids::{ExpenseId, GroupId, ParticipantKey};
use super::Recency;

/// How the expense amount was divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    /// Everyone pays the same share
    #[default]
    Equal,
    /// Each share is given explicitly
    Exact,
    /// Shares are percentages summing to 100
    Percentage,
    /// Shares are relative weights
    Shares,
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "equal"),
            Self::Exact => write!(f, "exact"),
            Self::Percentage => write!(f, "percentage"),
            Self::Shares => write!(f, "shares"),
        }
    }
}

impl std::str::FromStr for SplitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "exact" => Ok(Self::Exact),
            "percentage" | "percent" => Ok(Self::Percentage),
            "shares" => Ok(Self::Shares),
            other => Err(format!("unknown split type '{}'", other)),
        }
    }
}

/// The portion of an expense owed by one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub participant: ParticipantKey,
    pub amount: f64,
}

impl Split {
    pub fn new(participant: ParticipantKey, amount: f64) -> Self {
        Self {
            participant,
            amount,
        }
    }
}

/// Raw per-participant input used to build splits
///
/// `value` is ignored for equal splits, an amount for exact splits, a
/// percentage for percentage splits, and a weight for share splits.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitShare {
    pub participant: ParticipantKey,
    pub value: f64,
}

impl SplitShare {
    pub fn new(participant: ParticipantKey, value: f64) -> Self {
        Self { participant, value }
    }
}

/// Turn split input into concrete splits that sum to `total`
pub fn compute_splits(
    total: f64,
    split_type: SplitType,
    shares: &[SplitShare],
) -> Result<Vec<Split>, Vec<String>> {
    if !is_positive(total) {
        return Err(vec!["expense amount must be positive".to_string()]);
    }
    if !within_limit(total) {
        return Err(vec![format!(
            "expense amount must not exceed {:.2}",
            MAX_AMOUNT
        )]);
    }
    if shares.is_empty() {
        return Err(vec!["at least one participant must share the expense".to_string()]);
    }

    let weights: Vec<f64> = match split_type {
        SplitType::Equal => vec![1.0; shares.len()],
        SplitType::Exact => {
            let splits: Vec<Split> = shares
                .iter()
                .map(|s| Split::new(s.participant.clone(), s.value))
                .collect();
            let sum: f64 = splits.iter().map(|s| s.amount).sum();
            if !approx_eq(sum, total) {
                return Err(vec![format!(
                    "exact splits sum to {:.2}, expected {:.2}",
                    sum, total
                )]);
            }
            return Ok(splits);
        }
        SplitType::Percentage => {
            let sum: f64 = shares.iter().map(|s| s.value).sum();
            if !approx_eq(sum, 100.0) {
                return Err(vec![format!(
                    "percentages sum to {:.2}, expected 100",
                    sum
                )]);
            }
            shares.iter().map(|s| s.value).collect()
        }
        SplitType::Shares => shares.iter().map(|s| s.value).collect(),
    };

    let cents = amount::allocate_cents(amount::to_cents(total), &weights)
        .ok_or_else(|| vec!["split weights must be non-negative and not all zero".to_string()])?;

    Ok(shares
        .iter()
        .zip(cents)
        .filter(|(_, c)| *c > 0)
        .map(|(s, c)| Split::new(s.participant.clone(), amount::from_cents(c)))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,

    pub group_id: GroupId,

    #[serde(default)]
    pub title: String,

    pub payer: ParticipantKey,

    pub amount: f64,

    pub currency: String,

    #[serde(default)]
    pub split_type: SplitType,

    pub splits: Vec<Split>,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub date: NaiveDate,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "other".to_string()
}

impl Expense {
    pub fn new(
        group_id: GroupId,
        payer: ParticipantKey,
        amount: f64,
        currency: impl Into<String>,
        splits: Vec<Split>,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            group_id,
            title: String::new(),
            payer,
            amount,
            currency: currency.into(),
            split_type: SplitType::default(),
            splits,
            category: default_category(),
            tags: Vec::new(),
            notes: None,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the expense as edited
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn split_total(&self) -> f64 {
        self.splits.iter().map(|s| s.amount).sum()
    }

    /// Check amounts and split consistency
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !is_positive(self.amount) {
            errors.push(format!("expense amount must be positive, got {}", self.amount));
        } else if !within_limit(self.amount) {
            errors.push(format!(
                "expense amount must not exceed {:.2}, got {}",
                MAX_AMOUNT, self.amount
            ));
        }
        if self.payer.is_empty() {
            errors.push("payer is required".to_string());
        }
        if self.splits.is_empty() {
            errors.push("expense must have at least one split".to_string());
        }

        let mut seen = HashSet::new();
        for split in &self.splits {
            if !is_positive(split.amount) || !within_limit(split.amount) {
                errors.push(format!(
                    "split for '{}' must be positive and at most {:.2}, got {}",
                    split.participant, MAX_AMOUNT, split.amount
                ));
            }
            if !seen.insert(&split.participant) {
                errors.push(format!("'{}' appears in more than one split", split.participant));
            }
        }

        if !self.splits.is_empty() && !approx_eq(self.split_total(), self.amount) {
            errors.push(format!(
                "splits sum to {:.2} but expense amount is {:.2}",
                self.split_total(),
                self.amount
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Every participant referenced by this expense
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantKey> {
        std::iter::once(&self.payer).chain(self.splits.iter().map(|s| &s.participant))
    }
}

impl Recency for Expense {
    fn recency(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
