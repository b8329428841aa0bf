//! Core types for debt lookup
//!
//! Money is always [`Decimal`]; summaries never store totals, they derive them
//! from their line items.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity used to query debt records
///
/// Only produced by [`crate::identity::resolve`], so every key in circulation
/// has a valid shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupKey {
    /// Taxpayer identification number (9-14 digits)
    TaxId {
        /// Digits only
        value: String,
    },
    /// Name triple of an individual
    FullName {
        /// Surname
        last: String,
        /// Given name
        first: String,
        /// Patronymic
        middle: Option<String>,
    },
}

impl LookupKey {
    /// Query string sent to the registry
    pub fn query(&self) -> String {
        match self {
            LookupKey::TaxId { value } => value.clone(),
            LookupKey::FullName {
                last,
                first,
                middle,
            } => match middle {
                Some(middle) => format!("{} {} {}", last, first, middle),
                None => format!("{} {}", last, first),
            },
        }
    }

    /// Whether this is a tax id key
    pub fn is_tax_id(&self) -> bool {
        matches!(self, LookupKey::TaxId { .. })
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::TaxId { value } => write!(f, "tax_id:{}", value),
            LookupKey::FullName { .. } => write!(f, "full_name:{}", self.query()),
        }
    }
}

/// Debt line item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebtItemId(String);

impl DebtItemId {
    /// Create new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DebtItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of taxpayer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// Natural person
    Individual,
    /// Legal entity
    Entity,
}

/// Line item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    /// Not yet due
    Active,
    /// Past due date
    Overdue,
    /// Settled by a completed payment
    Paid,
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DebtStatus::Active => "active",
            DebtStatus::Overdue => "overdue",
            DebtStatus::Paid => "paid",
        };
        f.write_str(label)
    }
}

/// Single obligation owed to one authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtLineItem {
    /// Item ID
    pub id: DebtItemId,

    /// Collecting authority
    pub authority: String,

    /// What the debt is for
    pub description: String,

    /// Principal amount
    pub principal: Decimal,

    /// Due date
    pub due_date: NaiveDate,

    /// Accrued penalty
    pub penalty: Decimal,

    /// Status
    pub status: DebtStatus,
}

impl DebtLineItem {
    /// Principal plus penalty
    pub fn amount_due(&self) -> Decimal {
        self.principal + self.penalty
    }

    /// Whether a payment may be opened for this item
    pub fn is_payable(&self) -> bool {
        !matches!(self.status, DebtStatus::Paid)
    }
}

/// Result of one successful lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    /// Taxpayer display name
    pub subject_name: String,

    /// Taxpayer identification number
    pub subject_id: String,

    /// Individual or entity
    pub subject_type: SubjectType,

    /// Line items
    pub items: Vec<DebtLineItem>,

    /// Registry snapshot timestamp
    pub as_of: DateTime<Utc>,
}

impl DebtSummary {
    /// Sum of item principals
    pub fn total_principal(&self) -> Decimal {
        self.items.iter().map(|item| item.principal).sum()
    }

    /// Sum of item penalties
    pub fn total_penalty(&self) -> Decimal {
        self.items.iter().map(|item| item.penalty).sum()
    }

    /// Principal plus penalty across all items
    pub fn total_due(&self) -> Decimal {
        self.total_principal() + self.total_penalty()
    }

    /// Look up an item by id
    pub fn item(&self, id: &DebtItemId) -> Option<&DebtLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Items that still accept payment
    pub fn payable_items(&self) -> impl Iterator<Item = &DebtLineItem> {
        self.items.iter().filter(|item| item.is_payable())
    }

    /// Flag an item as settled. Returns false if the id is unknown.
    pub fn mark_paid(&mut self, id: &DebtItemId) -> bool {
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.status = DebtStatus::Paid;
                true
            }
            None => false,
        }
    }
}
