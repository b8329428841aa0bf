//! Debt lookup service contract
//!
//! The registry behind this trait is an external collaborator (the state debt
//! registry in production, [`crate::MockDebtRegistry`] in tests and demos).

use async_trait::async_trait;
use debt_core::{DebtSummary, LookupKey, ServiceError};

/// Outcome of a successful registry call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Debts found for the subject
    Found(DebtSummary),
    /// Registry has no data for the key
    NotFound,
}

/// Debt registry lookup
#[async_trait]
pub trait DebtLookupService: Send + Sync {
    /// Fetch the debt summary for a validated key
    async fn lookup(&self, key: &LookupKey) -> Result<LookupOutcome, ServiceError>;
}
