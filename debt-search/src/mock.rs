//! Simulated debt registry
//!
//! Stands in for the state registry in demos and tests:
//! - every valid key yields the same two-item summary
//! - the not-found sentinel yields [`LookupOutcome::NotFound`]
//! - configured failing queries yield a [`ServiceError`]
//! - every received key is recorded for assertions

use crate::service::{DebtLookupService, LookupOutcome};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use debt_core::config::MockConfig;
use debt_core::{
    DebtItemId, DebtLineItem, DebtStatus, DebtSummary, LookupKey, ServiceError, SubjectType,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Subject id reported for name searches
const NAME_SEARCH_SUBJECT_ID: &str = "123456789";

/// In-memory registry with simulated latency
#[derive(Debug)]
pub struct MockDebtRegistry {
    latency: Duration,
    latency_overrides: HashMap<String, Duration>,
    not_found_sentinel: String,
    failing_queries: HashSet<String>,
    calls: Mutex<Vec<LookupKey>>,
}

impl MockDebtRegistry {
    /// Registry answering after `latency`
    pub fn new(latency: Duration) -> Self {
        let defaults = MockConfig::default();
        Self {
            latency,
            latency_overrides: HashMap::new(),
            not_found_sentinel: defaults.not_found_sentinel,
            failing_queries: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Registry built from the `mock` config section
    pub fn from_config(config: &MockConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.lookup_latency_ms),
            latency_overrides: HashMap::new(),
            not_found_sentinel: config.not_found_sentinel.clone(),
            failing_queries: config.failing_queries.iter().cloned().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make lookups for `query` fail
    pub fn with_failing_query(mut self, query: impl Into<String>) -> Self {
        self.failing_queries.insert(query.into());
        self
    }

    /// Answer `query` after a custom delay
    pub fn with_latency_for(mut self, query: impl Into<String>, latency: Duration) -> Self {
        self.latency_overrides.insert(query.into(), latency);
        self
    }

    /// Number of lookups received
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Keys received, in arrival order
    pub fn calls(&self) -> Vec<LookupKey> {
        self.calls.lock().clone()
    }

    fn summary_for(&self, key: &LookupKey) -> DebtSummary {
        let (subject_name, subject_id, subject_type) = match key {
            LookupKey::TaxId { value } => (
                "Test Company LLC".to_string(),
                value.clone(),
                SubjectType::Entity,
            ),
            LookupKey::FullName { .. } => (
                key.query(),
                NAME_SEARCH_SUBJECT_ID.to_string(),
                SubjectType::Individual,
            ),
        };

        DebtSummary {
            subject_name,
            subject_id,
            subject_type,
            items: vec![
                DebtLineItem {
                    id: DebtItemId::new("1"),
                    authority: "Tax Committee".to_string(),
                    description: "Income tax for 2023".to_string(),
                    principal: Decimal::from(1_500_000),
                    due_date: date(2024, 3, 15),
                    penalty: Decimal::from(75_000),
                    status: DebtStatus::Overdue,
                },
                DebtLineItem {
                    id: DebtItemId::new("2"),
                    authority: "Social Fund".to_string(),
                    description: "Social contributions Q4 2023".to_string(),
                    principal: Decimal::from(1_000_000),
                    due_date: date(2024, 1, 20),
                    penalty: Decimal::from(75_000),
                    status: DebtStatus::Active,
                },
            ],
            as_of: Utc::now(),
        }
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[async_trait]
impl DebtLookupService for MockDebtRegistry {
    async fn lookup(&self, key: &LookupKey) -> Result<LookupOutcome, ServiceError> {
        self.calls.lock().push(key.clone());

        let query = key.query();
        let latency = self
            .latency_overrides
            .get(&query)
            .copied()
            .unwrap_or(self.latency);
        tokio::time::sleep(latency).await;

        if self.failing_queries.contains(&query) {
            return Err(ServiceError::Unavailable(format!(
                "registry did not answer for {}",
                key
            )));
        }

        if key.is_tax_id() && query == self.not_found_sentinel {
            return Ok(LookupOutcome::NotFound);
        }

        Ok(LookupOutcome::Found(self.summary_for(key)))
    }
}
