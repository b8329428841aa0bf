//! Metrics collection for observability
//!
//! Prometheus counters for the lookup and payment workflow. Each [`Metrics`]
//! owns its registry, so several sessions can live in one process.
//!
//! # Metrics
//!
//! - `debt_lookups_dispatched_total` - Lookups sent to the registry
//! - `debt_lookups_stale_total` - Responses dropped as superseded
//! - `debt_lookup_failures_total` - Lookups that failed with a service error
//! - `payments_initiated_total` - Payments accepted by a gateway
//! - `payments_completed_total` - Payments that reached `Completed`
//! - `payments_failed_total` - Payments that reached `Failed`

use prometheus::{IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Lookups dispatched
    pub lookups_dispatched: IntCounter,

    /// Stale responses discarded
    pub lookups_stale: IntCounter,

    /// Failed lookups
    pub lookup_failures: IntCounter,

    /// Payments initiated
    pub payments_initiated: IntCounter,

    /// Payments completed
    pub payments_completed: IntCounter,

    /// Payments failed
    pub payments_failed: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let counter = |name: &str, help: &str| -> prometheus::Result<IntCounter> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        Ok(Self {
            lookups_dispatched: counter(
                "debt_lookups_dispatched_total",
                "Lookups sent to the debt registry",
            )?,
            lookups_stale: counter(
                "debt_lookups_stale_total",
                "Lookup responses discarded as superseded",
            )?,
            lookup_failures: counter(
                "debt_lookup_failures_total",
                "Lookups that failed with a service error",
            )?,
            payments_initiated: counter(
                "payments_initiated_total",
                "Payments accepted by a gateway",
            )?,
            payments_completed: counter(
                "payments_completed_total",
                "Payments that completed",
            )?,
            payments_failed: counter("payments_failed_total", "Payments that failed")?,
            registry,
        })
    }
}
