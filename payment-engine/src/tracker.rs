//! Payment status tracking
//!
//! Owns every payment record of a session. Each submitted payment gets one
//! resolution task that waits for the [`OutcomeResolver`] and then moves the
//! record out of `Processing`. Observers follow progress through
//! [`PaymentTracker::subscribe`].

use crate::gateway::{OutcomeResolver, PaymentGateway, SimulatedGateway, SimulatedOutcome};
use crate::receipt::{Receipt, ReceiptService, SimulatedReceipts};
use crate::types::*;
use debt_core::config::PaymentConfig;
use debt_core::{Error, Metrics, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Lifecycle notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Gateway accepted the payment
    Initiated {
        /// Record as initiated
        record: PaymentRecord,
    },
    /// Payment completed
    Completed {
        /// Record with receipt reference
        record: PaymentRecord,
    },
    /// Payment failed
    Failed {
        /// Record with failure reason
        record: PaymentRecord,
    },
}

impl PaymentEvent {
    /// Record carried by the event
    pub fn record(&self) -> &PaymentRecord {
        match self {
            PaymentEvent::Initiated { record }
            | PaymentEvent::Completed { record }
            | PaymentEvent::Failed { record } => record,
        }
    }
}

/// Payment history filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Only records in this status
    pub status: Option<PaymentStatus>,

    /// Only records whose `YYYY-MM-DD` creation date contains this text
    pub date: Option<String>,
}

impl HistoryFilter {
    /// Whether `record` passes the filter
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        if let Some(status) = self.status {
            if record.status() != status {
                return false;
            }
        }

        match self.date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => record
                .created_at()
                .format("%Y-%m-%d")
                .to_string()
                .contains(date),
            _ => true,
        }
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    /// Payment shown in the status panel
    active: Option<PaymentId>,

    /// Every record, oldest first
    records: Vec<PaymentRecord>,
}

impl TrackerState {
    fn find_mut(&mut self, id: PaymentId) -> Result<&mut PaymentRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::PaymentNotFound(id.to_string()))
    }
}

struct Shared {
    state: Mutex<TrackerState>,
    events: broadcast::Sender<PaymentEvent>,
    metrics: Metrics,
}

/// Payment status tracker
#[derive(Clone)]
pub struct PaymentTracker {
    gateway: Arc<dyn PaymentGateway>,
    outcomes: Arc<dyn OutcomeResolver>,
    receipts: Arc<dyn ReceiptService>,
    shared: Arc<Shared>,
}

impl fmt::Debug for PaymentTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentTracker")
            .field("subscribers", &self.shared.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl PaymentTracker {
    /// Create new tracker
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        outcomes: Arc<dyn OutcomeResolver>,
        receipts: Arc<dyn ReceiptService>,
        metrics: Metrics,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            outcomes,
            receipts,
            shared: Arc::new(Shared {
                state: Mutex::new(TrackerState::default()),
                events,
                metrics,
            }),
        }
    }

    /// Tracker over the simulated gateway, outcome and receipt services
    pub fn simulated(config: &PaymentConfig, metrics: Metrics) -> Self {
        Self::new(
            Arc::new(SimulatedGateway::new()),
            Arc::new(SimulatedOutcome::from_config(config)),
            Arc::new(SimulatedReceipts),
            metrics,
        )
    }

    /// Initiate a payment and schedule its resolution
    ///
    /// The returned record is the new active payment. It is `Processing`
    /// until the resolution task reports the outcome.
    pub async fn submit(&self, intent: PaymentIntent) -> Result<PaymentRecord> {
        let mut record = match self.gateway.initiate(&intent).await {
            Ok(record) => record,
            Err(e) => {
                error!(item = %intent.target_item_id(), "Payment initiation failed: {}", e);
                return Err(e.into());
            }
        };

        match record.status() {
            PaymentStatus::Pending => record.start_processing()?,
            PaymentStatus::Processing => {}
            status => {
                return Err(Error::InvalidTransition(format!(
                    "gateway returned payment {} already {}",
                    record.id(),
                    status
                )))
            }
        }

        {
            let mut state = self.shared.state.lock().await;
            state.active = Some(record.id());
            state.records.push(record.clone());
        }

        self.shared.metrics.payments_initiated.inc();
        info!(
            payment_id = %record.id(),
            item = %record.target_item_id(),
            channel = %record.channel(),
            amount = %record.amount(),
            "Payment initiated"
        );
        let _ = self.shared.events.send(PaymentEvent::Initiated {
            record: record.clone(),
        });

        let tracker = self.clone();
        let pending = record.clone();
        tokio::spawn(async move {
            let outcome = tracker.outcomes.resolve(&pending).await;
            // Only fails if something else already resolved the record
            let _ = tracker.resolve(pending.id(), outcome).await;
        });

        Ok(record)
    }

    /// Move a `Processing` record to its terminal state
    ///
    /// Every record accepts exactly one outcome. Later ones fail with
    /// [`Error::InvalidTransition`] and leave the record untouched.
    pub async fn resolve(&self, id: PaymentId, outcome: PaymentOutcome) -> Result<PaymentRecord> {
        let record = {
            let mut state = self.shared.state.lock().await;
            let record = state.find_mut(id)?;
            if let Err(e) = record.apply(outcome) {
                warn!(payment_id = %id, "Rejected payment outcome: {}", e);
                return Err(e);
            }
            record.clone()
        };

        let event = match record.status() {
            PaymentStatus::Completed => {
                self.shared.metrics.payments_completed.inc();
                info!(payment_id = %id, "Payment completed");
                PaymentEvent::Completed {
                    record: record.clone(),
                }
            }
            _ => {
                self.shared.metrics.payments_failed.inc();
                warn!(
                    payment_id = %id,
                    reason = record.failure_reason().unwrap_or_default(),
                    "Payment failed"
                );
                PaymentEvent::Failed {
                    record: record.clone(),
                }
            }
        };
        let _ = self.shared.events.send(event);

        Ok(record)
    }

    /// Most recently submitted payment
    pub async fn active(&self) -> Option<PaymentRecord> {
        let state = self.shared.state.lock().await;
        let id = state.active?;
        state.records.iter().find(|r| r.id() == id).cloned()
    }

    /// Record by ID
    pub async fn get(&self, id: PaymentId) -> Result<PaymentRecord> {
        let state = self.shared.state.lock().await;
        state
            .records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| Error::PaymentNotFound(id.to_string()))
    }

    /// Records passing `filter`, newest first
    pub async fn history(&self, filter: &HistoryFilter) -> Vec<PaymentRecord> {
        let state = self.shared.state.lock().await;
        state
            .records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Receipt of a completed payment
    pub async fn fetch_receipt(&self, id: PaymentId) -> Result<Receipt> {
        let record = self.get(id).await?;
        let receipt_ref = match (record.status(), record.receipt_ref()) {
            (PaymentStatus::Completed, Some(receipt_ref)) => receipt_ref.clone(),
            (status, _) => {
                return Err(Error::ReceiptUnavailable(format!(
                    "payment {} is {}",
                    id, status
                )))
            }
        };

        Ok(self.receipts.fetch(&receipt_ref).await?)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<PaymentEvent> {
        self.shared.events.subscribe()
    }

    /// Metrics shared with the rest of the session
    pub fn metrics(&self) -> &Metrics {
        &self.shared.metrics
    }
}
