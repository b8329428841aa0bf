//! Payment gateway and outcome resolution
//!
//! Initiation and resolution are separate seams: a gateway accepts the
//! intent and hands back a `Processing` record, and an [`OutcomeResolver`]
//! later decides how that record ends. A real adapter would await the
//! gateway's callback in its resolver.

use crate::types::{ChannelId, PaymentIntent, PaymentOutcome, PaymentRecord, ReceiptRef};
use async_trait::async_trait;
use debt_core::config::PaymentConfig;
use debt_core::ServiceError;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Accepts payment intents
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register the payment with the gateway
    async fn initiate(&self, intent: &PaymentIntent) -> Result<PaymentRecord, ServiceError>;
}

/// Decides the terminal outcome of an accepted payment
#[async_trait]
pub trait OutcomeResolver: Send + Sync {
    /// Wait for and return the outcome of `record`
    async fn resolve(&self, record: &PaymentRecord) -> PaymentOutcome;
}

/// In-process gateway that accepts every intent
#[derive(Debug, Default, Clone)]
pub struct SimulatedGateway {
    unavailable: HashSet<ChannelId>,
}

impl SimulatedGateway {
    /// Create new gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse intents for `channel`
    pub fn with_unavailable_channel(mut self, channel: impl Into<String>) -> Self {
        self.unavailable.insert(ChannelId::new(channel));
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn initiate(&self, intent: &PaymentIntent) -> Result<PaymentRecord, ServiceError> {
        if self.unavailable.contains(intent.channel()) {
            warn!(channel = %intent.channel(), "Payment channel unavailable");
            return Err(ServiceError::Unavailable(format!(
                "channel {} is not accepting payments",
                intent.channel()
            )));
        }

        let record = PaymentRecord::processing(intent);
        debug!(payment_id = %record.id(), "Gateway accepted payment");
        Ok(record)
    }
}

fn receipt_for(record: &PaymentRecord) -> ReceiptRef {
    ReceiptRef::new(format!("rcpt-{}", record.id()))
}

/// Weighted random outcome after a fixed processing delay
#[derive(Debug, Clone)]
pub struct SimulatedOutcome {
    delay: Duration,
    success_ratio: f64,
}

impl SimulatedOutcome {
    /// Create new resolver
    ///
    /// `success_ratio` is clamped to `[0, 1]`; NaN means every payment fails.
    pub fn new(delay: Duration, success_ratio: f64) -> Self {
        let success_ratio = if success_ratio.is_nan() {
            warn!("success_ratio is NaN, payments will fail");
            0.0
        } else {
            success_ratio.clamp(0.0, 1.0)
        };
        Self {
            delay,
            success_ratio,
        }
    }

    /// Resolver for the `payment` config section
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(
            Duration::from_millis(config.processing_delay_ms),
            config.success_ratio,
        )
    }
}

#[async_trait]
impl OutcomeResolver for SimulatedOutcome {
    async fn resolve(&self, record: &PaymentRecord) -> PaymentOutcome {
        tokio::time::sleep(self.delay).await;

        let success = rand::thread_rng().gen_bool(self.success_ratio);
        if success {
            PaymentOutcome::Completed {
                receipt_ref: receipt_for(record),
            }
        } else {
            PaymentOutcome::Failed {
                reason: "Payment declined by the bank".to_string(),
            }
        }
    }
}

/// Deterministic outcome for tests and demos
#[derive(Debug, Clone)]
pub struct FixedOutcome {
    delay: Duration,
    succeed: bool,
}

impl FixedOutcome {
    /// Always complete after `delay`
    pub fn completed(delay: Duration) -> Self {
        Self {
            delay,
            succeed: true,
        }
    }

    /// Always fail after `delay`
    pub fn failed(delay: Duration) -> Self {
        Self {
            delay,
            succeed: false,
        }
    }
}

#[async_trait]
impl OutcomeResolver for FixedOutcome {
    async fn resolve(&self, record: &PaymentRecord) -> PaymentOutcome {
        tokio::time::sleep(self.delay).await;

        if self.succeed {
            PaymentOutcome::Completed {
                receipt_ref: receipt_for(record),
            }
        } else {
            PaymentOutcome::Failed {
                reason: "Payment declined".to_string(),
            }
        }
    }
}
