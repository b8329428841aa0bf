//! Payment Engine
//!
//! Turns a selected debt line item into a tracked payment.
//!
//! # Lifecycle
//!
//! ```text
//!   RawPaymentForm ──IntentBuilder──▶ PaymentIntent ──PaymentGateway──▶ PaymentRecord
//!                                                                        │
//!                                  Pending ─▶ Processing ─▶ Completed ◀──┤ OutcomeResolver
//!                                                        └▶ Failed    ◀──┘
//! ```
//!
//! # Invariants
//!
//! - The amount is frozen when the intent is built
//! - No record exists without consent
//! - A record leaves `Processing` exactly once
//! - A receipt reference exists iff the record is `Completed`

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod channels;
pub mod gateway;
pub mod intent;
pub mod receipt;
pub mod tracker;
pub mod types;

// Re-exports
pub use channels::{ChannelRegistry, PaymentChannel};
pub use debt_core::{Error, Result};
pub use gateway::{FixedOutcome, OutcomeResolver, PaymentGateway, SimulatedGateway, SimulatedOutcome};
pub use intent::IntentBuilder;
pub use receipt::{Receipt, ReceiptService, SimulatedReceipts};
pub use tracker::{HistoryFilter, PaymentEvent, PaymentTracker};
pub use types::*;
