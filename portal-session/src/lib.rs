//! Debt Check Session
//!
//! Wires the search controller and the payment engine into the view-model
//! behind the portal's "check my debts" section and the dashboard's payment
//! panel.
//!
//! # Flow
//!
//! ```text
//!   keystrokes / submit ─▶ SearchHandle ─▶ Success(summary)
//!                                               │ open_payment(item)
//!                                               ▼
//!                                         PaymentDialog ─submit_payment─▶ PaymentTracker
//!                                                                             │ Completed
//!   summary item marked Paid ◀──────────── completion relay ◀─────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod dialog;
mod relay;
pub mod session;

// Re-exports
pub use debt_core::{Config, Error, Result};
pub use dialog::PaymentDialog;
pub use session::{DebtCheckSession, SessionServices};
