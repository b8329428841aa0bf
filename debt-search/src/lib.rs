//! Debt Search
//!
//! Search controller for the debt check section.
//!
//! # Architecture
//!
//! ```text
//!   keystrokes / submit                 SearchHandle (Clone)
//!          │                                   │
//!          ▼                                   │ mpsc (bounded)
//!   ┌────────────────────────────────────────────────────────┐
//!   │              SearchController (single task)             │
//!   │  debounce timer ──fires──▶ resolve ──▶ dispatch lookup  │
//!   │  lookup completions ──▶ sequence check ──▶ new state    │
//!   └───────────────────────────┬────────────────────────────┘
//!                               │ watch
//!                               ▼
//!                        SearchSnapshot (UI)
//! ```
//!
//! The controller is the only writer of search state. Lookups run as
//! detached tasks and report back through the controller's completion queue.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod controller;
pub mod mock;
pub mod service;

// Re-exports
pub use controller::{spawn_search_controller, SearchHandle, SearchSnapshot, SearchState};
pub use debt_core::{Error, Result};
pub use mock::MockDebtRegistry;
pub use service::{DebtLookupService, LookupOutcome};
