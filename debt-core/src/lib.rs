//! Debt Check Core
//!
//! Shared data model for the debt lookup and payment workflow of the
//! citizen-services portal.
//!
//! # Contents
//!
//! - **Identity Resolver**: turns raw search input (tax id or full name) into a
//!   canonical [`LookupKey`]
//! - **Debt model**: [`DebtSummary`] and [`DebtLineItem`] with derived totals
//! - **Errors**: field-level [`ValidationError`]s, collaborator
//!   [`ServiceError`]s and the workspace-wide [`Error`]
//! - **Config / Metrics**: shared by every crate in the workspace
//!
//! # Invariants
//!
//! - Totals are derived from line items, never stored
//! - A line item only becomes `Paid` through a completed payment against it
//! - A lookup key that exists has passed validation

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod money;
pub mod types;

// Re-exports
pub use config::{ChannelConfig, Config, StaleResponsePolicy};
pub use error::{Error, Field, Result, ServiceError, ValidationError, ValidationErrors};
pub use identity::{resolve, IdentityInput, SearchMode};
pub use metrics::Metrics;
pub use money::format_uzs;
pub use types::{
    DebtItemId, DebtLineItem, DebtStatus, DebtSummary, LookupKey, SubjectType,
};
