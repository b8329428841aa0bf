//! Error types for the debt check workflow
//!
//! Three families of failure exist:
//!
//! - [`ValidationError`]: field-level, surfaced next to the offending input
//! - [`ServiceError`]: a collaborator (lookup, gateway, receipts) failed
//! - [`Error`]: everything a workspace operation can return
//!
//! A lookup that finds nothing is not an error and has no variant here.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Form field an error is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Taxpayer identification number
    TaxId,
    /// Surname
    LastName,
    /// Given name
    FirstName,
    /// Patronymic
    MiddleName,
    /// Payment channel selector
    Channel,
    /// Contact phone number
    ContactPhone,
    /// Contact email
    ContactEmail,
    /// Personal data consent checkbox
    Consent,
    /// Selected debt line item
    Item,
}

impl Field {
    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::TaxId => "tax_id",
            Field::LastName => "last_name",
            Field::FirstName => "first_name",
            Field::MiddleName => "middle_name",
            Field::Channel => "channel",
            Field::ContactPhone => "contact_phone",
            Field::ContactEmail => "contact_email",
            Field::Consent => "consent",
            Field::Item => "item",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// Required field left empty
    #[error("{0} is required")]
    Required(Field),

    /// Field present but malformed
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        /// Offending field
        field: Field,
        /// Human readable reason
        reason: String,
    },

    /// Channel id not in the registry
    #[error("Unknown payment channel: {0}")]
    UnknownChannel(String),

    /// Consent checkbox not ticked
    #[error("Consent to personal data processing is required")]
    ConsentRequired,

    /// Item already paid
    #[error("Debt item {0} is not payable")]
    ItemNotPayable(String),
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidFormat`]
    pub fn invalid(field: Field, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }

    /// Field the error belongs to
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required(field) => *field,
            ValidationError::InvalidFormat { field, .. } => *field,
            ValidationError::UnknownChannel(_) => Field::Channel,
            ValidationError::ConsentRequired => Field::Consent,
            ValidationError::ItemNotPayable(_) => Field::Item,
        }
    }
}

/// Non-empty set of validation failures from one form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wrap a single failure
    pub fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    /// `Ok(())` when nothing was collected
    pub fn check(errors: Vec<ValidationError>) -> std::result::Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    /// First error attached to `field`
    pub fn for_field(&self, field: Field) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }

    /// Whether `error` was collected
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    /// Iterate over the failures
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Number of failures
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a value built through [`ValidationErrors::check`]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the list
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

/// Failure reported by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Collaborator unreachable or timed out
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Collaborator refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Workflow errors
#[derive(Error, Debug)]
pub enum Error {
    /// Form validation failed
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Collaborator failure
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Illegal payment lifecycle transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Payment not tracked by this session
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Debt item not present in the current summary
    #[error("Debt item not found: {0}")]
    ItemNotFound(String),

    /// No receipt for this payment
    #[error("Receipt unavailable: {0}")]
    ReceiptUnavailable(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Error::Validation(error.into())
    }
}
