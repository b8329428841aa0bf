//! Identity resolver
//!
//! Normalizes raw search input into a [`LookupKey`]. Pure: no I/O, no state.

use crate::error::{Field, ValidationError, ValidationErrors};
use crate::types::LookupKey;
use serde::{Deserialize, Serialize};

/// Minimum tax id length (digits)
pub const TAX_ID_MIN_LEN: usize = 9;

/// Maximum tax id length (digits)
pub const TAX_ID_MAX_LEN: usize = 14;

/// Minimum length of surname and given name
pub const NAME_MIN_LEN: usize = 2;

/// Search form tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Search by taxpayer identification number
    #[default]
    TaxId,
    /// Search by name triple
    FullName,
}

/// Raw search form contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityInput {
    /// Tax id field
    TaxId {
        /// Field contents
        value: String,
    },
    /// Name fields; empty middle name means none
    FullName {
        /// Surname
        last: String,
        /// Given name
        first: String,
        /// Patronymic (optional)
        middle: String,
    },
}

impl IdentityInput {
    /// Tax id input
    pub fn tax_id(value: impl Into<String>) -> Self {
        IdentityInput::TaxId {
            value: value.into(),
        }
    }

    /// Tab this input belongs to
    pub fn mode(&self) -> SearchMode {
        match self {
            IdentityInput::TaxId { .. } => SearchMode::TaxId,
            IdentityInput::FullName { .. } => SearchMode::FullName,
        }
    }
}

/// Validate input and build its lookup key
pub fn resolve(input: &IdentityInput) -> Result<LookupKey, ValidationErrors> {
    match input {
        IdentityInput::TaxId { value } => resolve_tax_id(value),
        IdentityInput::FullName {
            last,
            first,
            middle,
        } => resolve_full_name(last, first, middle),
    }
}

fn resolve_tax_id(raw: &str) -> Result<LookupKey, ValidationErrors> {
    let value = raw.trim();

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid(Field::TaxId, "must contain only digits").into());
    }

    if !(TAX_ID_MIN_LEN..=TAX_ID_MAX_LEN).contains(&value.len()) {
        return Err(ValidationError::invalid(
            Field::TaxId,
            format!("must be {} to {} digits", TAX_ID_MIN_LEN, TAX_ID_MAX_LEN),
        )
        .into());
    }

    Ok(LookupKey::TaxId {
        value: value.to_string(),
    })
}

fn resolve_full_name(last: &str, first: &str, middle: &str) -> Result<LookupKey, ValidationErrors> {
    let last = last.trim();
    let first = first.trim();
    let middle = middle.trim();

    let mut errors = Vec::new();
    for (field, value) in [(Field::LastName, last), (Field::FirstName, first)] {
        if value.chars().count() < NAME_MIN_LEN {
            errors.push(ValidationError::invalid(
                field,
                format!("must be at least {} characters", NAME_MIN_LEN),
            ));
        }
    }
    ValidationErrors::check(errors)?;

    Ok(LookupKey::FullName {
        last: last.to_string(),
        first: first.to_string(),
        middle: (!middle.is_empty()).then(|| middle.to_string()),
    })
}
