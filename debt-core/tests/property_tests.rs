//! Property-based tests for the identity resolver
//!
//! - Malformed tax ids never produce a lookup key
//! - Well-formed tax ids always do, unchanged
//! - Name triples are accepted iff both required names are long enough

use debt_core::{resolve, Field, IdentityInput, LookupKey, ValidationError};
use proptest::prelude::*;

/// Strategy for tax ids with a valid length
fn valid_tax_id_strategy() -> impl Strategy<Value = String> {
    "[0-9]{9,14}"
}

/// Strategy for digit strings with an invalid length
fn bad_length_tax_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{0,8}", "[0-9]{15,30}"]
}

/// Strategy for tax ids with at least one non-digit
fn non_digit_tax_id_strategy() -> impl Strategy<Value = String> {
    ("[0-9]{0,7}", "[a-zA-Z+\\-. ]", "[0-9]{1,7}").prop_map(|(a, b, c)| format!("{}{}{}", a, b, c))
}

fn assert_tax_id_rejected(raw: String) -> Result<(), TestCaseError> {
    let errors = resolve(&IdentityInput::tax_id(raw)).unwrap_err();
    prop_assert_eq!(errors.len(), 1);
    let is_invalid_format = matches!(
        errors.for_field(Field::TaxId),
        Some(ValidationError::InvalidFormat { .. })
    );
    prop_assert!(is_invalid_format);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: every well-formed tax id resolves to itself
    #[test]
    fn prop_valid_tax_id_accepted(raw in valid_tax_id_strategy()) {
        let key = resolve(&IdentityInput::tax_id(raw.clone())).unwrap();
        prop_assert_eq!(key, LookupKey::TaxId { value: raw });
    }

    /// Property: out-of-range lengths are rejected as InvalidFormat
    #[test]
    fn prop_bad_length_rejected(raw in bad_length_tax_id_strategy()) {
        assert_tax_id_rejected(raw)?;
    }

    /// Property: any non-digit is rejected as InvalidFormat
    #[test]
    fn prop_non_digit_rejected(raw in non_digit_tax_id_strategy()) {
        // Surrounding whitespace is trimmed, interior whitespace is not
        prop_assume!(raw.trim().chars().any(|c| !c.is_ascii_digit()));
        assert_tax_id_rejected(raw)?;
    }

    /// Property: names pass iff surname and given name have two or more chars
    #[test]
    fn prop_name_floor(last in "\\PC{0,4}", first in "\\PC{0,4}", middle in "\\PC{0,3}") {
        let input = IdentityInput::FullName {
            last: last.clone(),
            first: first.clone(),
            middle,
        };
        let expected_ok = last.trim().chars().count() >= 2 && first.trim().chars().count() >= 2;
        prop_assert_eq!(resolve(&input).is_ok(), expected_ok);
    }
}
