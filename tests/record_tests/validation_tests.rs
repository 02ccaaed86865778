//! Tests for record validation
//!
//! These tests verify:
//! - Missing names and values are rejected
//! - Whitespace-only names count as missing
//! - No length or character-set limits apply

use recordvault::record::validate;
use recordvault::VaultError;

#[test]
fn test_validate_accepts_plain_record() {
    validate("wifi", "secret1").unwrap();
}

#[test]
fn test_validate_rejects_empty_name() {
    let result = validate("", "secret");
    assert!(matches!(result, Err(VaultError::Validation(_))));
}

#[test]
fn test_validate_rejects_whitespace_name() {
    let result = validate("   \t", "secret");
    assert!(matches!(result, Err(VaultError::Validation(_))));
}

#[test]
fn test_validate_rejects_empty_value() {
    let result = validate("wifi", "");
    assert!(matches!(result, Err(VaultError::Validation(_))));
}

#[test]
fn test_validate_has_no_length_limit() {
    let name = "n".repeat(10_000);
    let value = "v".repeat(100_000);
    validate(&name, &value).unwrap();
}

#[test]
fn test_validate_accepts_any_characters() {
    validate("pässwörd 🔑", "| ID: 1 | \n").unwrap();
}
