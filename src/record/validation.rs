//! Record validation

use crate::error::{Result, VaultError};

/// Validate the user-supplied fields of a record
///
/// A name made only of whitespace counts as missing. There are no length
/// or character-set limits.
pub fn validate(name: &str, value: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(VaultError::validation("record name is required"));
    }
    if value.is_empty() {
        return Err(VaultError::validation("record value is required"));
    }
    Ok(())
}
