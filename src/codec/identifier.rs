// Identifier validity rules.
//
// Identifiers are opaque and only compared for equality, but an empty,
// blank or control-character-bearing id is never a real version token.

use super::error::CodecError;

/// Whether `id` can name a payload version.
pub fn is_valid_id(id: &str) -> bool {
    !id.trim().is_empty() && !id.chars().any(char::is_control)
}

pub(crate) fn check_delta_id(id: &str) -> Result<(), CodecError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(CodecError::InvalidDeltaId(id.to_owned()))
    }
}

pub(crate) fn check_base_id(id: &str) -> Result<(), CodecError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(CodecError::InvalidBaseId(id.to_owned()))
    }
}


