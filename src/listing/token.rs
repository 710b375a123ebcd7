//! Continuation tokens
//!
//! A token wraps the last entry (object key or common prefix) emitted on a
//! page. Clients must treat it as opaque.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine as _};

use crate::error::{Error, Result};

const TOKEN_TAG: &str = "v1:";

/// Encode the last emitted entry as a continuation token
pub fn encode(last_entry: &str) -> String {
    BASE64.encode(format!("{}{}", TOKEN_TAG, last_entry))
}

/// Decode a continuation token back to the entry it resumes after
pub fn decode(token: &str) -> Result<String> {
    let invalid = || Error::InvalidArgument("The continuation token provided is incorrect".into());

    let bytes = BASE64.decode(token).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    match text.strip_prefix(TOKEN_TAG) {
        Some(entry) if !entry.is_empty() => Ok(entry.to_string()),
        _ => Err(invalid()),
    }
}
