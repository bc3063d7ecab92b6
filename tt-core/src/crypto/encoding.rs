//! Base64 helpers for the wire format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encodes bytes as standard base64.
#[must_use]
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Decodes standard base64.
///
/// # Errors
///
/// Returns the underlying decode error if `text` is not valid base64.
pub fn decode(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}
