//! data: URI helpers for audio payloads

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("data URI has no payload separator")]
    MissingComma,

    #[error("data URI is not base64-encoded")]
    NotBase64,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Render bytes as `data:<mime>;base64,<payload>`
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a base64 data URI or a bare base64 string
pub fn decode(input: &str) -> Result<Vec<u8>, DataUriError> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingComma)?;
            if !header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
                return Err(DataUriError::NotBase64);
            }
            payload
        }
        None => input,
    };
    Ok(STANDARD.decode(payload.trim())?)
}
