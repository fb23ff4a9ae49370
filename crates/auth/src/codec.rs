use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use crate::Claims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),
}

/// Decode the claims segment of a compact JWS credential.
///
/// No signature check and no clock: the auth service vouches for what it
/// issued, and expiry is policy the caller applies via
/// [`crate::validate_claims`]. Decoding only answers "what does this
/// credential say", and it never panics, whatever the input.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::MalformedToken(
            "expected three dot-separated segments",
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::MalformedToken("claims segment is not base64url"))?;

    serde_json::from_slice(&bytes)
        .map_err(|_| DecodeError::MalformedToken("claims segment is not a claims document"))
}
