use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Role, UserId};

/// Claims carried by a platform credential (transport-agnostic).
///
/// This is the subset of the token payload the client acts on. Claims the
/// auth service adds over time are ignored on decode rather than treated as
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity: the account's login email.
    pub sub: String,

    /// Role granted to the account.
    pub role: Role,

    /// Opaque account identifier.
    #[serde(rename = "userId")]
    pub user_id: UserId,

    /// Expiration instant (`exp` on the wire, seconds since epoch).
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("credential has expired")]
    Expired,
}

/// Deterministically validate decoded claims against a caller-supplied clock.
///
/// A credential is live only while `expires_at` is strictly in the future.
/// Note: this validates the *claims* only. Decoding lives in [`crate::codec`]
/// and signature verification is the auth service's job, never this client's.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
