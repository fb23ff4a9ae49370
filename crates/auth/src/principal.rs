use serde::{Deserialize, Serialize};

use crate::{Claims, Role};

/// Opaque account identifier issued by the platform.
///
/// The client never parses or fabricates one of these; it is carried through
/// from the credential and handed back to APIs that want it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The authenticated identity the shell acts as.
///
/// Derived from decoded claims and from nowhere else, so the role that picks
/// the surface is always the role the credential carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub role: Role,
    pub user_id: UserId,
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self {
            email: claims.sub.clone(),
            role: claims.role.clone(),
            user_id: claims.user_id.clone(),
        }
    }
}
