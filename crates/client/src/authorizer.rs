//! Ambient bearer credential for outbound requests.

use std::sync::{Arc, Mutex, MutexGuard};

/// Attaches the session's bearer credential to outbound requests.
///
/// One process-wide instance is shared by everything that talks to the
/// platform API, so no call site hand-rolls an `Authorization` header. The
/// session state machine is the only writer.
#[derive(Debug, Clone, Default)]
pub struct RequestAuthorizer {
    token: Arc<Mutex<Option<String>>>,
}

impl RequestAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `token` the ambient credential for subsequent requests.
    pub fn attach(&self, token: &str) {
        *self.lock() = Some(token.to_string());
    }

    /// Drop the ambient credential; subsequent requests go out anonymous.
    pub fn detach(&self) {
        *self.lock() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.lock().is_some()
    }

    /// Stamp `Authorization: Bearer <token>` on an outbound request, or pass
    /// it through untouched when no credential is attached.
    pub fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.lock().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // The guarded critical sections never panic, so a poisoned lock only
    // means another thread died elsewhere; keep serving the stored value.
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
