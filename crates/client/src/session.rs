//! Session state machine: the sole writer of session state.
//!
//! Everything observable about the session funnels through here: the durable
//! credential slot, the ambient request authorizer and the published
//! [`SessionStatus`] only ever move together, under one transition lock.
//! Network-bound operations are guarded twice over: an operation gate rejects
//! overlapping calls up front, and a generation counter discards results that
//! resolve after the session has already moved on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, watch};

use givehub_auth::{DecodeError, Principal, Role, Surface, decode, resolve_surface, validate_claims};

use crate::authorizer::RequestAuthorizer;
use crate::config::ClientConfig;
use crate::gateway::{
    AccountSummary, AuthApi, AuthGateway, AuthResponse, GatewayError, LoginCredentials,
    RegistrationProfile,
};
use crate::store::{CredentialStore, SqliteCredentialStore, StoreError};

/// Tri-state session lifecycle.
///
/// `Loading` exists only between process start and the completion of
/// [`SessionManager::initialize`]; nothing session-dependent should render
/// until it resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    Authenticated(Principal),
}

impl SessionStatus {
    /// The surface the shell should route to, or `None` while loading.
    pub fn surface(&self) -> Option<Surface> {
        match self {
            SessionStatus::Loading => None,
            SessionStatus::Unauthenticated => Some(Surface::Entry),
            SessionStatus::Authenticated(principal) => Some(resolve_surface(principal)),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The service understood the request and said no.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// Transport-level failure. The caller may retry; the client never does
    /// on its own.
    #[error("network failure while contacting the auth service: {0}")]
    Network(String),

    /// `register` was asked for a role with no registration endpoint.
    #[error("role '{0}' has no registration endpoint")]
    InvalidRoleKind(Role),

    /// The service reported success but issued a credential the client
    /// cannot use.
    #[error("auth service issued an unusable credential: {0}")]
    BadCredential(#[from] DecodeError),

    /// Another initialize/login/register is still running.
    #[error("another session operation is already in flight")]
    OperationInFlight,

    /// login/register while a session is already live.
    #[error("a session is already active; log out first")]
    AlreadyAuthenticated,

    /// login/register before `initialize` resolved the stored credential.
    #[error("session is still loading; initialize first")]
    NotReady,

    /// The platform rejected the session's credential; the session was reset.
    #[error("the platform rejected the session credential")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The service answered outside its own contract.
    #[error("unexpected auth service response: {0}")]
    Protocol(String),
}

/// Shared mutable session state. [`SessionManager`] methods are the only
/// writers.
struct SessionCore {
    store: Arc<dyn CredentialStore>,
    authorizer: RequestAuthorizer,
    status_tx: watch::Sender<SessionStatus>,

    /// Bumped on every committed transition. Async results carry the
    /// generation they started under and are discarded if it moved on.
    generation: AtomicU64,

    /// Serializes commits so the store, the authorizer and the published
    /// status always change together.
    transition: Mutex<()>,

    /// Rejects overlapping initialize/login/register calls up front.
    op_gate: Mutex<()>,
}

/// Owner of the session lifecycle.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    core: Arc<SessionCore>,
    gateway: Arc<dyn AuthApi>,
}

impl SessionManager {
    /// Build a manager over an explicit store, gateway and authorizer.
    ///
    /// The gateway must send its requests through the same authorizer handle,
    /// otherwise attach/detach would not reach outbound traffic.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        gateway: Arc<dyn AuthApi>,
        authorizer: RequestAuthorizer,
    ) -> Self {
        let (status_tx, _status_rx) = watch::channel(SessionStatus::Loading);

        Self {
            core: Arc::new(SessionCore {
                store,
                authorizer,
                status_tx,
                generation: AtomicU64::new(0),
                transition: Mutex::new(()),
                op_gate: Mutex::new(()),
            }),
            gateway,
        }
    }

    /// Wire a manager from configuration: SQLite store under the configured
    /// data directory and the HTTP gateway, sharing one authorizer.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StoreError> {
        let authorizer = RequestAuthorizer::new();

        let store: Arc<dyn CredentialStore> = match &config.data_dir {
            Some(dir) => Arc::new(SqliteCredentialStore::in_dir(dir)),
            None => Arc::new(SqliteCredentialStore::open_default()?),
        };

        let gateway = Arc::new(AuthGateway::new(config.api_url.clone(), authorizer.clone()));

        Ok(Self::new(store, gateway, authorizer))
    }

    /// Current session state.
    pub fn status(&self) -> SessionStatus {
        self.core.status_tx.borrow().clone()
    }

    /// Watch session state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.core.status_tx.subscribe()
    }

    /// The authorizer every outbound client of the platform API should
    /// stamp its requests with.
    pub fn authorizer(&self) -> &RequestAuthorizer {
        &self.core.authorizer
    }

    /// Resolve `Loading` from the stored credential. Runs once at startup;
    /// a repeat call is a no-op returning the current status.
    ///
    /// A malformed or expired stored credential is a normal outcome of this
    /// ramp-up, not an error: the slot is cleared quietly and the session
    /// resolves to `Unauthenticated`. No network round trip happens here.
    pub async fn initialize(&self) -> Result<SessionStatus, AuthError> {
        let _op = self
            .core
            .op_gate
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        if !matches!(self.status(), SessionStatus::Loading) {
            tracing::debug!("initialize called on an already-resolved session");
            return Ok(self.status());
        }

        let generation = self.core.generation.load(Ordering::SeqCst);

        let Some(token) = self.core.store.get().await? else {
            return Ok(self.commit_unauthenticated(false).await);
        };

        let claims = match decode(&token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "stored credential is malformed; discarding");
                return Ok(self.commit_unauthenticated(true).await);
            }
        };

        if let Err(err) = validate_claims(&claims, Utc::now()) {
            tracing::debug!(error = %err, "stored credential is no longer live; discarding");
            return Ok(self.commit_unauthenticated(true).await);
        }

        let principal = Principal::from(&claims);
        tracing::info!(role = %principal.role, "restored session from stored credential");
        self.commit_authenticated(&token, principal, false, generation)
            .await
    }

    /// Sign in with existing credentials.
    ///
    /// On a grant the returned token is decoded, persisted, attached and
    /// published in one transition; the principal comes from the claims, not
    /// the response envelope. On a rejection or a transport failure nothing
    /// changes and the error is surfaced for the caller to display.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<SessionStatus, AuthError> {
        let _op = self
            .core
            .op_gate
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;
        self.require_unauthenticated()?;

        let generation = self.core.generation.load(Ordering::SeqCst);
        let response = self.gateway.login(&credentials).await;
        self.finish_credential_grant(generation, response).await
    }

    /// Register a new account and, on a grant, establish its session.
    ///
    /// Dispatch is per role endpoint. A role outside the platform's three
    /// registerable kinds cannot come from the registration wizard, so it is
    /// rejected loudly as a programmer error instead of being mapped to some
    /// default endpoint.
    pub async fn register(
        &self,
        profile: RegistrationProfile,
        role: Role,
    ) -> Result<SessionStatus, AuthError> {
        let _op = self
            .core
            .op_gate
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;
        self.require_unauthenticated()?;

        let generation = self.core.generation.load(Ordering::SeqCst);
        let response = match &role {
            Role::Donor => self.gateway.register_donor(&profile).await,
            Role::Ngo => self.gateway.register_ngo(&profile).await,
            Role::Admin => self.gateway.register_admin(&profile).await,
            Role::Unknown(_) => {
                tracing::error!(role = %role, "register called with a role that has no endpoint");
                return Err(AuthError::InvalidRoleKind(role));
            }
        };
        self.finish_credential_grant(generation, response).await
    }

    /// Unconditionally end the session. Idempotent, requires no network, and
    /// never fails observably: store trouble is logged and swallowed.
    pub async fn logout(&self) -> SessionStatus {
        tracing::info!("logout requested");
        self.commit_unauthenticated(true).await
    }

    /// Fetch the account summary behind the session's credential.
    ///
    /// A `401 Unauthorized` answer here is the platform revoking the
    /// session: the client resets to `Unauthenticated` exactly once and
    /// surfaces the error. This is the only automatic session-invalidation
    /// trigger; there is no timer and no proactive expiry watcher.
    pub async fn account(&self) -> Result<AccountSummary, AuthError> {
        let generation = self.core.generation.load(Ordering::SeqCst);

        match self.gateway.me().await {
            Ok(summary) => Ok(summary),
            Err(GatewayError::Unauthorized) => {
                self.invalidate_if_current(generation).await;
                Err(AuthError::Unauthorized)
            }
            Err(err) => Err(map_gateway_error(err)),
        }
    }

    fn require_unauthenticated(&self) -> Result<(), AuthError> {
        match self.status() {
            SessionStatus::Unauthenticated => Ok(()),
            SessionStatus::Authenticated(_) => Err(AuthError::AlreadyAuthenticated),
            SessionStatus::Loading => Err(AuthError::NotReady),
        }
    }

    /// Apply an auth service response: decode, persist, attach, publish. A
    /// grant that resolves after the session moved on (a logout won the
    /// race) is discarded and the caller sees the current status instead of
    /// a resurrected session.
    async fn finish_credential_grant(
        &self,
        generation: u64,
        response: Result<AuthResponse, GatewayError>,
    ) -> Result<SessionStatus, AuthError> {
        let envelope = response.map_err(map_gateway_error)?;

        if !envelope.success {
            let reason = envelope
                .message
                .unwrap_or_else(|| "credentials were not accepted".to_string());
            tracing::info!(%reason, "auth service rejected the request");
            return Err(AuthError::Rejected(reason));
        }

        let token = envelope.token.ok_or_else(|| {
            AuthError::Protocol("auth service reported success without a credential".to_string())
        })?;

        let claims = decode(&token)?;
        if let Err(err) = validate_claims(&claims, Utc::now()) {
            return Err(AuthError::Protocol(format!(
                "auth service issued a credential that is not live: {err}"
            )));
        }

        let principal = Principal::from(&claims);
        tracing::info!(role = %principal.role, subject = %principal.email, "session established");
        self.commit_authenticated(&token, principal, true, generation)
            .await
    }

    /// Commit an authenticated session. The credential write happens before
    /// anything becomes observable; if persisting fails, nothing else moves.
    async fn commit_authenticated(
        &self,
        token: &str,
        principal: Principal,
        persist: bool,
        expected_generation: u64,
    ) -> Result<SessionStatus, AuthError> {
        let _t = self.core.transition.lock().await;

        if self.core.generation.load(Ordering::SeqCst) != expected_generation {
            tracing::debug!("discarding credential grant that resolved after the session moved on");
            return Ok(self.status());
        }

        if persist {
            self.core.store.set(token).await?;
        }
        self.core.authorizer.attach(token);
        self.core.generation.fetch_add(1, Ordering::SeqCst);

        let status = SessionStatus::Authenticated(principal);
        self.core.status_tx.send_replace(status.clone());
        Ok(status)
    }

    /// Commit an unauthenticated session, optionally emptying the credential
    /// slot.
    async fn commit_unauthenticated(&self, clear_store: bool) -> SessionStatus {
        let _t = self.core.transition.lock().await;

        if clear_store {
            if let Err(err) = self.core.store.clear().await {
                tracing::warn!(error = %err, "failed to clear the credential store");
            }
        }
        self.core.authorizer.detach();
        self.core.generation.fetch_add(1, Ordering::SeqCst);

        self.core.status_tx.send_replace(SessionStatus::Unauthenticated);
        SessionStatus::Unauthenticated
    }

    /// Forced logout driven by an unauthorized response, applied only while
    /// the session the request was issued under is still the current one.
    /// Repeated 401s and stragglers from superseded sessions are no-ops.
    async fn invalidate_if_current(&self, generation: u64) {
        let _t = self.core.transition.lock().await;

        if self.core.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("ignoring unauthorized response from a superseded session");
            return;
        }
        if !matches!(&*self.core.status_tx.borrow(), SessionStatus::Authenticated(_)) {
            return;
        }

        tracing::warn!("platform rejected the session credential; signing out");
        if let Err(err) = self.core.store.clear().await {
            tracing::warn!(error = %err, "failed to clear the credential store");
        }
        self.core.authorizer.detach();
        self.core.generation.fetch_add(1, Ordering::SeqCst);
        self.core.status_tx.send_replace(SessionStatus::Unauthenticated);
    }
}

fn map_gateway_error(err: GatewayError) -> AuthError {
    match err {
        GatewayError::Network(reason) => AuthError::Network(reason),
        GatewayError::Unauthorized => {
            AuthError::Rejected("credentials were not accepted".to_string())
        }
        GatewayError::Api(status, body) => {
            AuthError::Protocol(format!("auth service answered {status}: {body}"))
        }
        GatewayError::Parse(reason) => AuthError::Protocol(reason),
    }
}
