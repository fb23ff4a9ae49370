//! `givehub-client`
//!
//! **Responsibility:** Session lifecycle and authorized access to the GiveHub
//! platform API.
//!
//! This crate provides:
//! - A durable single-slot credential store (SQLite)
//! - A process-wide request authorizer stamping outbound requests
//! - The HTTP gateway for the platform's auth endpoints
//! - The session state machine owning every session transition
//!
//! The client is a **thin shell** around the GiveHub platform API: it never
//! verifies credential signatures and never refreshes credentials on its own.

pub mod authorizer;
pub mod config;
pub mod gateway;
pub mod session;
pub mod store;

pub use authorizer::RequestAuthorizer;
pub use config::ClientConfig;
pub use gateway::{
    AccountSummary, AuthApi, AuthGateway, AuthResponse, GatewayError, LoginCredentials,
    RegistrationProfile,
};
pub use session::{AuthError, SessionManager, SessionStatus};
pub use store::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore, StoreError};
