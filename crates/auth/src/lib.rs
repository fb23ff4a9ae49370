//! `givehub-auth` — pure session/authorization boundary for the givehub client.
//!
//! This crate is intentionally decoupled from HTTP and storage: tokens come in
//! as strings, time comes in as an argument, and everything here is a
//! deterministic function the effectful shell builds on.

pub mod claims;
pub mod codec;
pub mod principal;
pub mod roles;
pub mod surface;

pub use claims::{Claims, TokenValidationError, validate_claims};
pub use codec::{DecodeError, decode};
pub use principal::{Principal, UserId};
pub use roles::Role;
pub use surface::{Surface, resolve_surface};
