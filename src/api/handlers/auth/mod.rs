//! Authentication for the attachment endpoints.
//!
//! Requests carry an HS256 session token in `Authorization: Bearer <token>`.
//! The verifier checks the token offline against the configured secret, then
//! the resolver loads the active user it names. Inactive accounts resolve
//! exactly like unknown ones so the API never confirms an account exists.
//!
//! ## Bypass
//!
//! `AuthConfig::with_bypass(true)` swaps the whole step for a fixed admin
//! principal. It exists for local testing only, is off unless explicitly
//! enabled, and logs a warning at startup and on every request it serves.

mod error;
pub(crate) mod principal;
mod state;
pub(crate) mod verifier;

pub use error::AuthError;
pub use principal::authenticate;
pub use state::{AuthConfig, AuthState, Environment};
pub use verifier::now_unix_seconds;
