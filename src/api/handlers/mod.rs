//! HTTP handlers for the gazette API.
//!
//! Attachment routes share one pipeline: authenticate, load, authorize, then
//! act. Errors from every stage are rendered through [`error::ApiError`].

pub mod attachments;
pub mod auth;
pub mod error;
pub mod health;
