//! Attachment download and removal endpoints.
//!
//! Flow Overview:
//! 1) Authenticate (bearer token, or the bypass principal).
//! 2) Load the attachment joined to its matter; unknown ids are `404`.
//! 3) Authorize against the matter's secretaria; mismatches are `403`.
//! 4) Deletes only: gate on the matter status (`400`), then delete, recount
//!    and update `tem_anexos` in one transaction.
//! 5) Downloads only: materialize the body and echo the declared metadata in
//!    `X-File-*` headers.

pub(crate) mod content;
pub(crate) mod delete;
pub(crate) mod download;
mod types;

use super::error::ApiError;

pub const HEADER_FILE_NAME: &str = "x-file-name";
pub const HEADER_FILE_SIZE: &str = "x-file-size";
pub const HEADER_FILE_TYPE: &str = "x-file-type";

/// Parse the `{id}` route segment. It runs after authentication, and a
/// segment that is not an integer cannot name an attachment.
pub(crate) fn parse_attachment_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}
