//! # Diário Oficial attachment service
//!
//! `diario` serves downloads and deletions of attachments that belong to
//! gazette matters. Every request goes through the same pipeline:
//!
//! 1. **Session verification**: an HS256 bearer token is checked offline.
//! 2. **Principal resolution**: the token subject must be an active user.
//! 3. **Authorization**: users act only on matters of their own secretaria,
//!    unless their role (`admin`, `semad`, `publicador`) spans all of them.
//! 4. **Lifecycle**: attachments may only be removed while the matter is a
//!    draft (`rascunho`) or freshly submitted (`enviado`).
//!
//! ## Tenant Model
//!
//! A secretaria is the tenant boundary. Matters always belong to one
//! secretaria; users belong to at most one. Foreign resources answer `403`.
//!
//! ## Attachment Bodies
//!
//! Files are not read from storage yet. Downloads return deterministic
//! placeholders chosen from the declared mime type (PDF, SVG or a plain-text
//! descriptor), and the declared metadata travels in `X-File-*` headers.
//!
//! ## Bypass
//!
//! `--auth-bypass` replaces steps 1 to 3 with a fixed administrator for
//! local testing. Step 4 still applies.

pub mod access;
pub mod api;
pub mod cli;
pub mod session_token;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
