//! Records shared between the persistence layer and the HTTP handlers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Organizational role held by a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System administrator.
    Admin,
    /// Central registry staff (SEMAD).
    Semad,
    /// Department staff, scoped to one secretaria.
    Secretaria,
    /// Publisher.
    Publicador,
    /// Document author, scoped to one secretaria.
    Autor,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Semad => "semad",
            Self::Secretaria => "secretaria",
            Self::Publicador => "publicador",
            Self::Autor => "autor",
        }
    }

    /// Roles that see every secretaria's matters.
    #[must_use]
    pub const fn is_cross_tenant(self) -> bool {
        matches!(self, Self::Admin | Self::Semad | Self::Publicador)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "semad" => Ok(Self::Semad),
            "secretaria" => Ok(Self::Secretaria),
            "publicador" => Ok(Self::Publicador),
            "autor" => Ok(Self::Autor),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Authenticated actor for the lifetime of one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Owning secretaria, present only for tenant-scoped roles.
    pub tenant_id: Option<i64>,
}

/// Lifecycle state of a matter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatterStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Scheduled,
    Published,
    Rejected,
    /// A stored value this build does not know about.
    Other(String),
}

impl MatterStatus {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "rascunho" => Self::Draft,
            "enviado" => Self::Submitted,
            "em_revisao" => Self::UnderReview,
            "aprovado" => Self::Approved,
            "agendado" => Self::Scheduled,
            "publicado" => Self::Published,
            "rejeitado" => Self::Rejected,
            _ => Self::Other(value.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "rascunho",
            Self::Submitted => "enviado",
            Self::UnderReview => "em_revisao",
            Self::Approved => "aprovado",
            Self::Scheduled => "agendado",
            Self::Published => "publicado",
            Self::Rejected => "rejeitado",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for MatterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matter {
    pub id: i64,
    pub title: String,
    pub status: MatterStatus,
    pub tenant_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub id: i64,
    pub matter_id: i64,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: i64,
    /// UTC timestamp rendered as `YYYY-MM-DDTHH:MM:SSZ`.
    pub uploaded_at: String,
}

/// An attachment joined to its parent matter; the matter carries the tenant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub attachment: Attachment,
    pub matter: Matter,
}

impl AttachmentRecord {
    #[must_use]
    pub fn tenant_id(&self) -> i64 {
        self.matter.tenant_id
    }
}
