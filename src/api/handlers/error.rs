//! Error taxonomy of the attachment API and its HTTP mapping.
//!
//! Bodies are always `{"error": "..."}`. Unexpected failures add a `details`
//! field only outside production so internals never leak to real clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use super::auth::{AuthError, Environment};
use crate::access::DenyReason;
use crate::store::models::MatterStatus;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Token de acesso não fornecido")]
    MissingCredential,
    #[error("Token de acesso malformado")]
    MalformedCredential,
    #[error("Token inválido ou expirado")]
    InvalidOrExpiredCredential,
    #[error("Erro de configuração do servidor")]
    ServerMisconfigured,
    #[error("Usuário não encontrado ou inativo")]
    UnknownOrInactivePrincipal,
    #[error("Acesso negado")]
    AccessDenied,
    #[error("Anexo não encontrado")]
    NotFound,
    #[error(
        "A matéria não está mais em fase editável (status: {0}); anexos só podem ser excluídos em rascunho ou enviada"
    )]
    InvalidLifecycleState(MatterStatus),
    #[error("Erro interno do servidor")]
    UnexpectedFailure { details: Option<String> },
}

impl ApiError {
    /// Log an unexpected failure and keep its text only when the environment allows.
    pub fn unexpected(err: impl Display, environment: Environment) -> Self {
        error!("Unexpected failure: {err}");
        Self::UnexpectedFailure {
            details: environment
                .exposes_error_details()
                .then(|| err.to_string()),
        }
    }

    #[must_use]
    pub fn from_auth(err: AuthError, environment: Environment) -> Self {
        match err {
            AuthError::MissingCredential => Self::MissingCredential,
            AuthError::MalformedCredential => Self::MalformedCredential,
            AuthError::InvalidOrExpiredCredential => Self::InvalidOrExpiredCredential,
            AuthError::ServerMisconfigured => Self::ServerMisconfigured,
            AuthError::UnknownOrInactivePrincipal => Self::UnknownOrInactivePrincipal,
            AuthError::Store(err) => Self::unexpected(err, environment),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential
            | Self::MalformedCredential
            | Self::InvalidOrExpiredCredential
            | Self::UnknownOrInactivePrincipal => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidLifecycleState(_) => StatusCode::BAD_REQUEST,
            Self::ServerMisconfigured | Self::UnexpectedFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            Self::UnexpectedFailure { details } => details.clone(),
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            details,
        }
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::AccessDenied => Self::AccessDenied,
            DenyReason::InvalidLifecycleState(status) => Self::InvalidLifecycleState(status),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
