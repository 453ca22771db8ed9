use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{parse_attachment_id, types::DeleteAttachmentResponse};
use crate::access::{Action, DenyReason, Mutation, check_mutation_allowed};
use crate::api::handlers::{
    auth::{AuthState, authenticate},
    error::{ApiError, ErrorBody},
};
use crate::store::{DeleteOutcome, GazetteStore, models::MatterStatus};

const DELETED_MESSAGE: &str = "Anexo excluído com sucesso";

/// Lifecycle gate handed to the store so the status is checked again under
/// the matter lock.
fn removable(status: &MatterStatus) -> Result<(), DenyReason> {
    check_mutation_allowed(status, Mutation::RemoveAttachment).into_result()
}

#[utoipa::path(
    delete,
    path = "/attachments/{id}",
    params(("id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment removed and matter flag recomputed", body = DeleteAttachmentResponse),
        (status = 400, description = "Matter is no longer editable", body = ErrorBody),
        (status = 401, description = "Missing, malformed or invalid token, or inactive user", body = ErrorBody),
        (status = 403, description = "Attachment belongs to another secretaria", body = ErrorBody),
        (status = 404, description = "Attachment not found", body = ErrorBody),
        (status = 500, description = "Server misconfigured or unexpected failure", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "attachments"
)]
#[instrument(skip(headers, auth_state, store))]
pub async fn delete_attachment(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn GazetteStore>>,
) -> Response {
    match delete(&id, &headers, &auth_state.0, store.0.as_ref()).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete(
    raw_id: &str,
    headers: &HeaderMap,
    auth_state: &AuthState,
    store: &dyn GazetteStore,
) -> Result<DeleteAttachmentResponse, ApiError> {
    let environment = auth_state.config().environment();
    let auth = authenticate(headers, auth_state, store)
        .await
        .map_err(|err| ApiError::from_auth(err, environment))?;
    let id = parse_attachment_id(raw_id)?;

    let record = store
        .find_attachment(id)
        .await
        .map_err(|err| ApiError::unexpected(err, environment))?
        .ok_or(ApiError::NotFound)?;

    // Tenant first: a foreign matter is a 403 whatever its status.
    auth.authorize(record.tenant_id(), Action::Delete)
        .into_result()?;
    removable(&record.matter.status)?;

    if auth.is_bypassed() {
        warn!(
            attachment_id = id,
            matter_id = record.matter.id,
            "AUTH BYPASS: deleting attachment without a verified principal"
        );
    }

    let outcome = store
        .delete_attachment(id, removable)
        .await
        .map_err(|err| ApiError::unexpected(err, environment))?;

    match outcome {
        DeleteOutcome::Deleted {
            matter_id,
            remaining,
            has_attachments,
        } => {
            info!(
                attachment_id = id,
                matter_id,
                remaining,
                has_attachments,
                user_id = auth.principal().id,
                "attachment deleted"
            );
            Ok(DeleteAttachmentResponse {
                message: DELETED_MESSAGE.to_string(),
                id,
                matter_id,
                has_attachments,
            })
        }
        DeleteOutcome::NotFound => Err(ApiError::NotFound),
        DeleteOutcome::Rejected(reason) => Err(reason.into()),
    }
}
