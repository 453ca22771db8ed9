use axum::{
    extract::{Extension, Path},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    HEADER_FILE_NAME, HEADER_FILE_SIZE, HEADER_FILE_TYPE,
    content::{MaterializedContent, materialize},
    parse_attachment_id,
};
use crate::access::Action;
use crate::api::handlers::{
    auth::{AuthState, authenticate},
    error::{ApiError, ErrorBody},
};
use crate::store::{GazetteStore, models::Attachment};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[utoipa::path(
    get,
    path = "/attachments/{id}/download",
    params(("id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment body with X-File-Name, X-File-Size and X-File-Type headers"),
        (status = 401, description = "Missing, malformed or invalid token, or inactive user", body = ErrorBody),
        (status = 403, description = "Attachment belongs to another secretaria", body = ErrorBody),
        (status = 404, description = "Attachment not found", body = ErrorBody),
        (status = 500, description = "Server misconfigured or unexpected failure", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "attachments"
)]
#[instrument(skip(headers, auth_state, store))]
pub async fn download_attachment(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn GazetteStore>>,
) -> Response {
    match download(&id, &headers, &auth_state.0, store.0.as_ref()).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn download(
    raw_id: &str,
    headers: &HeaderMap,
    auth_state: &AuthState,
    store: &dyn GazetteStore,
) -> Result<Response, ApiError> {
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

    auth.authorize(record.tenant_id(), Action::Read)
        .into_result()?;

    let content = materialize(&record.attachment);
    debug!(
        attachment_id = id,
        user_id = auth.principal().id,
        bypassed = auth.is_bypassed(),
        content_type = %content.content_type,
        "serving attachment"
    );

    Ok((
        StatusCode::OK,
        response_headers(&record.attachment, &content),
        content.bytes,
    )
        .into_response())
}

/// Transport headers for a download.
///
/// `Content-Type` and the disposition filename follow the materialized body,
/// while the `X-File-*` headers echo the record as it was uploaded.
pub(crate) fn response_headers(
    attachment: &Attachment,
    content: &MaterializedContent,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&content.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE)),
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        urlencoding::encode(&content.filename)
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }

    let metadata = [
        (
            HEADER_FILE_NAME,
            urlencoding::encode(&attachment.original_name).into_owned(),
        ),
        (HEADER_FILE_SIZE, attachment.file_size.to_string()),
        (HEADER_FILE_TYPE, attachment.mime_type.clone()),
    ];
    for (name, value) in metadata {
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(name), value);
            }
            Err(_) => debug!(header = name, "dropping header with non-visible characters"),
        }
    }

    headers
}
