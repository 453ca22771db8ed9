//! End-to-end tests for the attachment routes.
//!
//! The full router (layers included) is driven with `tower::ServiceExt::oneshot`
//! against the in-memory store, so every case runs the same pipeline as
//! production: token, principal, tenant, lifecycle, then the store.

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use diario::{
    api::{self, AuthConfig, AuthState, Environment},
    session_token::{SessionClaims, sign_hs256},
    store::{
        GazetteStore, MemoryStore,
        models::{Attachment, Matter, MatterStatus, Principal, Role},
    },
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

const SECRET: &str = "diario-integration-secret";

const SEFAZ: i64 = 1;
const SEMED: i64 = 2;

const ADMIN: i64 = 1;
const SEFAZ_USER: i64 = 2;
const SEMED_USER: i64 = 3;
const INACTIVE_USER: i64 = 4;
const ORPHAN_AUTHOR: i64 = 5;

const DRAFT_MATTER: i64 = 10;
const PUBLISHED_MATTER: i64 = 11;
const SEMED_MATTER: i64 = 12;

const DRAFT_PDF: i64 = 100;
const DRAFT_PNG: i64 = 101;
const PUBLISHED_PDF: i64 = 102;
const SEMED_CSV: i64 = 103;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn principal(id: i64, role: Role, tenant_id: Option<i64>) -> Principal {
    Principal {
        id,
        name: format!("Usuário {id}"),
        email: format!("usuario{id}@diario.local"),
        role,
        tenant_id,
    }
}

fn matter(id: i64, status: MatterStatus, tenant_id: i64) -> Matter {
    Matter {
        id,
        title: format!("Portaria {id}"),
        status,
        tenant_id,
    }
}

fn attachment(id: i64, matter_id: i64, name: &str, mime_type: &str, size: i64) -> Attachment {
    Attachment {
        id,
        matter_id,
        original_name: name.to_string(),
        mime_type: mime_type.to_string(),
        file_size: size,
        uploaded_at: "2024-05-02T10:30:00Z".to_string(),
    }
}

async fn seeded_store() -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());

    store
        .insert_user(principal(ADMIN, Role::Admin, None), true)
        .await;
    store
        .insert_user(principal(SEFAZ_USER, Role::Secretaria, Some(SEFAZ)), true)
        .await;
    store
        .insert_user(principal(SEMED_USER, Role::Secretaria, Some(SEMED)), true)
        .await;
    store
        .insert_user(principal(INACTIVE_USER, Role::Admin, None), false)
        .await;
    store
        .insert_user(principal(ORPHAN_AUTHOR, Role::Autor, None), true)
        .await;

    store
        .insert_matter(matter(DRAFT_MATTER, MatterStatus::Draft, SEFAZ))
        .await;
    store
        .insert_matter(matter(PUBLISHED_MATTER, MatterStatus::Published, SEFAZ))
        .await;
    store
        .insert_matter(matter(SEMED_MATTER, MatterStatus::Submitted, SEMED))
        .await;

    store
        .insert_attachment(attachment(
            DRAFT_PDF,
            DRAFT_MATTER,
            "edital nº 1.pdf",
            "application/pdf",
            52_000,
        ))
        .await?;
    store
        .insert_attachment(attachment(
            DRAFT_PNG,
            DRAFT_MATTER,
            "assinatura.png",
            "image/png",
            2048,
        ))
        .await?;
    store
        .insert_attachment(attachment(
            PUBLISHED_PDF,
            PUBLISHED_MATTER,
            "decreto.pdf",
            "application/pdf",
            10_240,
        ))
        .await?;
    store
        .insert_attachment(attachment(
            SEMED_CSV,
            SEMED_MATTER,
            "matriculas.csv",
            "text/csv",
            300,
        ))
        .await?;

    Ok(store)
}

fn config() -> AuthConfig {
    AuthConfig::new()
        .with_jwt_secret(SecretString::from(SECRET.to_string()))
        .with_environment(Environment::Test)
}

fn app(store: &Arc<MemoryStore>, config: AuthConfig) -> Router {
    let store: Arc<dyn GazetteStore> = store.clone();
    api::app(Arc::new(AuthState::new(config)), store, None)
}

fn token(user_id: i64) -> Result<String> {
    Ok(sign_hs256(
        SECRET.as_bytes(),
        &SessionClaims::new(user_id, now(), 300),
    )?)
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    bearer: Option<String>,
) -> Result<(StatusCode, axum::http::HeaderMap, Vec<u8>)> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
    }
    let response = app.oneshot(request.body(Body::empty())?).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, headers, body.to_vec()))
}

fn json_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).context("response body is not JSON")
}

fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let store = seeded_store().await?;
    let (status, _, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/100/download",
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(&body)?,
        json!({"error": "Token de acesso não fornecido"})
    );
    Ok(())
}

#[tokio::test]
async fn short_token_is_malformed() -> Result<()> {
    let store = seeded_store().await?;
    let (status, _, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/100/download",
        Some("abc".to_string()),
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)?["error"], "Token de acesso malformado");
    Ok(())
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_rejected() -> Result<()> {
    let store = seeded_store().await?;
    let expired = sign_hs256(
        SECRET.as_bytes(),
        &SessionClaims::new(ADMIN, now() - 3600, 60),
    )?;
    let foreign = sign_hs256(b"some-other-secret", &SessionClaims::new(ADMIN, now(), 300))?;

    for bearer in [expired, foreign] {
        let (status, _, body) = send(
            app(&store, config()),
            Method::GET,
            "/attachments/100/download",
            Some(bearer),
        )
        .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body)?["error"], "Token inválido ou expirado");
    }
    Ok(())
}

#[tokio::test]
async fn missing_secret_is_a_server_error() -> Result<()> {
    let store = seeded_store().await?;
    let config = AuthConfig::new().with_environment(Environment::Test);
    let (status, _, body) = send(
        app(&store, config),
        Method::GET,
        "/attachments/100/download",
        Some(token(ADMIN)?),
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)?["error"], "Erro de configuração do servidor");
    Ok(())
}

#[tokio::test]
async fn inactive_and_unknown_users_are_unauthorized() -> Result<()> {
    let store = seeded_store().await?;
    for user_id in [INACTIVE_USER, 999] {
        let (status, _, body) = send(
            app(&store, config()),
            Method::GET,
            "/attachments/100/download",
            Some(token(user_id)?),
        )
        .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(&body)?["error"],
            "Usuário não encontrado ou inativo"
        );
    }
    Ok(())
}

#[tokio::test]
async fn unknown_attachment_is_not_found() -> Result<()> {
    let store = seeded_store().await?;
    for method in [Method::GET, Method::DELETE] {
        let uri = if method == Method::GET {
            "/attachments/4040/download"
        } else {
            "/attachments/4040"
        };
        let (status, _, body) =
            send(app(&store, config()), method, uri, Some(token(ADMIN)?)).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)?, json!({"error": "Anexo não encontrado"}));
    }
    Ok(())
}

#[tokio::test]
async fn tenant_user_downloads_own_pdf() -> Result<()> {
    let store = seeded_store().await?;
    let (status, headers, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/100/download",
        Some(token(SEFAZ_USER)?),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_str(&headers, "content-type"), Some("application/pdf"));
    assert_eq!(
        header_str(&headers, "content-disposition"),
        Some("attachment; filename=\"edital%20n%C2%BA%201.pdf\"")
    );
    assert_eq!(
        header_str(&headers, "x-file-name"),
        Some("edital%20n%C2%BA%201.pdf")
    );
    assert_eq!(header_str(&headers, "x-file-size"), Some("52000"));
    assert_eq!(header_str(&headers, "x-file-type"), Some("application/pdf"));
    assert!(body.starts_with(b"%PDF-1.4"));
    Ok(())
}

#[tokio::test]
async fn image_downloads_as_svg_placeholder() -> Result<()> {
    let store = seeded_store().await?;
    let (status, headers, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/101/download",
        Some(token(SEFAZ_USER)?),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_str(&headers, "content-type"), Some("image/svg+xml"));
    assert_eq!(
        header_str(&headers, "content-disposition"),
        Some("attachment; filename=\"assinatura.svg\"")
    );
    assert_eq!(header_str(&headers, "x-file-type"), Some("image/png"));

    let svg = String::from_utf8(body)?;
    assert!(svg.contains("assinatura.png"));
    assert!(svg.contains("2 KB"));
    Ok(())
}

#[tokio::test]
async fn other_types_download_as_text_descriptor() -> Result<()> {
    let store = seeded_store().await?;
    let (status, headers, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/103/download",
        Some(token(SEMED_USER)?),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        header_str(&headers, "content-type"),
        Some("text/plain; charset=utf-8")
    );
    assert!(String::from_utf8(body)?.starts_with("Anexo: matriculas.csv\n"));
    Ok(())
}

#[tokio::test]
async fn foreign_tenant_is_forbidden() -> Result<()> {
    let store = seeded_store().await?;
    let (status, _, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/103/download",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json_body(&body)?, json!({"error": "Acesso negado"}));

    let (status, _, _) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/103",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(store.attachment(SEMED_CSV).await.is_some());
    Ok(())
}

#[tokio::test]
async fn tenant_scoped_role_without_tenant_is_forbidden() -> Result<()> {
    let store = seeded_store().await?;
    let (status, _, _) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/100/download",
        Some(token(ORPHAN_AUTHOR)?),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn cross_tenant_role_reads_any_secretaria() -> Result<()> {
    let store = seeded_store().await?;
    for id in [DRAFT_PDF, SEMED_CSV, PUBLISHED_PDF] {
        let (status, _, _) = send(
            app(&store, config()),
            Method::GET,
            &format!("/attachments/{id}/download"),
            Some(token(ADMIN)?),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn published_matter_rejects_delete() -> Result<()> {
    let store = seeded_store().await?;
    let (status, _, body) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/102",
        Some(token(SEFAZ_USER)?),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body)?["error"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_default();
    assert!(error.contains("publicado"));
    assert!(store.attachment(PUBLISHED_PDF).await.is_some());
    assert_eq!(store.has_attachments(PUBLISHED_MATTER).await, Some(true));
    Ok(())
}

#[tokio::test]
async fn deleting_attachments_recomputes_the_matter_flag() -> Result<()> {
    let store = seeded_store().await?;

    let (status, _, body) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/100",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body)?,
        json!({
            "message": "Anexo excluído com sucesso",
            "id": DRAFT_PDF,
            "matter_id": DRAFT_MATTER,
            "has_attachments": true
        })
    );
    assert_eq!(store.has_attachments(DRAFT_MATTER).await, Some(true));

    let (status, _, body) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/101",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)?["has_attachments"], false);
    assert_eq!(store.has_attachments(DRAFT_MATTER).await, Some(false));
    assert_eq!(store.attachment_count(DRAFT_MATTER).await, 0);

    let (status, _, _) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/101",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn submitted_matter_accepts_delete() -> Result<()> {
    let store = seeded_store().await?;
    let (status, _, body) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/103",
        Some(token(SEMED_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)?["has_attachments"], false);
    Ok(())
}

#[tokio::test]
async fn failed_flag_update_rolls_back() -> Result<()> {
    let store = seeded_store().await?;
    store.fail_flag_update(true);

    let (status, _, body) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/100",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&body)?;
    assert_eq!(body["error"], "Erro interno do servidor");
    assert!(body["details"].is_string());

    assert!(store.attachment(DRAFT_PDF).await.is_some());
    assert_eq!(store.attachment_count(DRAFT_MATTER).await, 2);
    assert_eq!(store.has_attachments(DRAFT_MATTER).await, Some(true));
    Ok(())
}

#[tokio::test]
async fn production_hides_error_details() -> Result<()> {
    let store = seeded_store().await?;
    store.fail_flag_update(true);
    let config = config().with_environment(Environment::Production);

    let (status, _, body) = send(
        app(&store, config),
        Method::DELETE,
        "/attachments/100",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)?, json!({"error": "Erro interno do servidor"}));
    Ok(())
}

#[tokio::test]
async fn store_outage_during_auth_is_a_server_error() -> Result<()> {
    let store = seeded_store().await?;
    store.set_offline(true);

    let (status, _, body) = send(
        app(&store, config()),
        Method::GET,
        "/attachments/100/download",
        Some(token(SEFAZ_USER)?),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)?["error"], "Erro interno do servidor");
    Ok(())
}

#[tokio::test]
async fn bypass_serves_without_token_but_keeps_lifecycle() -> Result<()> {
    let store = seeded_store().await?;
    let bypass = || AuthConfig::new().with_bypass(true);

    let (status, _, _) = send(
        app(&store, bypass()),
        Method::GET,
        "/attachments/103/download",
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        app(&store, bypass()),
        Method::DELETE,
        "/attachments/102",
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.attachment(PUBLISHED_PDF).await.is_some());

    let (status, _, body) = send(
        app(&store, bypass()),
        Method::DELETE,
        "/attachments/103",
        Some("garbage".to_string()),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)?["matter_id"], SEMED_MATTER);

    let (status, _, body) = send(app(&store, bypass()), Method::DELETE, "/attachments/99", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)?, json!({"error": "Anexo não encontrado"}));
    Ok(())
}

#[tokio::test]
async fn non_numeric_ids_authenticate_before_lookup() -> Result<()> {
    let store = seeded_store().await?;

    for (method, uri) in [
        (Method::GET, "/attachments/abc/download"),
        (Method::DELETE, "/attachments/abc"),
    ] {
        let (status, headers, body) =
            send(app(&store, config()), method.clone(), uri, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(
            header_str(&headers, "content-type"),
            Some("application/json")
        );
        assert_eq!(
            json_body(&body)?,
            json!({"error": "Token de acesso não fornecido"})
        );

        let (status, _, body) = send(
            app(&store, AuthConfig::new().with_bypass(true)),
            method.clone(),
            uri,
            None,
        )
        .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(json_body(&body)?, json!({"error": "Anexo não encontrado"}));

        let (status, _, body) = send(app(&store, config()), method, uri, Some(token(ADMIN)?)).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)?, json!({"error": "Anexo não encontrado"}));
    }
    Ok(())
}

#[tokio::test]
async fn status_change_after_lookup_is_rechecked() -> Result<()> {
    let store = seeded_store().await?;
    store
        .set_matter_status(DRAFT_MATTER, MatterStatus::Approved)
        .await;

    let (status, _, _) = send(
        app(&store, config()),
        Method::DELETE,
        "/attachments/100",
        Some(token(ADMIN)?),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.attachment(DRAFT_PDF).await.is_some());
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_and_propagated() -> Result<()> {
    let store = seeded_store().await?;

    let (_, headers, _) = send(app(&store, config()), Method::GET, "/health", None).await?;
    let generated = header_str(&headers, "x-request-id").unwrap_or_default();
    assert_eq!(generated.len(), 26);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())?;
    let response = app(&store, config()).oneshot(request).await?;
    assert_eq!(header_str(response.headers(), "x-request-id"), Some("req-123"));
    Ok(())
}

#[tokio::test]
async fn health_answers_get_and_options() -> Result<()> {
    let store = seeded_store().await?;

    let (status, headers, body) =
        send(app(&store, config()), Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-app"));
    assert_eq!(json_body(&body)?["database"], "ok");

    let (status, _, body) = send(app(&store, config()), Method::OPTIONS, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    Ok(())
}
