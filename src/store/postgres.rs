//! `sqlx` Postgres backend.

use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use tracing::{Instrument, debug, info_span, warn};

use super::{
    DeleteOutcome, GazetteStore, LifecycleGate, StoreError,
    models::{Attachment, AttachmentRecord, Matter, MatterStatus, Principal, Role},
};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn principal_from_row(row: &PgRow) -> Result<Option<Principal>, StoreError> {
    let id: i64 = row.try_get("id")?;
    let perfil: String = row.try_get("perfil")?;
    let Ok(role) = perfil.parse::<Role>() else {
        // Unknown roles resolve like a missing account.
        warn!(user_id = id, perfil = %perfil, "user has an unknown role");
        return Ok(None);
    };

    Ok(Some(Principal {
        id,
        name: row.try_get("nome")?,
        email: row.try_get("email")?,
        role,
        tenant_id: row.try_get("secretaria_id")?,
    }))
}

fn record_from_row(row: &PgRow) -> Result<AttachmentRecord, StoreError> {
    let file_size: i64 = row.try_get("tamanho")?;
    if file_size < 0 {
        return Err(StoreError::CorruptRow(format!(
            "negative size for attachment {}",
            row.try_get::<i64, _>("id")?
        )));
    }

    let status: String = row.try_get("status")?;
    Ok(AttachmentRecord {
        attachment: Attachment {
            id: row.try_get("id")?,
            matter_id: row.try_get("materia_id")?,
            original_name: row.try_get("nome_original")?,
            mime_type: row.try_get("mime_type")?,
            file_size,
            uploaded_at: row.try_get("created_at")?,
        },
        matter: Matter {
            id: row.try_get("materia_id")?,
            title: row.try_get("titulo")?,
            status: MatterStatus::parse(&status),
            tenant_id: row.try_get("secretaria_id")?,
        },
    })
}

#[async_trait]
impl GazetteStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn find_active_user(&self, user_id: i64) -> Result<Option<Principal>, StoreError> {
        let query = r"
            SELECT id, nome, email, perfil, secretaria_id
            FROM usuarios
            WHERE id = $1 AND ativo = TRUE
        ";
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.table = "usuarios"
            ))
            .await?;

        match row {
            Some(row) => principal_from_row(&row),
            None => Ok(None),
        }
    }

    async fn find_attachment(
        &self,
        attachment_id: i64,
    ) -> Result<Option<AttachmentRecord>, StoreError> {
        let query = r#"
            SELECT a.id, a.materia_id, a.nome_original, a.mime_type, a.tamanho,
                to_char(a.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
                m.titulo, m.status, m.secretaria_id
            FROM anexos a
            JOIN materias m ON m.id = a.materia_id
            WHERE a.id = $1
        "#;
        let row = sqlx::query(query)
            .bind(attachment_id)
            .fetch_optional(&self.pool)
            .instrument(info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.table = "anexos"
            ))
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn delete_attachment(
        &self,
        attachment_id: i64,
        allowed: LifecycleGate,
    ) -> Result<DeleteOutcome, StoreError> {
        // Dropping `tx` without commit rolls everything back.
        let mut tx = self.pool.begin().await?;

        // Row lock on the parent matter serializes sibling deletions.
        let matter = sqlx::query(
            r"
            SELECT m.id, m.status
            FROM materias m
            JOIN anexos a ON a.materia_id = m.id
            WHERE a.id = $1
            FOR UPDATE OF m
            ",
        )
        .bind(attachment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(matter) = matter else {
            return Ok(DeleteOutcome::NotFound);
        };
        let matter_id: i64 = matter.try_get("id")?;
        let status: String = matter.try_get("status")?;

        if let Err(reason) = allowed(&MatterStatus::parse(&status)) {
            return Ok(DeleteOutcome::Rejected(reason));
        }

        let deleted = sqlx::query("DELETE FROM anexos WHERE id = $1 AND materia_id = $2")
            .bind(attachment_id)
            .bind(matter_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        let remaining: i64 = sqlx::query("SELECT COUNT(*) AS total FROM anexos WHERE materia_id = $1")
            .bind(matter_id)
            .fetch_one(&mut *tx)
            .await?
            .try_get("total")?;
        let has_attachments = remaining > 0;

        sqlx::query("UPDATE materias SET tem_anexos = $1, updated_at = NOW() WHERE id = $2")
            .bind(has_attachments)
            .bind(matter_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            attachment_id,
            matter_id, remaining, has_attachments, "attachment deleted"
        );

        Ok(DeleteOutcome::Deleted {
            matter_id,
            remaining,
            has_attachments,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await?;
        conn.ping()
            .instrument(info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await?;
        Ok(())
    }
}
