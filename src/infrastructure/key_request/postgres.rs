//! PostgreSQL key request repository implementation

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::api_key::ApiKeyId;
use crate::domain::key_request::{
    KeyRequest, KeyRequestId, KeyRequestRepository, KeyRequestStatus,
};
use crate::domain::DomainError;

/// PostgreSQL implementation of `KeyRequestRepository`
///
/// The decision transitions are conditional updates on `status = 'pending'`,
/// so the database decides the single winner under concurrent approvals.
#[derive(Debug)]
pub struct PostgresKeyRequestRepository {
    pool: PgPool,
}

impl PostgresKeyRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the backing table exists
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS key_requests (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                usage_text TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                api_key_id TEXT,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::storage(format!("Failed to create key_requests table: {}", e))
        })?;

        Ok(())
    }

    fn row_to_request(row: &PgRow) -> Result<KeyRequest, DomainError> {
        let id = KeyRequestId::new(row.get::<String, _>("id"))?;
        let status: KeyRequestStatus = row.get::<String, _>("status").parse()?;
        let api_key_id = row
            .get::<Option<String>, _>("api_key_id")
            .map(ApiKeyId::new)
            .transpose()?;

        Ok(KeyRequest::from_storage(
            id,
            row.get("name"),
            row.get("email"),
            row.get("usage_text"),
            status,
            api_key_id,
            row.get("created_at"),
        ))
    }

    async fn fetch(&self, id: &KeyRequestId) -> Result<Option<KeyRequest>, DomainError> {
        let row = sqlx::query("SELECT * FROM key_requests WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get key request: {}", e)))?;

        row.as_ref().map(Self::row_to_request).transpose()
    }
}

#[async_trait]
impl KeyRequestRepository for PostgresKeyRequestRepository {
    async fn create(&self, request: KeyRequest) -> Result<KeyRequest, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO key_requests (id, name, email, usage_text, status, api_key_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.id().as_str())
        .bind(request.name())
        .bind(request.email())
        .bind(request.usage())
        .bind(request.status().as_str())
        .bind(request.api_key_id().map(|id| id.as_str()))
        .bind(request.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create key request: {}", e)))?;

        Ok(request)
    }

    async fn get(&self, id: &KeyRequestId) -> Result<Option<KeyRequest>, DomainError> {
        self.fetch(id).await
    }

    async fn list(&self) -> Result<Vec<KeyRequest>, DomainError> {
        let rows = sqlx::query("SELECT * FROM key_requests ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list key requests: {}", e)))?;

        rows.iter().map(Self::row_to_request).collect()
    }

    async fn mark_approved(
        &self,
        id: &KeyRequestId,
        api_key_id: &ApiKeyId,
    ) -> Result<KeyRequest, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE key_requests
            SET status = 'approved', api_key_id = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(api_key_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to approve key request: {}", e)))?;

        if let Some(ref row) = row {
            return Self::row_to_request(row);
        }

        // Nothing matched; look at what is actually there to say why.
        match self.fetch(id).await? {
            None => Err(DomainError::not_found(format!(
                "Key request '{}' not found",
                id
            ))),
            Some(request) => match request.status() {
                KeyRequestStatus::Approved => Err(DomainError::already_approved(id.as_str())),
                KeyRequestStatus::Rejected => Err(DomainError::conflict(format!(
                    "Key request '{}' was rejected and cannot be approved",
                    id
                ))),
                KeyRequestStatus::Pending => Err(DomainError::storage(
                    "Key request changed concurrently during approval",
                )),
            },
        }
    }

    async fn mark_rejected(
        &self,
        id: &KeyRequestId,
    ) -> Result<(KeyRequest, bool), DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE key_requests
            SET status = 'rejected'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to reject key request: {}", e)))?;

        if let Some(ref row) = row {
            return Ok((Self::row_to_request(row)?, true));
        }

        match self.fetch(id).await? {
            None => Err(DomainError::not_found(format!(
                "Key request '{}' not found",
                id
            ))),
            Some(request) => match request.status() {
                KeyRequestStatus::Rejected => Ok((request, false)),
                _ => Err(DomainError::conflict(format!(
                    "Key request '{}' is approved and cannot be rejected",
                    id
                ))),
            },
        }
    }
}
