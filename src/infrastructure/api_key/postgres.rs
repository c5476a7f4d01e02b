//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, KeyUsage};
use crate::domain::DomainError;
use crate::infrastructure::postgres::is_unique_violation;

/// PostgreSQL implementation of `ApiKeyRepository`
///
/// Digest uniqueness is a unique index; the usage counter is bumped with a
/// single `UPDATE … SET usage_count = usage_count + 1`, so both invariants
/// are enforced by the database under concurrent requests.
#[derive(Debug)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the backing table and indexes exist
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                secret_hash TEXT NOT NULL,
                key_prefix TEXT NOT NULL,
                description TEXT,
                usage_count BIGINT NOT NULL DEFAULT 0,
                last_used_at TIMESTAMPTZ,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                permissions JSONB NOT NULL DEFAULT '["read"]',
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create api_keys table: {}", e)))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS api_keys_secret_hash_idx ON api_keys (secret_hash)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create digest index: {}", e)))?;

        Ok(())
    }

    fn row_to_key(row: &PgRow) -> Result<ApiKey, DomainError> {
        let id = ApiKeyId::new(row.get::<String, _>("id"))?;
        let permissions = serde_json::from_value(row.get("permissions"))
            .map_err(|e| DomainError::storage(format!("Invalid permissions column: {}", e)))?;
        let usage = KeyUsage {
            count: row.get::<i64, _>("usage_count") as u64,
            last_used: row.get("last_used_at"),
        };

        Ok(ApiKey::from_storage(
            id,
            row.get("name"),
            row.get("secret_hash"),
            row.get("key_prefix"),
            row.get("description"),
            usage,
            row.get("active"),
            permissions,
            row.get("created_at"),
            row.get("updated_at"),
        ))
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query("SELECT * FROM api_keys WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.as_ref().map(Self::row_to_key).transpose()
    }

    async fn find_active_by_hash(&self, secret_hash: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query("SELECT * FROM api_keys WHERE secret_hash = $1 AND active")
            .bind(secret_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up API key: {}", e)))?;

        row.as_ref().map(Self::row_to_key).transpose()
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let permissions = serde_json::to_value(api_key.permissions())
            .map_err(|e| DomainError::storage(format!("Failed to encode permissions: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO api_keys
                (id, name, secret_hash, key_prefix, description, usage_count,
                 last_used_at, active, permissions, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(api_key.id().as_str())
        .bind(api_key.name())
        .bind(api_key.secret_hash())
        .bind(api_key.key_prefix())
        .bind(api_key.description())
        .bind(api_key.usage().count as i64)
        .bind(api_key.usage().last_used)
        .bind(api_key.is_active())
        .bind(&permissions)
        .bind(api_key.created_at())
        .bind(api_key.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("API key with this secret already exists")
            } else {
                DomainError::storage(format!("Failed to create API key: {}", e))
            }
        })?;

        Ok(api_key)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        // Usage columns are owned by record_usage; leaving them out keeps
        // concurrent authentications from being overwritten here.
        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET name = $2, description = $3, active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(api_key.id().as_str())
        .bind(api_key.name())
        .bind(api_key.description())
        .bind(api_key.is_active())
        .bind(api_key.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update API key: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "API key '{}' not found",
                api_key.id()
            )));
        }

        Ok(api_key.clone())
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        let rows = sqlx::query("SELECT * FROM api_keys ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(Self::row_to_key).collect()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM api_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count API keys: {}", e)))?;

        Ok(row.get::<i64, _>("count") as usize)
    }

    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE api_keys SET usage_count = usage_count + 1, last_used_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record key usage: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "API key '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
