//! PostgreSQL quote repository implementation

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::quote::{Quote, QuoteFilter, QuoteId, QuotePage, QuoteRepository};
use crate::domain::DomainError;
use crate::infrastructure::postgres::is_unique_violation;

/// PostgreSQL implementation of `QuoteRepository`
///
/// Text uniqueness is a unique index over the lowercased text.
#[derive(Debug)]
pub struct PostgresQuoteRepository {
    pool: PgPool,
}

impl PostgresQuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the backing table and indexes exist
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quotes (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                author TEXT NOT NULL,
                source TEXT,
                tags JSONB NOT NULL DEFAULT '[]',
                is_published BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create quotes table: {}", e)))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS quotes_text_idx ON quotes (LOWER(text))",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create text index: {}", e)))?;

        Ok(())
    }

    fn row_to_quote(row: &PgRow) -> Result<Quote, DomainError> {
        let id = QuoteId::new(row.get::<String, _>("id"))?;
        let tags = serde_json::from_value(row.get("tags"))
            .map_err(|e| DomainError::storage(format!("Invalid tags column: {}", e)))?;

        Ok(Quote::from_storage(
            id,
            row.get("text"),
            row.get("author"),
            row.get("source"),
            tags,
            row.get("is_published"),
            row.get("created_at"),
            row.get("updated_at"),
        ))
    }

    fn map_create_err(e: sqlx::Error) -> DomainError {
        if is_unique_violation(&e) {
            DomainError::conflict("A quote with this text already exists")
        } else {
            DomainError::storage(format!("Failed to write quote: {}", e))
        }
    }
}

#[async_trait]
impl QuoteRepository for PostgresQuoteRepository {
    async fn create(&self, quote: Quote) -> Result<Quote, DomainError> {
        let tags = serde_json::to_value(quote.tags())
            .map_err(|e| DomainError::storage(format!("Failed to encode tags: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO quotes (id, text, author, source, tags, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(quote.id().as_str())
        .bind(quote.text())
        .bind(quote.author())
        .bind(quote.source())
        .bind(&tags)
        .bind(quote.is_published())
        .bind(quote.created_at())
        .bind(quote.updated_at())
        .execute(&self.pool)
        .await
        .map_err(Self::map_create_err)?;

        Ok(quote)
    }

    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError> {
        let row = sqlx::query("SELECT * FROM quotes WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get quote: {}", e)))?;

        row.as_ref().map(Self::row_to_quote).transpose()
    }

    async fn list(
        &self,
        filter: &QuoteFilter,
        offset: usize,
        limit: usize,
    ) -> Result<QuotePage, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM quotes
            WHERE ($1::boolean IS NULL OR is_published = $1)
              AND ($2::text IS NULL OR tags ? $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.is_published)
        .bind(filter.tag.as_deref())
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list quotes: {}", e)))?;

        let quotes = rows
            .iter()
            .map(Self::row_to_quote)
            .collect::<Result<Vec<_>, _>>()?;
        let total = self.count(filter).await?;

        Ok(QuotePage { quotes, total })
    }

    async fn random_published(&self) -> Result<Option<Quote>, DomainError> {
        let row = sqlx::query("SELECT * FROM quotes WHERE is_published ORDER BY random() LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to pick random quote: {}", e)))?;

        row.as_ref().map(Self::row_to_quote).transpose()
    }

    async fn update(&self, quote: &Quote) -> Result<Quote, DomainError> {
        let tags = serde_json::to_value(quote.tags())
            .map_err(|e| DomainError::storage(format!("Failed to encode tags: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE quotes
            SET text = $2, author = $3, source = $4, tags = $5, is_published = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(quote.id().as_str())
        .bind(quote.text())
        .bind(quote.author())
        .bind(quote.source())
        .bind(&tags)
        .bind(quote.is_published())
        .bind(quote.updated_at())
        .execute(&self.pool)
        .await
        .map_err(Self::map_create_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Quote '{}' not found",
                quote.id()
            )));
        }

        Ok(quote.clone())
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete quote: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn distinct_tags(&self) -> Result<Vec<String>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT t.tag
            FROM quotes CROSS JOIN LATERAL jsonb_array_elements_text(tags) AS t(tag)
            ORDER BY t.tag
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list tags: {}", e)))?;

        Ok(rows.iter().map(|row| row.get("tag")).collect())
    }

    async fn count(&self, filter: &QuoteFilter) -> Result<usize, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM quotes
            WHERE ($1::boolean IS NULL OR is_published = $1)
              AND ($2::text IS NULL OR tags ? $2)
            "#,
        )
        .bind(filter.is_published)
        .bind(filter.tag.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count quotes: {}", e)))?;

        Ok(row.get::<i64, _>("count") as usize)
    }
}
