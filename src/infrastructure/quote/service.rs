//! Quote catalog service

use std::sync::Arc;

use tracing::info;

use crate::domain::quote::{Quote, QuoteFilter, QuoteId, QuotePage, QuoteRepository};
use crate::domain::DomainError;

/// Payload for creating a quote
#[derive(Debug, Clone)]
pub struct CreateQuote {
    pub text: String,
    pub author: String,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub is_published: bool,
}

/// Administrative update to a quote
#[derive(Debug, Clone, Default)]
pub struct QuoteUpdate {
    pub text: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// Service for the quote catalog
#[derive(Debug)]
pub struct QuoteService<R>
where
    R: QuoteRepository,
{
    repository: Arc<R>,
}

impl<R: QuoteRepository> QuoteService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, payload: CreateQuote) -> Result<Quote, DomainError> {
        if payload.text.trim().is_empty() || payload.author.trim().is_empty() {
            return Err(DomainError::validation(
                "Text and author are required fields",
            ));
        }

        let mut quote = Quote::new(QuoteId::generate(), payload.text, payload.author)
            .with_tags(payload.tags)
            .with_published(payload.is_published);
        if let Some(source) = payload.source {
            quote = quote.with_source(source);
        }

        let created = self.repository.create(quote).await?;
        info!(quote_id = %created.id(), "Quote created");
        Ok(created)
    }

    /// Get a quote visible to catalog consumers
    pub async fn get_published(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError> {
        Ok(self
            .repository
            .get(id)
            .await?
            .filter(|quote| quote.is_published()))
    }

    /// Get a quote regardless of publication state
    pub async fn get(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn list(
        &self,
        filter: &QuoteFilter,
        offset: usize,
        limit: usize,
    ) -> Result<QuotePage, DomainError> {
        self.repository.list(filter, offset, limit).await
    }

    pub async fn random_published(&self) -> Result<Option<Quote>, DomainError> {
        self.repository.random_published().await
    }

    pub async fn update(&self, id: &QuoteId, update: QuoteUpdate) -> Result<Quote, DomainError> {
        let mut quote = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Quote '{}' not found", id)))?;

        if let Some(text) = update.text {
            if text.trim().is_empty() {
                return Err(DomainError::validation("Text cannot be empty"));
            }
            quote.set_text(text);
        }
        if let Some(author) = update.author {
            if author.trim().is_empty() {
                return Err(DomainError::validation("Author cannot be empty"));
            }
            quote.set_author(author);
        }
        if let Some(source) = update.source {
            quote.set_source(Some(source));
        }
        if let Some(tags) = update.tags {
            quote.set_tags(tags);
        }
        if let Some(is_published) = update.is_published {
            quote.set_published(is_published);
        }

        self.repository.update(&quote).await
    }

    pub async fn delete(&self, id: &QuoteId) -> Result<bool, DomainError> {
        self.repository.delete(id).await
    }

    pub async fn distinct_tags(&self) -> Result<Vec<String>, DomainError> {
        self.repository.distinct_tags().await
    }

    pub async fn count(&self, filter: &QuoteFilter) -> Result<usize, DomainError> {
        self.repository.count(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::quote::InMemoryQuoteRepository;

    fn create_service() -> QuoteService<InMemoryQuoteRepository> {
        QuoteService::new(Arc::new(InMemoryQuoteRepository::new()))
    }

    fn payload(text: &str) -> CreateQuote {
        CreateQuote {
            text: text.to_string(),
            author: "Author".to_string(),
            source: None,
            tags: Vec::new(),
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_create_validates_required_fields() {
        let service = create_service();

        let err = service.create(payload("  ")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        let err = service
            .create(CreateQuote {
                author: "".to_string(),
                ..payload("text")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unpublished_quote_hidden_from_consumers() {
        let service = create_service();
        let quote = service
            .create(CreateQuote {
                is_published: false,
                ..payload("draft")
            })
            .await
            .unwrap();

        assert!(service.get_published(quote.id()).await.unwrap().is_none());
        assert!(service.get(quote.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_applies_partial_changes() {
        let service = create_service();
        let quote = service.create(payload("original")).await.unwrap();

        let updated = service
            .update(
                quote.id(),
                QuoteUpdate {
                    is_published: Some(false),
                    tags: Some(vec!["wisdom".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.text(), "original");
        assert!(!updated.is_published());
        assert_eq!(updated.tags(), ["wisdom".to_string()]);
    }

    #[tokio::test]
    async fn test_update_missing_quote() {
        let service = create_service();

        let err = service
            .update(&QuoteId::generate(), QuoteUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
