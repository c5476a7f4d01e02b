//! In-memory quote repository implementation

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use crate::domain::quote::{Quote, QuoteFilter, QuoteId, QuotePage, QuoteRepository};
use crate::domain::DomainError;

/// In-memory implementation of `QuoteRepository`
#[derive(Debug, Default)]
pub struct InMemoryQuoteRepository {
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
}

impl InMemoryQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with quotes
    pub async fn with_quotes(quotes: Vec<Quote>) -> Self {
        let repo = Self::new();
        {
            let mut stored = repo.quotes.write().await;
            for quote in quotes {
                stored.insert(quote.id().as_str().to_string(), quote);
            }
        }
        repo
    }

    fn text_key(text: &str) -> String {
        text.trim().to_lowercase()
    }
}

#[async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn create(&self, quote: Quote) -> Result<Quote, DomainError> {
        let mut quotes = self.quotes.write().await;
        let text_key = Self::text_key(quote.text());

        if quotes.values().any(|q| Self::text_key(q.text()) == text_key) {
            return Err(DomainError::conflict(
                "A quote with this text already exists",
            ));
        }

        quotes.insert(quote.id().as_str().to_string(), quote.clone());
        Ok(quote)
    }

    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.get(id.as_str()).cloned())
    }

    async fn list(
        &self,
        filter: &QuoteFilter,
        offset: usize,
        limit: usize,
    ) -> Result<QuotePage, DomainError> {
        let quotes = self.quotes.read().await;

        let mut matching: Vec<Quote> = quotes
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let total = matching.len();
        let page = matching.into_iter().skip(offset).take(limit).collect();

        Ok(QuotePage {
            quotes: page,
            total,
        })
    }

    async fn random_published(&self) -> Result<Option<Quote>, DomainError> {
        let quotes = self.quotes.read().await;

        let published: Vec<&Quote> = quotes.values().filter(|q| q.is_published()).collect();
        if published.is_empty() {
            return Ok(None);
        }

        let index = rand::thread_rng().gen_range(0..published.len());
        Ok(Some(published[index].clone()))
    }

    async fn update(&self, quote: &Quote) -> Result<Quote, DomainError> {
        let mut quotes = self.quotes.write().await;
        let id = quote.id().as_str();
        let text_key = Self::text_key(quote.text());

        if !quotes.contains_key(id) {
            return Err(DomainError::not_found(format!("Quote '{}' not found", id)));
        }

        if quotes
            .values()
            .any(|q| q.id().as_str() != id && Self::text_key(q.text()) == text_key)
        {
            return Err(DomainError::conflict(
                "A quote with this text already exists",
            ));
        }

        quotes.insert(id.to_string(), quote.clone());
        Ok(quote.clone())
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, DomainError> {
        let mut quotes = self.quotes.write().await;
        Ok(quotes.remove(id.as_str()).is_some())
    }

    async fn distinct_tags(&self) -> Result<Vec<String>, DomainError> {
        let quotes = self.quotes.read().await;

        let tags: BTreeSet<String> = quotes
            .values()
            .flat_map(|q| q.tags().iter().cloned())
            .collect();

        Ok(tags.into_iter().collect())
    }

    async fn count(&self, filter: &QuoteFilter) -> Result<usize, DomainError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.values().filter(|q| filter.matches(q)).count())
    }
}
