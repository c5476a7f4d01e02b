//! Quote repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{Quote, QuoteId};
use crate::domain::DomainError;

/// Filter for quote listings
#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    /// Restrict to a publication state; `None` means both
    pub is_published: Option<bool>,
    /// Restrict to quotes carrying this tag
    pub tag: Option<String>,
}

impl QuoteFilter {
    /// Only published quotes, no tag restriction
    pub fn published() -> Self {
        Self {
            is_published: Some(true),
            tag: None,
        }
    }

    pub fn matches(&self, quote: &Quote) -> bool {
        if let Some(published) = self.is_published {
            if quote.is_published() != published {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !quote.tags().iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}

/// One page of quotes plus the total match count
#[derive(Debug, Clone)]
pub struct QuotePage {
    pub quotes: Vec<Quote>,
    pub total: usize,
}

/// Repository trait for the quote catalog
///
/// Implementations enforce uniqueness of the quote text, compared
/// case-insensitively on the trimmed text.
#[async_trait]
pub trait QuoteRepository: Send + Sync + Debug {
    /// Create a quote; fails with `Conflict` on duplicate text
    async fn create(&self, quote: Quote) -> Result<Quote, DomainError>;

    /// Get a quote by ID regardless of publication state
    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError>;

    /// List quotes matching the filter, newest first, paginated
    async fn list(
        &self,
        filter: &QuoteFilter,
        offset: usize,
        limit: usize,
    ) -> Result<QuotePage, DomainError>;

    /// Pick a uniformly random published quote
    async fn random_published(&self) -> Result<Option<Quote>, DomainError>;

    /// Update a quote; duplicate text is a `Conflict`
    async fn update(&self, quote: &Quote) -> Result<Quote, DomainError>;

    /// Delete a quote; returns whether a record was removed
    async fn delete(&self, id: &QuoteId) -> Result<bool, DomainError>;

    /// All distinct tags across the catalog
    async fn distinct_tags(&self) -> Result<Vec<String>, DomainError>;

    /// Count quotes matching the filter
    async fn count(&self, filter: &QuoteFilter) -> Result<usize, DomainError>;
}
