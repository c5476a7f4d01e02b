//! Quote entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Quote identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuoteId(String);

impl QuoteId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("Quote id cannot be empty"));
        }
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QuoteId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuoteId> for String {
    fn from(id: QuoteId) -> Self {
        id.0
    }
}

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    id: QuoteId,
    /// Quote text; unique across the catalog, case-insensitively
    text: String,
    author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    /// Unpublished quotes are hidden from catalog consumers
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(id: QuoteId, text: impl Into<String>, author: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            text: text.into().trim().to_string(),
            author: author.into().trim().to_string(),
            source: None,
            tags: Vec::new(),
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_published(mut self, is_published: bool) -> Self {
        self.is_published = is_published;
        self
    }

    /// Rebuild a quote from its stored representation
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: QuoteId,
        text: String,
        author: String,
        source: Option<String>,
        tags: Vec<String>,
        is_published: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text,
            author,
            source,
            tags,
            is_published,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &QuoteId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into().trim().to_string();
        self.touch();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into().trim().to_string();
        self.touch();
    }

    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
        self.touch();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        self.touch();
    }

    pub fn set_published(&mut self, is_published: bool) {
        self.is_published = is_published;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_quote_defaults() {
        let quote = Quote::new(QuoteId::generate(), "  Know thyself.  ", "Socrates");

        assert_eq!(quote.text(), "Know thyself.");
        assert_eq!(quote.author(), "Socrates");
        assert!(quote.is_published());
        assert!(quote.tags().is_empty());
        assert!(quote.source().is_none());
    }

    #[test]
    fn test_builders() {
        let quote = Quote::new(QuoteId::generate(), "text", "author")
            .with_source("a book")
            .with_tags(vec!["wisdom".to_string()])
            .with_published(false);

        assert_eq!(quote.source(), Some("a book"));
        assert_eq!(quote.tags(), ["wisdom".to_string()]);
        assert!(!quote.is_published());
    }

    #[test]
    fn test_quote_id_rejects_empty() {
        assert!(QuoteId::new("").is_err());
    }
}
