//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod error;
pub mod key_request;
pub mod notifier;
pub mod quote;

pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, KeyUsage, Permission};
pub use error::DomainError;
pub use key_request::{KeyRequest, KeyRequestId, KeyRequestRepository, KeyRequestStatus};
pub use notifier::{NotificationOutcome, Notifier};
pub use quote::{Quote, QuoteFilter, QuoteId, QuotePage, QuoteRepository};
