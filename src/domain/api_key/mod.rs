//! API key domain
//!
//! Domain types and traits for API keys: the key entity, usage accounting,
//! and the repository contract.

mod entity;
mod repository;

pub use entity::{ApiKey, ApiKeyId, KeyUsage, Permission};
pub use repository::ApiKeyRepository;
