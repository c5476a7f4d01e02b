//! API key infrastructure
//!
//! Token generation, the in-memory and PostgreSQL repositories, and the key
//! service.

mod generator;
mod postgres;
mod repository;
mod service;

pub use generator::{constant_time_compare, GeneratedKey, KeyGenerator};
pub use postgres::PostgresApiKeyRepository;
pub use repository::InMemoryApiKeyRepository;
pub use service::{ApiKeyService, IssuedKey, KeyUpdate};
