//! Key request infrastructure

mod postgres;
mod repository;

pub use postgres::PostgresKeyRequestRepository;
pub use repository::InMemoryKeyRequestRepository;
