//! Quote catalog infrastructure

mod postgres;
mod repository;
mod service;

pub use postgres::PostgresQuoteRepository;
pub use repository::InMemoryQuoteRepository;
pub use service::{CreateQuote, QuoteService, QuoteUpdate};
