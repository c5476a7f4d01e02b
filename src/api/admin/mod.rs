//! Admin API endpoints

pub mod quotes;

pub use quotes::create_admin_quotes_router;
