//! Infrastructure layer - storage backends, services, and outbound adapters

pub mod api_key;
pub mod approval;
pub mod key_request;
pub mod logging;
pub mod notifier;
pub mod postgres;
pub mod quote;
