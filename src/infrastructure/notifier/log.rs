//! Logging notifier for development setups without email credentials

use async_trait::async_trait;
use tracing::info;

use crate::domain::key_request::KeyRequest;
use crate::domain::notifier::Notifier;
use crate::domain::DomainError;

/// `Notifier` that only logs; used when no email provider is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn key_issued(&self, email: &str, _name: &str, _secret: &str) -> Result<(), DomainError> {
        info!(to = %email, "Would deliver API key (email not configured)");
        Ok(())
    }

    async fn request_rejected(&self, email: &str, _name: &str) -> Result<(), DomainError> {
        info!(to = %email, "Would deliver rejection notice (email not configured)");
        Ok(())
    }

    async fn request_received(&self, request: &KeyRequest) -> Result<(), DomainError> {
        info!(request_id = %request.id(), "Would alert operator (email not configured)");
        Ok(())
    }
}
