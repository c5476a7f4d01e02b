//! Email delivery through an email-provider HTTP API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::key_request::KeyRequest;
use crate::domain::notifier::Notifier;
use crate::domain::DomainError;

/// Configuration for the outbound email provider
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Provider send endpoint
    pub endpoint: String,
    /// Provider API key
    pub api_key: String,
    /// From address for all mail
    pub from: String,
    /// Operator address for new-request alerts; alerts are skipped when unset
    pub admin_email: Option<String>,
    /// Public base URL of this deployment, used in email bodies
    pub base_url: String,
}

/// `Notifier` backed by an email-provider HTTP endpoint
#[derive(Debug)]
pub struct EmailNotifier {
    config: EmailConfig,
    http_client: Client,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<(), DomainError> {
        let payload = json!({
            "api_key": self.config.api_key,
            "to": [to],
            "sender": self.config.from,
            "subject": subject,
            "html_body": html_body,
        });

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::notification(format!("Email request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(500)
                .collect();
            warn!(status = %status, body = %body, "Email provider returned an error");
            return Err(DomainError::notification(format!(
                "Email provider returned status {}",
                status
            )));
        }

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn key_issued(&self, email: &str, name: &str, secret: &str) -> Result<(), DomainError> {
        let body = format!(
            r#"<h1>Your API Key is Ready</h1>
<p>Hello {name},</p>
<p>Thanks for your interest in the Quotevault API. Your API key has been generated:</p>
<p style="background-color: #f0f0f0; padding: 15px; font-family: monospace; word-break: break-all;">{secret}</p>
<h2>Quick Start</h2>
<p>Send the key in the <code>X-API-Key</code> request header:</p>
<pre style="background-color: #f0f0f0; padding: 10px;">curl -H "X-API-Key: {secret}" {base_url}/api/quotes/random</pre>
<p>Best regards,<br>The Quotevault Team</p>"#,
            name = name,
            secret = secret,
            base_url = self.config.base_url,
        );

        self.send(email, "Your Quotevault API Key", body).await
    }

    async fn request_rejected(&self, email: &str, name: &str) -> Result<(), DomainError> {
        let body = format!(
            r#"<h1>API Key Request Update</h1>
<p>Hello {name},</p>
<p>Thank you for your interest in the Quotevault API.</p>
<p>After reviewing your request, we are unable to provide an API key at this time.</p>
<p>If you have any questions or would like to provide additional information about your use case, please reply to this email.</p>
<p>Best regards,<br>The Quotevault Team</p>"#,
            name = name,
        );

        self.send(email, "Update on Your Quotevault API Key Request", body)
            .await
    }

    async fn request_received(&self, request: &KeyRequest) -> Result<(), DomainError> {
        let Some(ref admin_email) = self.config.admin_email else {
            info!("Admin email not set, skipping new-request alert");
            return Ok(());
        };

        let body = format!(
            r#"<h1>New API Key Request</h1>
<p><strong>Name:</strong> {name}</p>
<p><strong>Email:</strong> {email}</p>
<p><strong>Usage Description:</strong> {usage}</p>
<p><strong>Request ID:</strong> {id}</p>"#,
            name = request.name(),
            email = request.email(),
            usage = request.usage(),
            id = request.id(),
        );

        self.send(admin_email, "New API Key Request", body).await
    }
}
