use serde::Deserialize;

/// Application configuration
///
/// Loaded once at startup from config files and `APP__`-prefixed
/// environment variables; a few well-known raw variables (`ADMIN_SECRET`,
/// `DATABASE_URL`, `EMAIL_API_KEY`) are also honored during wiring.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub keys: KeysConfig,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Connection URL; the `DATABASE_URL` environment variable wins
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Operator secret; the `ADMIN_SECRET` environment variable wins
    pub admin_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Approve every submitted key request immediately
    pub auto_approve: bool,
    /// Prefix on generated key tokens
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Email provider send endpoint
    pub endpoint: String,
    /// Provider API key; without one the logging notifier is used
    pub api_key: Option<String>,
    /// From address for all mail
    pub from: String,
    /// Operator address for new-request alerts
    pub admin_email: Option<String>,
    /// Public base URL, used in email bodies
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            prefix: "qk_".to_string(),
        }
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.smtp2go.com/v3/email/send".to_string(),
            api_key: None,
            from: "\"Quotevault API\" <noreply@quotevault.dev>".to_string(),
            admin_email: None,
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(!config.keys.auto_approve);
        assert_eq!(config.keys.prefix, "qk_");
        assert!(config.auth.admin_secret.is_none());
    }

    #[test]
    fn test_backend_deserialization() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"backend": "postgres"}"#).unwrap();
        assert_eq!(config.backend, StorageBackend::Postgres);
    }
}
