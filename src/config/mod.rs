//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, EmailSettings, KeysConfig, LogFormat, LoggingConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
