//! API key entity and related types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// API key identifier - system assigned, immutable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKeyId(String);

impl ApiKeyId {
    /// Create an ApiKeyId from an existing identifier
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("API key id cannot be empty"));
        }
        Ok(Self(id))
    }

    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKeyId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKeyId> for String {
    fn from(id: ApiKeyId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability tag granted to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Per-key usage accounting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyUsage {
    /// Number of successful authentications; never decreases
    pub count: u64,
    /// Timestamp of the most recent successful authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl KeyUsage {
    /// Record one successful authentication
    pub fn record(&mut self) {
        self.count += 1;
        self.last_used = Some(Utc::now());
    }
}

/// API key entity
///
/// The raw token never lives here; only its digest and a short display
/// prefix are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Unique identifier for the key
    id: ApiKeyId,
    /// Digest of the secret token (format: `sha256$<base64url>`)
    secret_hash: String,
    /// Leading characters of the token, for identification in listings
    key_prefix: String,
    /// Display name for the key
    name: String,
    /// Description of the key's purpose
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Usage accounting
    usage: KeyUsage,
    /// Inactive keys fail authentication but are not deleted
    active: bool,
    /// Capability tags
    permissions: BTreeSet<Permission>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl ApiKey {
    /// Create a new API key record
    pub fn new(
        id: ApiKeyId,
        name: impl Into<String>,
        secret_hash: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            secret_hash: secret_hash.into(),
            key_prefix: key_prefix.into(),
            name: name.into(),
            description: None,
            usage: KeyUsage::default(),
            active: true,
            permissions: BTreeSet::from([Permission::Read]),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set permissions
    pub fn with_permissions(mut self, permissions: BTreeSet<Permission>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Rebuild a key from its stored representation
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: ApiKeyId,
        name: String,
        secret_hash: String,
        key_prefix: String,
        description: Option<String>,
        usage: KeyUsage,
        active: bool,
        permissions: BTreeSet<Permission>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            secret_hash,
            key_prefix,
            name,
            description,
            usage,
            active,
            permissions,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn usage(&self) -> &KeyUsage {
        &self.usage
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    // Mutators

    /// Update the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Update the description
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    /// Enable or disable the key
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    /// Record one successful authentication
    pub fn record_usage(&mut self) {
        self.usage.record();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
