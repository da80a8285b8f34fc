//! Access core configuration loading and validation

use anyhow::{Context, Result};
use practicum_token::{Secret, TokenConfig, TokenManager};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::engine::EngineConfig;
use crate::grants::GrantTable;
use crate::identity::IdentityCacheConfig;

/// Environment variable overriding `token.secret`
pub const ENV_SECRET: &str = "PRACTICUM_JWT_SECRET";
/// Environment variable overriding `token.issuer`
pub const ENV_ISSUER: &str = "PRACTICUM_JWT_ISSUER";
/// Environment variable overriding `token.audience`
pub const ENV_AUDIENCE: &str = "PRACTICUM_JWT_AUDIENCE";

/// Complete access core configuration
///
/// ```toml
/// [token]
/// secret = "change-me"
/// alg = "HS256"
/// accessTokenExpiry = "15m"
///
/// [identity_cache]
/// capacity = 500
/// ttl_secs = 1800
///
/// [engine]
/// resolver_timeout_ms = 2000
///
/// # Optional; replaces the standard grant table
/// [grants]
/// Student = ["Student:Read_Own"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub identity_cache: IdentityCacheConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Role name → permission literals
    #[serde(default)]
    pub grants: Option<HashMap<String, Vec<String>>>,
}

impl AccessConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .context("Failed to read configuration file")?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse configuration file")
    }

    /// Apply `PRACTICUM_JWT_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(secret) = lookup(ENV_SECRET) {
            self.token.secret = Some(Secret::Text(secret));
        }
        if let Some(issuer) = lookup(ENV_ISSUER) {
            self.token.issuer = Some(issuer);
        }
        if let Some(audience) = lookup(ENV_AUDIENCE) {
            self.token.audience = Some(audience);
        }
    }

    /// Grant table from `[grants]`, or the standard one
    pub fn grant_table(&self) -> crate::Result<GrantTable> {
        match &self.grants {
            Some(literals) => GrantTable::from_literals(literals),
            None => Ok(GrantTable::standard()),
        }
    }

    /// Validate configuration
    ///
    /// Builds the token manager and grant table once so that every
    /// construction-time error surfaces here rather than at first use.
    pub fn validate(&self) -> Result<()> {
        TokenManager::new(self.token.clone()).context("Invalid [token] section")?;
        self.grant_table().context("Invalid [grants] section")?;

        if self.identity_cache.capacity == 0 {
            anyhow::bail!("identity_cache.capacity must be at least 1");
        }

        if self.engine.resolver_timeout_ms == 0 {
            anyhow::bail!("engine.resolver_timeout_ms must be positive");
        }

        Ok(())
    }
}
