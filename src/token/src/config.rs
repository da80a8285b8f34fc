//! Token lifecycle configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signing key, given either as text or as raw bytes
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Secret {
    Text(String),
    Bytes(Vec<u8>),
}

impl Secret {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Secret::Text(text) => text.as_bytes(),
            Secret::Bytes(bytes) => bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::Text(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret::Text(value)
    }
}

impl From<Vec<u8>> for Secret {
    fn from(value: Vec<u8>) -> Self {
        Secret::Bytes(value)
    }
}

/// Recognized options for [`crate::TokenManager`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    /// Required, non-empty
    #[serde(default)]
    pub secret: Option<Secret>,

    /// `HS256` when unset
    #[serde(default)]
    pub alg: Option<String>,

    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: String,

    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: String,

    /// Allowed clock skew when judging expiry
    #[serde(default = "default_clock_tolerance")]
    pub clock_tolerance: String,

    #[serde(default)]
    pub issuer: Option<String>,

    #[serde(default)]
    pub audience: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            alg: None,
            access_token_expiry: default_access_expiry(),
            refresh_token_expiry: default_refresh_expiry(),
            clock_tolerance: default_clock_tolerance(),
            issuer: None,
            audience: None,
        }
    }
}

impl TokenConfig {
    pub fn with_secret(secret: impl Into<Secret>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Default::default()
        }
    }

    pub fn alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    pub fn clock_tolerance(mut self, tolerance: impl Into<String>) -> Self {
        self.clock_tolerance = tolerance.into();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

fn default_access_expiry() -> String { "15m".to_string() }
fn default_refresh_expiry() -> String { "7d".to_string() }
fn default_clock_tolerance() -> String { "30s".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: TokenConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.access_token_expiry, "15m");
        assert_eq!(config.refresh_token_expiry, "7d");
        assert_eq!(config.clock_tolerance, "30s");
        assert!(config.secret.is_none());
    }

    #[test]
    fn test_secret_forms() {
        let text: TokenConfig = serde_json::from_str(r#"{"secret": "abc"}"#).unwrap();
        assert_eq!(text.secret.unwrap().as_bytes(), b"abc");

        let bytes: TokenConfig = serde_json::from_str(r#"{"secret": [1, 2, 3]}"#).unwrap();
        assert_eq!(bytes.secret.unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_camel_case_keys() {
        let config: TokenConfig = serde_json::from_str(
            r#"{"secret": "s", "accessTokenExpiry": "5m", "clockTolerance": "0s", "issuer": "practicum"}"#,
        )
        .unwrap();
        assert_eq!(config.access_token_expiry, "5m");
        assert_eq!(config.clock_tolerance, "0s");
        assert_eq!(config.issuer.as_deref(), Some("practicum"));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let config = TokenConfig::with_secret("hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
