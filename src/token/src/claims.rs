//! Token payload types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied identity payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject identifier, copied into `sub`
    pub id: String,

    /// Role tags held by the subject
    #[serde(default)]
    pub roles: Vec<String>,

    /// Any other caller fields, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenPayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Claims as signed into, and parsed out of, a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: String,

    #[serde(default)]
    pub roles: Vec<String>,

    pub sub: String,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expires at (seconds since epoch)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Recover the payload the token was signed from
    pub fn payload(&self) -> TokenPayload {
        TokenPayload {
            id: self.id.clone(),
            roles: self.roles.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Which default expiry a signed token uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[default]
    Access,
    Refresh,
}

/// Per-call signing options
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    pub kind: TokenKind,

    /// Overrides the kind's default expiry (duration string, e.g. "1s")
    pub expires_in: Option<String>,
}

impl SignOptions {
    pub fn access() -> Self {
        Self::default()
    }

    pub fn refresh() -> Self {
        Self {
            kind: TokenKind::Refresh,
            expires_in: None,
        }
    }

    pub fn expires_in(mut self, duration: impl Into<String>) -> Self {
        self.expires_in = Some(duration.into());
        self
    }
}

/// Access and refresh tokens issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
