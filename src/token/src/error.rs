//! Error types for the token lifecycle

use thiserror::Error;

/// Malformed duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("Duration is empty")]
    Empty,

    #[error("Duration '{0}' has no numeric part")]
    MissingValue(String),

    #[error("Duration '{0}' has no unit")]
    MissingUnit(String),

    #[error("Duration '{0}' is malformed (compound durations are not supported)")]
    Malformed(String),

    #[error("Duration '{0}' has an unknown unit (expected one of s, m, h, d)")]
    UnknownUnit(String),

    #[error("Duration '{0}' overflows")]
    Overflow(String),
}

/// Construction-time misconfiguration. Fatal, never produced per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("JWT secret is required")]
    SecretRequired,

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid duration for {field}: {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: DurationError,
    },
}

/// Why a token failed verification.
///
/// Only surfaces through [`crate::TokenManager::decode`]; `verify` collapses all of
/// these to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is empty")]
    Empty,

    #[error("Token must have exactly three segments, found {0}")]
    SegmentCount(usize),

    #[error("Segment is not valid base64url")]
    Encoding,

    #[error("Segment is not valid JSON: {0}")]
    Json(String),

    #[error("Header algorithm does not match the configured algorithm")]
    AlgorithmMismatch,

    #[error("Signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Issuer mismatch")]
    IssuerMismatch,

    #[error("Audience mismatch")]
    AudienceMismatch,

    #[error("Invalid expiry: {0}")]
    InvalidExpiry(#[from] DurationError),
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        TokenError::Json(err.to_string())
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(_: base64::DecodeError) -> Self {
        TokenError::Encoding
    }
}
