//! Error types for the access core

use thiserror::Error;

/// Access core errors
///
/// Only [`AuthzError::Config`] and [`AuthzError::InvalidGrant`] are raised at
/// construction time. Repository failures inside ownership resolvers never leave
/// the decision engine; they are logged and become a deny.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed permission literal
    #[error("Invalid permission grant: {0}")]
    InvalidGrant(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token failed verification (authentication failure)
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// Token could not be issued
    #[error("Token error: {0}")]
    Token(#[from] practicum_token::TokenError),

    /// Subject resolved from a valid token does not exist (authentication failure)
    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    /// Repository error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Identity lookup failed for reasons other than a missing subject;
    /// the underlying error is only logged
    #[error("Identity temporarily unavailable")]
    IdentityUnavailable,

    /// Resolver did not answer within its deadline
    #[error("Resolver timed out")]
    ResolverTimeout,

    /// Caller cancelled the check
    #[error("Check cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// Whether the caller should answer "who are you" rather than "not allowed"
    ///
    /// [`AuthzError::IdentityUnavailable`] is neither; it is a service outage.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, AuthzError::TokenInvalid | AuthzError::IdentityNotFound(_))
    }
}

impl From<practicum_token::ConfigError> for AuthzError {
    fn from(err: practicum_token::ConfigError) -> Self {
        AuthzError::Config(err.to_string())
    }
}

/// Result type for access core operations
pub type Result<T> = std::result::Result<T, AuthzError>;
