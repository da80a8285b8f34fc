//! # Practicum Token
//!
//! Compact signed-token lifecycle for the practicum access core.
//!
//! - **Duration parsing** for expiry and clock-tolerance strings ("15m", "7d")
//! - **Codec** for the `header.payload.signature` wire format (HMAC-SHA256/384/512)
//! - **TokenManager** issuing access/refresh tokens and verifying them against
//!   issuer, audience and clock tolerance
//!
//! ## Example
//!
//! ```rust
//! use practicum_token::{SignOptions, TokenConfig, TokenManager, TokenPayload};
//!
//! let manager = TokenManager::new(TokenConfig::with_secret("change-me")).unwrap();
//! let payload = TokenPayload::new("user-42").with_role("Student");
//!
//! let token = manager.sign(&payload, &SignOptions::access()).unwrap();
//! let claims = manager.verify(&token).expect("freshly signed token verifies");
//! assert_eq!(claims.sub, "user-42");
//! ```

pub mod claims;
pub mod codec;
pub mod config;
pub mod duration;
pub mod error;
pub mod manager;

pub use claims::{SignOptions, TokenClaims, TokenKind, TokenPair, TokenPayload};
pub use codec::{Algorithm, Codec};
pub use config::{Secret, TokenConfig};
pub use duration::parse_duration;
pub use error::{ConfigError, DurationError, TokenError};
pub use manager::TokenManager;
