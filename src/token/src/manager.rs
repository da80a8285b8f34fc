//! Token lifecycle manager: issue and verify access/refresh tokens.

use chrono::Utc;
use tracing::{debug, info};

use crate::claims::{SignOptions, TokenClaims, TokenKind, TokenPair, TokenPayload};
use crate::codec::{Algorithm, Codec};
use crate::config::TokenConfig;
use crate::duration::parse_duration;
use crate::error::{ConfigError, TokenError};

/// Issues and verifies signed tokens
///
/// All configuration problems surface from [`TokenManager::new`]. After that,
/// signing can only fail on a bad per-call expiry override and verification
/// never fails loudly: it returns `None`.
#[derive(Debug, Clone)]
pub struct TokenManager {
    codec: Codec,
    access_ttl: u64,
    refresh_ttl: u64,
    clock_tolerance: u64,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenManager {
    pub fn new(config: TokenConfig) -> Result<Self, ConfigError> {
        let secret = match config.secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => return Err(ConfigError::SecretRequired),
        };

        let alg = match config.alg.as_deref() {
            Some(alg) => alg.parse::<Algorithm>()?,
            None => Algorithm::default(),
        };

        let access_ttl = parse_field("accessTokenExpiry", &config.access_token_expiry)?;
        let refresh_ttl = parse_field("refreshTokenExpiry", &config.refresh_token_expiry)?;
        let clock_tolerance = parse_field("clockTolerance", &config.clock_tolerance)?;

        info!(
            alg = %alg,
            access_ttl,
            refresh_ttl,
            clock_tolerance,
            issuer = config.issuer.as_deref().unwrap_or("-"),
            audience = config.audience.as_deref().unwrap_or("-"),
            "TokenManager initialized"
        );

        Ok(Self {
            codec: Codec::new(alg, secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            clock_tolerance,
            issuer: config.issuer,
            audience: config.audience,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.codec.algorithm()
    }

    /// Sign `payload` as of the current time
    pub fn sign(&self, payload: &TokenPayload, options: &SignOptions) -> Result<String, TokenError> {
        self.sign_at(payload, options, now())
    }

    /// Sign `payload` as if the current time were `now` (seconds since epoch)
    pub fn sign_at(
        &self,
        payload: &TokenPayload,
        options: &SignOptions,
        now: i64,
    ) -> Result<String, TokenError> {
        let ttl = match &options.expires_in {
            Some(expiry) => parse_duration(expiry)?,
            None => match options.kind {
                TokenKind::Access => self.access_ttl,
                TokenKind::Refresh => self.refresh_ttl,
            },
        };

        let claims = TokenClaims {
            id: payload.id.clone(),
            roles: payload.roles.clone(),
            sub: payload.id.clone(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX)),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            extra: without_reserved(payload),
        };

        self.codec.encode(&claims)
    }

    /// Verify `token`; any failure yields `None`
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        self.verify_at(token, now())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Option<TokenClaims> {
        match self.decode_at(token, now) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(reason = %e, "Token rejected");
                None
            }
        }
    }

    /// Verification with the failure reason kept, for diagnostics
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, now())
    }

    pub fn decode_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        let claims: TokenClaims = self.codec.decode(token)?;

        let tolerance = i64::try_from(self.clock_tolerance).unwrap_or(i64::MAX);
        if claims.exp.saturating_add(tolerance) < now {
            return Err(TokenError::Expired);
        }

        if let Some(issuer) = &self.issuer {
            if claims.iss.as_ref() != Some(issuer) {
                return Err(TokenError::IssuerMismatch);
            }
        }

        if let Some(audience) = &self.audience {
            if claims.aud.as_ref() != Some(audience) {
                return Err(TokenError::AudienceMismatch);
            }
        }

        Ok(claims)
    }

    /// Issue an access and a refresh token for the same identity
    pub fn generate_token_pair(&self, payload: &TokenPayload) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(payload, &SignOptions::access())?,
            refresh_token: self.sign(payload, &SignOptions::refresh())?,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    parse_duration(value).map_err(|source| ConfigError::InvalidDuration { field, source })
}

// Caller fields may not shadow the claims the manager sets itself.
fn without_reserved(payload: &TokenPayload) -> serde_json::Map<String, serde_json::Value> {
    const RESERVED: [&str; 7] = ["id", "roles", "sub", "iat", "exp", "iss", "aud"];

    payload
        .extra
        .iter()
        .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn now() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TokenManager {
        TokenManager::new(TokenConfig::with_secret("test-secret").clock_tolerance("0s")).unwrap()
    }

    fn payload() -> TokenPayload {
        TokenPayload::new("user-1").with_role("Student")
    }

    #[test]
    fn test_construction_errors() {
        let err = TokenManager::new(TokenConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "JWT secret is required");

        let err = TokenManager::new(TokenConfig::with_secret("")).unwrap_err();
        assert_eq!(err, ConfigError::SecretRequired);

        let err = TokenManager::new(TokenConfig::with_secret(Vec::new())).unwrap_err();
        assert_eq!(err, ConfigError::SecretRequired);

        let err = TokenManager::new(TokenConfig::with_secret("s").alg("INVALID")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported algorithm: INVALID");

        let err = TokenManager::new(TokenConfig::with_secret("s").clock_tolerance("soon")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { field: "clockTolerance", .. }));
    }

    #[test]
    fn test_expiry_per_kind() {
        let manager = manager();
        let now = 1_700_000_000;

        let access = manager.sign_at(&payload(), &SignOptions::access(), now).unwrap();
        let refresh = manager.sign_at(&payload(), &SignOptions::refresh(), now).unwrap();
        let custom = manager
            .sign_at(&payload(), &SignOptions::access().expires_in("1h"), now)
            .unwrap();

        assert_eq!(manager.decode_at(&access, now).unwrap().exp, now + 15 * 60);
        assert_eq!(manager.decode_at(&refresh, now).unwrap().exp, now + 7 * 86_400);
        assert_eq!(manager.decode_at(&custom, now).unwrap().exp, now + 3_600);
    }

    #[test]
    fn test_bad_override_expiry() {
        let err = manager()
            .sign(&payload(), &SignOptions::access().expires_in("1h30m"))
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidExpiry(_)));
    }

    #[test]
    fn test_expiry_with_tolerance() {
        let strict = manager();
        let lenient =
            TokenManager::new(TokenConfig::with_secret("test-secret").clock_tolerance("10s")).unwrap();
        let now = 1_700_000_000;
        let token = strict
            .sign_at(&payload(), &SignOptions::access().expires_in("1s"), now)
            .unwrap();

        assert!(strict.verify_at(&token, now + 1).is_some());
        assert_eq!(strict.decode_at(&token, now + 2).unwrap_err(), TokenError::Expired);
        assert!(lenient.verify_at(&token, now + 11).is_some());
        assert!(lenient.verify_at(&token, now + 12).is_none());
    }

    #[test]
    fn test_tolerance_beyond_i64_saturates() {
        // 106751991167302d is more seconds than i64::MAX
        let manager = TokenManager::new(
            TokenConfig::with_secret("test-secret").clock_tolerance("106751991167302d"),
        )
        .unwrap();
        let now = 1_700_000_000;
        let token = manager
            .sign_at(&payload(), &SignOptions::access().expires_in("1s"), now)
            .unwrap();

        assert!(manager.decode_at(&token, now).is_ok());
        assert!(manager.decode_at(&token, now + 86_400).is_ok());
    }

    #[test]
    fn test_issuer_and_audience() {
        let config = TokenConfig::with_secret("test-secret")
            .issuer("practicum")
            .audience("web");
        let manager = TokenManager::new(config.clone()).unwrap();
        let token = manager.sign(&payload(), &SignOptions::access()).unwrap();

        let claims = manager.verify(&token).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("practicum"));
        assert_eq!(claims.aud.as_deref(), Some("web"));

        let other_issuer = TokenManager::new(config.clone().issuer("elsewhere")).unwrap();
        assert_eq!(other_issuer.decode(&token).unwrap_err(), TokenError::IssuerMismatch);

        let other_audience = TokenManager::new(config.audience("mobile")).unwrap();
        assert_eq!(other_audience.decode(&token).unwrap_err(), TokenError::AudienceMismatch);
    }

    #[test]
    fn test_reserved_fields_not_overridden() {
        let manager = manager();
        let sneaky = payload().with_field("exp", 9_999_999_999i64).with_field("school", "s-1");
        let token = manager.sign_at(&sneaky, &SignOptions::access(), 1_000).unwrap();
        let claims = manager.decode_at(&token, 1_000).unwrap();

        assert_eq!(claims.exp, 1_000 + 900);
        assert_eq!(claims.extra.get("school"), Some(&serde_json::json!("s-1")));
        assert!(!claims.extra.contains_key("exp"));
    }
}
