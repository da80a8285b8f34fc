//! Three-segment signed token wire format.
//!
//! `base64url(header) . base64url(payload) . base64url(hmac(header "." payload))`,
//! all segments without padding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, TokenError};

/// HMAC variants accepted for signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Token header segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: Algorithm,
    pub typ: String,
}

impl Header {
    pub fn new(alg: Algorithm) -> Self {
        Self {
            alg,
            typ: "JWT".to_string(),
        }
    }
}

/// Encodes and checks signed tokens for one key and algorithm
#[derive(Clone)]
pub struct Codec {
    alg: Algorithm,
    key: Vec<u8>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("alg", &self.alg)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Codec {
    pub fn new(alg: Algorithm, key: impl Into<Vec<u8>>) -> Self {
        Self {
            alg,
            key: key.into(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.alg
    }

    /// Serialize `claims` and produce `header.payload.signature`
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let header = encode_segment(&Header::new(self.alg))?;
        let payload = encode_segment(claims)?;
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(signing_input.as_bytes())?);

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Split, check the signature and deserialize the payload.
    ///
    /// Expiry, issuer and audience are not judged here.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments[..] else {
            return Err(TokenError::SegmentCount(segments.len()));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != self.alg {
            return Err(TokenError::AlgorithmMismatch);
        }

        let signature = URL_SAFE_NO_PAD.decode(signature_b64)?;
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        self.verify_mac(signing_input.as_bytes(), &signature)?;

        decode_segment(payload_b64)
    }

    fn mac(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        match self.alg {
            Algorithm::HS256 => compute::<Hmac<Sha256>>(&self.key, input),
            Algorithm::HS384 => compute::<Hmac<Sha384>>(&self.key, input),
            Algorithm::HS512 => compute::<Hmac<Sha512>>(&self.key, input),
        }
    }

    fn verify_mac(&self, input: &[u8], signature: &[u8]) -> Result<(), TokenError> {
        match self.alg {
            Algorithm::HS256 => check::<Hmac<Sha256>>(&self.key, input, signature),
            Algorithm::HS384 => check::<Hmac<Sha384>>(&self.key, input, signature),
            Algorithm::HS512 => check::<Hmac<Sha512>>(&self.key, input, signature),
        }
    }
}

fn keyed<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Result<M, TokenError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| TokenError::BadSignature)?;
    mac.update(input);
    Ok(mac)
}

fn compute<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Result<Vec<u8>, TokenError> {
    Ok(keyed::<M>(key, input)?.finalize().into_bytes().to_vec())
}

// Constant-time comparison through the MAC itself.
fn check<M: Mac + KeyInit>(key: &[u8], input: &[u8], signature: &[u8]) -> Result<(), TokenError> {
    keyed::<M>(key, input)?
        .verify_slice(signature)
        .map_err(|_| TokenError::BadSignature)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}
