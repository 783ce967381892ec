// ABOUTME: HMAC-signed session token issuance and verification with an explicit algorithm allow-list
// ABOUTME: Expiry is judged against an injected clock so tests control time deterministically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! # Session Tokens
//!
//! A session token is a compact JWT (`header.claims.signature`) with claims
//! `{"user_id": string, "iat": number, "exp": number}`. Tokens are issued
//! with HS256 and accepted when signed with any of HS256, HS384 or HS512.
//!
//! The header's declared algorithm is checked against the allow-list before
//! the token reaches the JWT library, so `none` and asymmetric algorithms are
//! rejected as [`TokenError::UnsupportedAlgorithm`] regardless of library
//! behavior. Expiry is evaluated here rather than by the library, using the
//! [`Clock`] supplied at construction: a token is expired once `exp <= now`.

use crate::clock::Clock;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tenchi_core::constants::session::{ALLOWED_ALGORITHMS, TOKEN_EXPIRY_HOURS};
use thiserror::Error;

/// Reasons a token can be refused or fail to be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature mismatch, or the token is not three decodable segments
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Header declares an algorithm outside the allow-list
    #[error("token algorithm {0:?} is not accepted")]
    UnsupportedAlgorithm(String),
    /// `exp` is at or before the current time
    #[error("token has expired")]
    Expired,
    /// `user_id` or `exp` is absent or has the wrong type
    #[error("token claims are malformed")]
    MalformedClaims,
    /// The signing key could not produce a token
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Stable machine-readable reason
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "InvalidSignature",
            Self::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
            Self::Expired => "Expired",
            Self::MalformedClaims => "MalformedClaims",
            Self::Signing(_) => "SigningFailed",
        }
    }
}

/// Claims written on issuance
#[derive(Debug, Serialize)]
struct SessionClaims<'a> {
    user_id: &'a str,
    iat: i64,
    exp: i64,
}

/// Claims as read back; every field is checked by hand
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: Option<serde_json::Value>,
}

/// Issues and verifies session tokens
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec over the given HMAC secret and clock
    #[must_use]
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Expiry and claim shape are checked against the injected clock below
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    /// Issue a token for `subject`, valid for 24 hours from now
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the key cannot sign
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = SessionClaims {
            user_id: subject,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Session token signing failed");
            TokenError::Signing(e.to_string())
        })
    }

    /// Verify a token and return its subject
    ///
    /// # Errors
    ///
    /// Returns the first failing check in order: structure and signature,
    /// algorithm, expiry, then subject shape
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.decode_checked(token)?;
        Self::check_expiry(&claims, self.clock.now().timestamp())?;

        match claims.user_id {
            Some(serde_json::Value::String(subject)) => Ok(subject),
            _ => Err(TokenError::MalformedClaims),
        }
    }

    /// Signature and expiry check without looking at the subject
    ///
    /// # Errors
    ///
    /// Returns why the token is not live
    pub fn check_liveness(&self, token: &str) -> Result<(), TokenError> {
        let claims = self.decode_checked(token)?;
        Self::check_expiry(&claims, self.clock.now().timestamp())
    }

    /// True iff the signature verifies and the token has not expired
    #[must_use]
    pub fn is_live(&self, token: &str) -> bool {
        self.check_liveness(token).is_ok()
    }

    fn decode_checked(&self, token: &str) -> Result<RawClaims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(_), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::InvalidSignature);
        };

        let algorithm = declared_algorithm(header)?;
        if !ALLOWED_ALGORITHMS.contains(&algorithm.as_str()) {
            return Err(TokenError::UnsupportedAlgorithm(algorithm));
        }

        decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| convert_jwt_error(&e))
    }

    fn check_expiry(claims: &RawClaims, now: i64) -> Result<(), TokenError> {
        let exp = claims
            .exp
            .as_ref()
            .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
            .ok_or(TokenError::MalformedClaims)?;

        if exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

/// Read `alg` from the encoded header segment
fn declared_algorithm(header_segment: &str) -> Result<String, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(header_segment)
        .map_err(|_| TokenError::InvalidSignature)?;
    let header: RawHeader =
        serde_json::from_slice(&bytes).map_err(|_| TokenError::InvalidSignature)?;

    match header.alg {
        Some(serde_json::Value::String(alg)) => Ok(alg),
        Some(other) => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        None => Err(TokenError::UnsupportedAlgorithm(String::new())),
    }
}

fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        // The header already parsed, so a JSON failure here is in the claims
        ErrorKind::Json(_) => TokenError::MalformedClaims,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::UnsupportedAlgorithm(String::new())
        }
        _ => {
            tracing::debug!(error = ?e, "Session token rejected by verifier");
            TokenError::InvalidSignature
        }
    }
}
