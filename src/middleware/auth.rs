// ABOUTME: Session gate resolving the session cookie to an existing account on every protected request
// ABOUTME: Rejections carry a stable reason; admitted requests get an AuthenticatedUser extension
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! # Session Middleware
//!
//! Each protected request walks a short state machine that ends in ADMIT or
//! REJECT:
//!
//! 1. read the `jwt` cookie; absent or empty is `Unauthenticated`
//! 2. check signature and expiry
//! 3. decode the subject
//! 4. look the subject up in the account store; a missing account is
//!    `UnknownAccount`, a store failure is `LookupFailed` (500, not 401)
//! 5. admit, attaching [`AuthenticatedUser`] to the request extensions
//!
//! A token whose account has been deleted is refused even though it still
//! verifies, which makes account deletion the revocation mechanism.

use crate::auth::{TokenCodec, TokenError};
use crate::database_plugins::AccountStore;
use crate::security::cookies::get_cookie_value;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::HeaderMap;
use std::sync::Arc;
use tenchi_core::constants::cookies::SESSION;
use tenchi_core::errors::{AppError, ErrorCode};
use tenchi_core::models::User;
use thiserror::Error;

/// Identity attached to an admitted request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Subject from the session token
    pub subject: String,
    /// Account the subject resolved to
    pub account: User,
}

/// Why a request was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionRejection {
    /// No session cookie
    #[error("no session credential presented")]
    Unauthenticated,
    /// Token lifetime elapsed
    #[error("session credential expired")]
    Expired,
    /// Signature or structure check failed
    #[error("session credential signature is invalid")]
    InvalidSignature,
    /// Token declares an algorithm outside the allow-list
    #[error("session credential uses an unsupported algorithm")]
    UnsupportedAlgorithm,
    /// Subject or expiry claim unusable
    #[error("session credential claims are malformed")]
    MalformedClaims,
    /// Subject has no account
    #[error("session subject has no account")]
    UnknownAccount,
    /// Account store failed
    #[error("account lookup failed: {0}")]
    LookupFailed(String),
}

impl SessionRejection {
    /// Stable machine-readable reason
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::Expired => "Expired",
            Self::InvalidSignature => "InvalidSignature",
            Self::UnsupportedAlgorithm => "UnsupportedAlgorithm",
            Self::MalformedClaims => "MalformedClaims",
            Self::UnknownAccount => "UnknownAccount",
            Self::LookupFailed(_) => "LookupFailed",
        }
    }
}

impl From<TokenError> for SessionRejection {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => Self::Expired,
            TokenError::UnsupportedAlgorithm(_) => Self::UnsupportedAlgorithm,
            TokenError::MalformedClaims => Self::MalformedClaims,
            TokenError::InvalidSignature | TokenError::Signing(_) => Self::InvalidSignature,
        }
    }
}

impl From<SessionRejection> for AppError {
    fn from(rejection: SessionRejection) -> Self {
        let reason = rejection.reason();
        let error = match rejection {
            SessionRejection::Unauthenticated => Self::auth_required(),
            SessionRejection::Expired => Self::auth_expired(),
            SessionRejection::InvalidSignature | SessionRejection::UnsupportedAlgorithm => {
                Self::auth_invalid("Session token failed verification")
            }
            SessionRejection::MalformedClaims => {
                Self::new(ErrorCode::AuthMalformed, "Session token claims are malformed")
            }
            SessionRejection::UnknownAccount => {
                Self::auth_invalid("Session does not belong to a known account")
            }
            SessionRejection::LookupFailed(detail) => {
                Self::internal("Failed to resolve session account")
                    .with_source(SessionRejection::LookupFailed(detail))
            }
        };
        error.with_reason(reason)
    }
}

/// Resolves session cookies to accounts
pub struct SessionAuthenticator {
    codec: Arc<TokenCodec>,
    accounts: Arc<dyn AccountStore>,
}

impl SessionAuthenticator {
    /// Create an authenticator over the shared codec and account store
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { codec, accounts }
    }

    /// Run the session checks against request headers
    ///
    /// # Errors
    ///
    /// Returns the [`SessionRejection`] for the first failing step
    #[tracing::instrument(
        skip(self, headers),
        fields(subject = tracing::field::Empty, reason = tracing::field::Empty)
    )]
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedUser, SessionRejection> {
        let result = self.resolve(headers).await;

        match &result {
            Ok(user) => {
                tracing::Span::current().record("subject", user.subject.as_str());
                tracing::debug!("Session admitted");
            }
            Err(rejection) => {
                tracing::Span::current().record("reason", rejection.reason());
                match rejection {
                    SessionRejection::LookupFailed(e) => {
                        tracing::error!(error = %e, "Session account lookup failed");
                    }
                    SessionRejection::Unauthenticated | SessionRejection::Expired => {
                        tracing::debug!(reason = rejection.reason(), "Session rejected");
                    }
                    _ => tracing::warn!(reason = rejection.reason(), "Session rejected"),
                }
            }
        }
        result
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, SessionRejection> {
        let token = get_cookie_value(headers, SESSION)
            .filter(|token| !token.is_empty())
            .ok_or(SessionRejection::Unauthenticated)?;

        self.codec.check_liveness(&token)?;
        let subject = self.codec.verify(&token)?;

        let account = self
            .accounts
            .find_by_subject(&subject)
            .await
            .map_err(|e| SessionRejection::LookupFailed(format!("{e:#}")))?
            .ok_or(SessionRejection::UnknownAccount)?;

        Ok(AuthenticatedUser { subject, account })
    }
}

/// Axum middleware admitting only requests with a valid session
///
/// ```rust,no_run
/// use axum::{middleware, routing::get, Router};
/// use std::sync::Arc;
/// use tenchi_geolocation::middleware::auth::{require_session, SessionAuthenticator};
///
/// # async fn handler() -> &'static str { "" }
/// # fn example(authenticator: Arc<SessionAuthenticator>) {
/// let app: Router = Router::new()
///     .route("/api/user/me", get(handler))
///     .layer(middleware::from_fn_with_state(authenticator, require_session));
/// # }
/// ```
pub async fn require_session(
    State(authenticator): State<Arc<SessionAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticator.authenticate(req.headers()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(rejection) => AppError::from(rejection).into_response(),
    }
}
