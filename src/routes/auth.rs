// ABOUTME: Login, OAuth callback and logout route handlers
// ABOUTME: AuthFlowController turns a provider callback into an account and a session cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! Authentication routes
//!
//! `GET /api/login` redirects to the identity provider with a fresh
//! anti-forgery state, `GET /api/callback` completes the exchange and sets
//! the session cookie, and `POST /api/logout` clears it. The handlers are
//! thin: the flow itself lives in [`AuthFlowController`] so it can be driven
//! without HTTP.

use crate::auth::{TokenCodec, TokenError};
use crate::database_plugins::{AccountStore, DatabaseError};
use crate::logging::AppLogger;
use crate::oauth2_client::{IdentityError, IdentityProvider};
use crate::resources::ServerResources;
use crate::security::cookies::{
    clear_oauth_state_cookie, clear_session_cookie, get_cookie_value, set_oauth_state_cookie,
    set_session_cookie,
};
use crate::security::oauth_state::{generate_state, states_match};
use axum::{
    extract::{Query, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tenchi_core::constants::cookies::OAUTH_STATE;
use tenchi_core::errors::{AppError, ErrorCode};
use tenchi_core::models::IdentityProfile;
use thiserror::Error;

/// Query parameters the provider appends to the callback URL
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// Anti-forgery state echoed back by the provider
    pub state: Option<String>,
    /// Set by the provider when the user denied consent
    pub error: Option<String>,
}

/// Why a login attempt did not produce a session
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// Callback carried no usable authorization code
    #[error("authorization code is missing")]
    MissingCode,
    /// Returned state does not match the one issued at login
    #[error("anti-forgery state does not match")]
    InvalidState,
    /// Provider exchange or profile fetch failed
    #[error(transparent)]
    Identity(#[from] IdentityError),
    /// Account existence check failed
    #[error("account lookup failed: {0}")]
    LookupFailed(String),
    /// Account creation failed
    #[error("account creation failed: {0}")]
    CreateFailed(String),
    /// Session token could not be issued
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AuthFlowError {
    /// Stable machine-readable reason
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingCode => "MissingCode",
            Self::InvalidState => "InvalidState",
            Self::Identity(e) => e.reason(),
            Self::LookupFailed(_) => "LookupFailed",
            Self::CreateFailed(_) => "CreateFailed",
            Self::Token(e) => e.reason(),
        }
    }
}

impl From<AuthFlowError> for AppError {
    fn from(error: AuthFlowError) -> Self {
        let reason = error.reason();
        let app_error = match error {
            AuthFlowError::MissingCode => IdentityError::MissingCode.into(),
            AuthFlowError::InvalidState => {
                Self::new(ErrorCode::InvalidInput, "Login state does not match")
            }
            AuthFlowError::Identity(e) => e.into(),
            AuthFlowError::LookupFailed(detail) => Self::database("Failed to look up account")
                .with_source(AuthFlowError::LookupFailed(detail)),
            AuthFlowError::CreateFailed(detail) => Self::database("Failed to create account")
                .with_source(AuthFlowError::CreateFailed(detail)),
            AuthFlowError::Token(e) => Self::internal("Failed to issue session").with_source(e),
        };
        app_error.with_reason(reason)
    }
}

/// Redirect target produced when a login starts
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// State to remember in the browser
    pub state: String,
    /// Provider authorization URL carrying `state`
    pub url: String,
}

/// Outcome of a completed callback
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Subject the session was issued for
    pub subject: String,
    /// Signed session token
    pub token: String,
    /// Whether the account was created by this login
    pub created: bool,
}

/// Orchestrates the authorization-code login
pub struct AuthFlowController {
    identity: Arc<dyn IdentityProvider>,
    accounts: Arc<dyn AccountStore>,
    codec: Arc<TokenCodec>,
}

impl AuthFlowController {
    /// Create a controller over explicit collaborators
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        accounts: Arc<dyn AccountStore>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            identity,
            accounts,
            codec,
        }
    }

    /// Controller wired to the shared server resources
    #[must_use]
    pub fn from_resources(resources: &ServerResources) -> Self {
        Self::new(
            resources.identity.clone(),
            resources.accounts.clone(),
            resources.token_codec.clone(),
        )
    }

    /// Start a login with a fresh state
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's authorization URL cannot be built
    pub fn begin_login(&self) -> Result<LoginRedirect, AuthFlowError> {
        let state = generate_state();
        let url = self.identity.authorization_url(&state)?;
        Ok(LoginRedirect { state, url })
    }

    /// Complete a login from the callback parameters
    ///
    /// `expected_state` is the state remembered at login. Input is validated
    /// before any provider or store call is made.
    ///
    /// # Errors
    ///
    /// Returns the first failing step of the flow
    pub async fn complete_login(
        &self,
        params: &CallbackParams,
        expected_state: Option<&str>,
    ) -> Result<LoginOutcome, AuthFlowError> {
        if params.error.is_some() {
            return Err(AuthFlowError::MissingCode);
        }
        let code = params
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(AuthFlowError::MissingCode)?;

        match (params.state.as_deref(), expected_state) {
            (Some(returned), Some(expected)) if states_match(returned, expected) => {}
            _ => return Err(AuthFlowError::InvalidState),
        }

        let provider_token = self.identity.exchange_code(code).await?;
        let profile = self.identity.fetch_profile(&provider_token).await?;
        let created = self.resolve_account(&profile).await?;
        let token = self.codec.issue(&profile.subject)?;

        Ok(LoginOutcome {
            subject: profile.subject,
            token,
            created,
        })
    }

    /// Ensure an account exists for `profile`; true if it was created now
    async fn resolve_account(&self, profile: &IdentityProfile) -> Result<bool, AuthFlowError> {
        let exists = self
            .accounts
            .exists(&profile.subject)
            .await
            .map_err(|e| AuthFlowError::LookupFailed(format!("{e:#}")))?;
        if exists {
            return Ok(false);
        }

        match self
            .accounts
            .create(
                &profile.subject,
                &profile.email,
                profile.picture_url.as_deref(),
            )
            .await
        {
            Ok(_) => Ok(true),
            // A concurrent login for the same subject created the row first
            Err(e)
                if matches!(
                    e.downcast_ref::<DatabaseError>(),
                    Some(DatabaseError::Conflict { .. })
                ) =>
            {
                tracing::debug!(
                    subject = %profile.subject,
                    "Account created by a concurrent login"
                );
                Ok(false)
            }
            Err(e) => Err(AuthFlowError::CreateFailed(format!("{e:#}"))),
        }
    }
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/login", get(Self::handle_login))
            .route("/api/callback", get(Self::handle_callback))
            .route("/api/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    /// Handle GET /api/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let redirect = AuthFlowController::from_resources(&resources)
            .begin_login()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to build authorization URL");
                AppError::from(e)
            })?;

        let mut headers = HeaderMap::new();
        set_oauth_state_cookie(&mut headers, &redirect.state, resources.cookie_secure);
        Ok(found(headers, &redirect.url))
    }

    /// Handle GET /api/callback
    async fn handle_callback(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<CallbackParams>,
    ) -> Result<Response, AppError> {
        let expected_state = get_cookie_value(&headers, OAUTH_STATE);
        let controller = AuthFlowController::from_resources(&resources);

        let outcome = match controller
            .complete_login(&params, expected_state.as_deref())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                match &e {
                    AuthFlowError::MissingCode | AuthFlowError::InvalidState => {
                        tracing::info!(reason = e.reason(), "Login callback refused");
                    }
                    AuthFlowError::Identity(_) => {
                        tracing::warn!(reason = e.reason(), error = %e, "Identity exchange failed");
                    }
                    _ => tracing::error!(reason = e.reason(), error = %e, "Login failed"),
                }
                return Err(e.into());
            }
        };

        AppLogger::log_auth_event(
            &outcome.subject,
            if outcome.created { "signup" } else { "login" },
            true,
            None,
        );

        let mut response_headers = HeaderMap::new();
        set_session_cookie(&mut response_headers, &outcome.token, resources.cookie_secure);
        clear_oauth_state_cookie(&mut response_headers, resources.cookie_secure);
        Ok(found(response_headers, "/"))
    }

    /// Handle POST /api/logout
    async fn handle_logout(State(resources): State<Arc<ServerResources>>) -> Response {
        let mut headers = HeaderMap::new();
        clear_session_cookie(&mut headers, resources.cookie_secure);
        (StatusCode::OK, headers).into_response()
    }
}

/// 302 to `location` with the given headers
fn found(mut headers: HeaderMap, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(LOCATION, value);
            (StatusCode::FOUND, headers).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Redirect target is not a valid header");
            AppError::internal("Invalid redirect target").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_errors_map_to_status() {
        let missing: AppError = AuthFlowError::MissingCode.into();
        assert_eq!(missing.http_status(), 400);
        assert_eq!(missing.reason(), Some("MissingCode"));

        let state: AppError = AuthFlowError::InvalidState.into();
        assert_eq!(state.http_status(), 400);
        assert_eq!(state.reason(), Some("InvalidState"));

        let lookup: AppError = AuthFlowError::LookupFailed("down".to_owned()).into();
        assert_eq!(lookup.http_status(), 500);
        assert_eq!(lookup.reason(), Some("LookupFailed"));

        let exchange: AppError =
            AuthFlowError::Identity(IdentityError::ExchangeFailed("400".to_owned())).into();
        assert_eq!(exchange.http_status(), 502);
        assert_eq!(exchange.reason(), Some("ExchangeFailed"));
    }

    #[test]
    fn test_signing_failure_hides_detail() {
        let error: AppError = AuthFlowError::Token(TokenError::Signing("key".to_owned())).into();
        assert_eq!(error.http_status(), 500);
        assert!(!error.message.contains("key"));
    }
}
