// ABOUTME: OAuth2 authorization-code client for the Google identity provider
// ABOUTME: Converts the provider's loosely typed profile JSON into a strict IdentityProfile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use crate::utils::http_client::oauth_client;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use tenchi_core::constants::oauth::{
    GOOGLE_AUTH_URL, GOOGLE_SCOPES, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL,
};
use tenchi_core::errors::{AppError, ErrorCode};
use tenchi_core::models::IdentityProfile;
use thiserror::Error;
use url::Url;

/// Failures of the identity exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The callback carried no authorization code
    #[error("authorization code is missing")]
    MissingCode,
    /// Token endpoint unreachable or returned an error
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),
    /// Profile endpoint unreachable, returned an error, or omitted required fields
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),
    /// Endpoint configuration cannot form a valid URL
    #[error("invalid OAuth configuration: {0}")]
    InvalidConfiguration(String),
}

impl IdentityError {
    /// Stable machine-readable reason
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingCode => "MissingCode",
            Self::ExchangeFailed(_) => "ExchangeFailed",
            Self::ProfileFetchFailed(_) => "ProfileFetchFailed",
            Self::InvalidConfiguration(_) => "InvalidConfiguration",
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(error: IdentityError) -> Self {
        let code = match &error {
            IdentityError::MissingCode => ErrorCode::MissingRequiredField,
            IdentityError::ExchangeFailed(_) | IdentityError::ProfileFetchFailed(_) => {
                ErrorCode::ExternalAuthFailed
            }
            IdentityError::InvalidConfiguration(_) => ErrorCode::ConfigError,
        };
        let message = match &error {
            IdentityError::MissingCode => "Authorization code is missing".to_owned(),
            IdentityError::ExchangeFailed(_) | IdentityError::ProfileFetchFailed(_) => {
                "Sign-in with the identity provider failed".to_owned()
            }
            IdentityError::InvalidConfiguration(_) => "OAuth client is misconfigured".to_owned(),
        };
        Self::new(code, message)
            .with_reason(error.reason())
            .with_source(error)
    }
}

/// OAuth 2.0 client configuration
#[derive(Clone)]
pub struct OAuth2Config {
    /// OAuth client ID from provider
    pub client_id: String,
    /// OAuth client secret from provider
    pub client_secret: String,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Profile endpoint URL
    pub userinfo_url: String,
    /// Redirect URI for OAuth callbacks
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Configuration against Google's production endpoints
    #[must_use]
    pub fn google(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            auth_url: GOOGLE_AUTH_URL.to_owned(),
            token_url: GOOGLE_TOKEN_URL.to_owned(),
            userinfo_url: GOOGLE_USERINFO_URL.to_owned(),
            redirect_uri,
            scopes: GOOGLE_SCOPES.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Access token issued by the provider; lives for one callback only
#[derive(Clone)]
pub struct ProviderToken {
    /// Bearer token for the profile endpoint
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiration timestamp, when the provider reports one
    pub expires_at: Option<DateTime<Utc>>,
}

impl ProviderToken {
    /// Wrap a bare access token
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_owned(),
            expires_at: None,
        }
    }
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Profile endpoint response; only `sub` and `email` are required
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfoResponse {
    /// Stable subject identifier
    #[serde(default)]
    pub sub: Option<String>,
    /// Primary email
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the provider verified the email
    #[serde(default)]
    pub email_verified: Option<bool>,
    /// Full display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar picture URL
    #[serde(default)]
    pub picture: Option<String>,
}

impl TryFrom<UserInfoResponse> for IdentityProfile {
    type Error = IdentityError;

    fn try_from(info: UserInfoResponse) -> Result<Self, Self::Error> {
        let subject = info
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IdentityError::ProfileFetchFailed("profile has no subject".into()))?;
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IdentityError::ProfileFetchFailed("profile has no email".into()))?;

        Ok(Self {
            subject,
            email,
            picture_url: info.picture.filter(|p| !p.is_empty()),
        })
    }
}

/// Identity provider as seen by the login callback
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is redirected to, carrying `state`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a valid URL
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError>;

    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, IdentityError>;

    /// Fetch the profile of the token's owner
    async fn fetch_profile(&self, token: &ProviderToken)
        -> Result<IdentityProfile, IdentityError>;
}

/// OAuth 2.0 client backed by `reqwest`
pub struct OAuth2Client {
    config: OAuth2Config,
    client: reqwest::Client,
}

impl OAuth2Client {
    /// Create a new `OAuth2` client with the given configuration
    #[must_use]
    pub fn new(config: OAuth2Config) -> Self {
        Self {
            config,
            client: oauth_client(),
        }
    }

    /// Get the `OAuth2` configuration
    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }
}

#[async_trait]
impl IdentityProvider for OAuth2Client {
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| IdentityError::InvalidConfiguration(format!("auth URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, IdentityError> {
        if code.is_empty() {
            return Err(IdentityError::MissingCode);
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| IdentityError::ExchangeFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Token endpoint rejected authorization code");
            return Err(IdentityError::ExchangeFailed(format!(
                "token endpoint returned {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::ExchangeFailed(format!("invalid token response: {e}")))?;

        Ok(ProviderToken {
            access_token: token.access_token,
            token_type: token.token_type.unwrap_or_else(|| "Bearer".to_owned()),
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    async fn fetch_profile(
        &self,
        token: &ProviderToken,
    ) -> Result<IdentityProfile, IdentityError> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| IdentityError::ProfileFetchFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Profile endpoint rejected access token");
            return Err(IdentityError::ProfileFetchFailed(format!(
                "profile endpoint returned {status}"
            )));
        }

        let info: UserInfoResponse = response.json().await.map_err(|e| {
            IdentityError::ProfileFetchFailed(format!("invalid profile response: {e}"))
        })?;

        IdentityProfile::try_from(info)
    }
}
