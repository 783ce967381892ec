// ABOUTME: Environment configuration for the server: secrets, OAuth client, storage and network
// ABOUTME: Parsing fails fast with a typed error so the binary exits before binding a port
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! Environment-based configuration management

use crate::oauth2_client::OAuth2Config;
use chrono::{FixedOffset, Local, Offset};
use std::env;
use std::fmt;
use std::path::PathBuf;
use tenchi_core::constants::network::{DEFAULT_DATABASE_URL, DEFAULT_HTTP_PORT, DEFAULT_STATIC_DIR};
use tenchi_core::constants::session::SECRET_MIN_LENGTH;
use tenchi_core::errors::AppError;
use thiserror::Error;
use url::Url;

/// Configuration problems detected at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    /// A variable is set but unusable
    #[error("environment variable {key} is invalid: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string()).with_source(error)
    }
}

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// `SQLite` connection URL
    pub database_url: String,
    /// Directory served as the fallback route
    pub static_dir: PathBuf,
    /// HMAC secret for session tokens
    pub jwt_secret: Vec<u8>,
    /// Identity provider client settings
    pub oauth: OAuth2Config,
    /// Chat webhook for position announcements
    pub webhook_url: Option<Url>,
    /// Offset in which admission windows are evaluated
    pub admission_offset: FixedOffset,
    /// Whether cookies carry the `Secure` attribute
    pub cookie_secure: bool,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_port", &self.http_port)
            .field("database_url", &self.database_url)
            .field("static_dir", &self.static_dir)
            .field("jwt_secret", &"[REDACTED]")
            .field("oauth", &self.oauth)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[SET]"))
            .field("admission_offset", &self.admission_offset)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails validation
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails validation
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let jwt_secret = required("JWT_SECRET")?.into_bytes();
        if jwt_secret.len() < SECRET_MIN_LENGTH {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {SECRET_MIN_LENGTH} bytes"),
            });
        }

        let redirect_uri = required("GOOGLE_REDIRECT_URL")?;
        parse_http_url("GOOGLE_REDIRECT_URL", &redirect_uri)?;

        let mut oauth = OAuth2Config::google(
            required("GOOGLE_CLIENT_ID")?,
            required("GOOGLE_CLIENT_SECRET")?,
            redirect_uri,
        );
        if let Some(url) = var("GOOGLE_AUTH_URL") {
            parse_http_url("GOOGLE_AUTH_URL", &url)?;
            oauth.auth_url = url;
        }
        if let Some(url) = var("GOOGLE_TOKEN_URL") {
            parse_http_url("GOOGLE_TOKEN_URL", &url)?;
            oauth.token_url = url;
        }
        if let Some(url) = var("GOOGLE_USERINFO_URL") {
            parse_http_url("GOOGLE_USERINFO_URL", &url)?;
            oauth.userinfo_url = url;
        }

        let http_port = match var("HTTP_PORT") {
            Some(port) => port.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "HTTP_PORT",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        let webhook_url = var("WEBHOOK_URL")
            .map(|url| parse_http_url("WEBHOOK_URL", &url))
            .transpose()?;

        let admission_offset = match var("ADMISSION_UTC_OFFSET") {
            Some(offset) => parse_utc_offset(&offset).ok_or_else(|| ConfigError::Invalid {
                key: "ADMISSION_UTC_OFFSET",
                reason: format!("expected an offset like +09:00, got {offset:?}"),
            })?,
            None => Local::now().offset().fix(),
        };

        let cookie_secure = match var("COOKIE_SECURE") {
            Some(flag) => parse_bool(&flag).ok_or_else(|| ConfigError::Invalid {
                key: "COOKIE_SECURE",
                reason: format!("expected true or false, got {flag:?}"),
            })?,
            None => true,
        };

        Ok(Self {
            http_port,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            static_dir: PathBuf::from(
                var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned()),
            ),
            jwt_secret,
            oauth,
            webhook_url,
            admission_offset,
            cookie_secure,
        })
    }
}

fn parse_http_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::Invalid {
            key,
            reason: format!("scheme must be http or https, got {scheme}"),
        }),
    }
}

/// Parse `Z`, `UTC`, or a signed `HH:MM` offset
fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
