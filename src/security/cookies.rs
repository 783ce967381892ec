// ABOUTME: Secure cookie builder and request cookie lookup
// ABOUTME: Session cookies are HttpOnly, Secure and SameSite=Strict; clearing sets a 1970 expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use tenchi_core::constants::cookies::{OAUTH_STATE, OAUTH_STATE_MAX_AGE_SECS, SESSION};
use tenchi_core::constants::session::COOKIE_MAX_AGE_SECS;

const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// `SameSite` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Never sent on cross-site requests
    Strict,
    /// Sent on top-level cross-site navigations
    Lax,
}

impl SameSite {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
        }
    }
}

/// Attributes of a `Set-Cookie` header
#[derive(Debug, Clone)]
pub struct SecureCookieConfig {
    name: String,
    value: String,
    max_age_secs: i64,
    http_only: bool,
    secure: bool,
    same_site: SameSite,
    expired: bool,
}

impl SecureCookieConfig {
    /// `HttpOnly`, `Secure`, `SameSite=Strict`, `Path=/` cookie
    #[must_use]
    pub const fn new(name: String, value: String, max_age_secs: i64) -> Self {
        Self {
            name,
            value,
            max_age_secs,
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            expired: false,
        }
    }

    /// Empty cookie that instructs the client to discard `name`
    #[must_use]
    pub fn removal(name: String) -> Self {
        let mut config = Self::new(name, String::new(), 0);
        config.expired = true;
        config
    }

    /// Toggle the `Secure` attribute (plain-HTTP development only)
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the `SameSite` attribute
    #[must_use]
    pub const fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Render the header value
    #[must_use]
    pub fn build(&self) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}",
            self.name, self.value, self.max_age_secs
        );
        if self.expired {
            cookie.push_str("; Expires=");
            cookie.push_str(EPOCH_EXPIRES);
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.same_site.as_str());
        cookie
    }

    /// Append as a `Set-Cookie` header
    pub fn append_to(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(&self.build()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => {
                tracing::error!(cookie = %self.name, error = %e, "Cookie value is not a valid header");
            }
        }
    }
}

/// Find a cookie by name across every `Cookie` header of a request
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

/// Write the session cookie
pub fn set_session_cookie(headers: &mut HeaderMap, token: &str, secure: bool) {
    SecureCookieConfig::new(SESSION.to_owned(), token.to_owned(), COOKIE_MAX_AGE_SECS)
        .with_secure(secure)
        .append_to(headers);
}

/// Overwrite the session cookie with an already-expired empty value
pub fn clear_session_cookie(headers: &mut HeaderMap, secure: bool) {
    SecureCookieConfig::removal(SESSION.to_owned())
        .with_secure(secure)
        .append_to(headers);
}

/// Write the anti-forgery state cookie
///
/// `SameSite=Lax` so the cookie rides along on the provider's top-level
/// redirect back to the callback.
pub fn set_oauth_state_cookie(headers: &mut HeaderMap, state: &str, secure: bool) {
    SecureCookieConfig::new(
        OAUTH_STATE.to_owned(),
        state.to_owned(),
        OAUTH_STATE_MAX_AGE_SECS,
    )
    .with_secure(secure)
    .with_same_site(SameSite::Lax)
    .append_to(headers);
}

/// Discard the anti-forgery state cookie
pub fn clear_oauth_state_cookie(headers: &mut HeaderMap, secure: bool) {
    SecureCookieConfig::removal(OAUTH_STATE.to_owned())
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .append_to(headers);
}
