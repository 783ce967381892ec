// ABOUTME: Shared, immutable server state handed to every handler and middleware
// ABOUTME: Built once at startup (or per test) and shared behind Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use crate::auth::TokenCodec;
use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::database_plugins::sqlite::SqliteDatabase;
use crate::database_plugins::{AccountStore, LocationStore};
use crate::middleware::admission::AdmissionWindowGate;
use crate::middleware::auth::SessionAuthenticator;
use crate::notifications::WebhookNotifier;
use crate::oauth2_client::{IdentityProvider, OAuth2Client};
use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Centralized resource container for dependency injection
///
/// Nothing in here changes after startup, so handlers never take a lock.
#[derive(Clone)]
pub struct ServerResources {
    /// Session token codec
    pub token_codec: Arc<TokenCodec>,
    /// Identity provider used by the login flow
    pub identity: Arc<dyn IdentityProvider>,
    /// Account lookup and creation
    pub accounts: Arc<dyn AccountStore>,
    /// Team, profile and position storage
    pub locations: Arc<dyn LocationStore>,
    /// Wall clock shared by every time-dependent component
    pub clock: Arc<dyn Clock>,
    /// Session gate for protected routes
    pub session_authenticator: Arc<SessionAuthenticator>,
    /// Time-of-day gate for check-ins
    pub admission_gate: Arc<AdmissionWindowGate>,
    /// Position announcements
    pub notifier: WebhookNotifier,
    /// Whether cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    /// Static asset directory served as the fallback route
    pub static_dir: Option<PathBuf>,
}

impl ServerResources {
    /// Start building resources
    #[must_use]
    pub fn builder() -> ServerResourcesBuilder {
        ServerResourcesBuilder::new()
    }

    /// Wire production resources from configuration and an opened database
    #[must_use]
    pub fn from_config(config: &ServerConfig, database: Arc<SqliteDatabase>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let token_codec = Arc::new(TokenCodec::new(&config.jwt_secret, clock.clone()));
        let accounts: Arc<dyn AccountStore> = database.clone();
        let admission_gate = Arc::new(AdmissionWindowGate::new(
            config.admission_offset,
            clock.clone(),
        ));

        Self {
            session_authenticator: Arc::new(SessionAuthenticator::new(
                token_codec.clone(),
                accounts.clone(),
            )),
            token_codec,
            identity: Arc::new(OAuth2Client::new(config.oauth.clone())),
            accounts,
            locations: database,
            clock,
            admission_gate,
            notifier: WebhookNotifier::new(config.webhook_url.clone()),
            cookie_secure: config.cookie_secure,
            static_dir: Some(config.static_dir.clone()),
        }
    }
}

/// Builder for [`ServerResources`]
pub struct ServerResourcesBuilder {
    jwt_secret: Option<Vec<u8>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    accounts: Option<Arc<dyn AccountStore>>,
    locations: Option<Arc<dyn LocationStore>>,
    clock: Arc<dyn Clock>,
    admission_offset: FixedOffset,
    webhook_url: Option<Url>,
    cookie_secure: bool,
    static_dir: Option<PathBuf>,
}

impl Default for ServerResourcesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerResourcesBuilder {
    /// Builder with the system clock, UTC admission windows and secure cookies
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_secret: None,
            identity: None,
            accounts: None,
            locations: None,
            clock: Arc::new(SystemClock),
            admission_offset: Utc.fix(),
            webhook_url: None,
            cookie_secure: true,
            static_dir: None,
        }
    }

    /// Set the session signing secret
    #[must_use]
    pub fn with_jwt_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    /// Set the identity provider
    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the account store
    #[must_use]
    pub fn with_accounts(mut self, accounts: Arc<dyn AccountStore>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Set the location store
    #[must_use]
    pub fn with_locations(mut self, locations: Arc<dyn LocationStore>) -> Self {
        self.locations = Some(locations);
        self
    }

    /// Set the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the offset used for admission windows
    #[must_use]
    pub const fn with_admission_offset(mut self, offset: FixedOffset) -> Self {
        self.admission_offset = offset;
        self
    }

    /// Set the webhook for position announcements
    #[must_use]
    pub fn with_webhook_url(mut self, url: Option<Url>) -> Self {
        self.webhook_url = url;
        self
    }

    /// Toggle the cookie `Secure` attribute
    #[must_use]
    pub const fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Serve `dir` as the fallback route
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Build the `ServerResources`
    ///
    /// # Errors
    ///
    /// Returns an error if any required fields are missing
    pub fn build(self) -> Result<ServerResources, &'static str> {
        let jwt_secret = self.jwt_secret.ok_or("JWT secret is required")?;
        let identity = self.identity.ok_or("Identity provider is required")?;
        let accounts = self.accounts.ok_or("Account store is required")?;
        let locations = self.locations.ok_or("Location store is required")?;

        let token_codec = Arc::new(TokenCodec::new(&jwt_secret, self.clock.clone()));
        let session_authenticator = Arc::new(SessionAuthenticator::new(
            token_codec.clone(),
            accounts.clone(),
        ));
        let admission_gate = Arc::new(AdmissionWindowGate::new(
            self.admission_offset,
            self.clock.clone(),
        ));

        Ok(ServerResources {
            token_codec,
            identity,
            accounts,
            locations,
            clock: self.clock,
            session_authenticator,
            admission_gate,
            notifier: WebhookNotifier::new(self.webhook_url),
            cookie_secure: self.cookie_secure,
            static_dir: self.static_dir,
        })
    }
}
