// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted identity provider, a counting account store and a wired test server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `tenchi_geolocation`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tenchi_geolocation::{
    clock::FixedClock,
    database_plugins::{sqlite::SqliteDatabase, AccountStore},
    models::{IdentityProfile, User},
    oauth2_client::{IdentityError, IdentityProvider, ProviderToken},
    resources::ServerResources,
    routes::build_router,
};
use url::Url;

static INIT_LOGGER: Once = Once::new();

/// Secret shared by every test server
pub const TEST_SECRET: &[u8] = b"tenchi-integration-test-secret-0123456789";

/// 2023-11-14 22:00:00 UTC, on a half-hour mark
pub const ADMITTED_AT: i64 = 1_699_999_200;

/// 2023-11-14 22:13:20 UTC, between admission windows
pub const CLOSED_AT: i64 = 1_700_000_000;

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fresh migrated in-memory database
pub async fn create_test_database() -> Arc<SqliteDatabase> {
    init_test_logging();
    let database = SqliteDatabase::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    database.migrate().await.expect("Failed to migrate");
    Arc::new(database)
}

/// Profile returned by the scripted provider unless told otherwise
pub fn default_profile() -> IdentityProfile {
    IdentityProfile {
        subject: "google-sub-1001".to_owned(),
        email: "ayaka@example.com".to_owned(),
        picture_url: Some("https://lh3.example.com/ayaka.png".to_owned()),
    }
}

/// Identity provider with canned answers that records how it was used
pub struct ScriptedIdentityProvider {
    exchange: Result<ProviderToken, IdentityError>,
    profile: Result<IdentityProfile, IdentityError>,
    pub exchange_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub last_code: Mutex<Option<String>>,
}

impl ScriptedIdentityProvider {
    /// Provider that signs in `profile`
    pub fn new(profile: IdentityProfile) -> Self {
        Self {
            exchange: Ok(ProviderToken::bearer("provider-access-token")),
            profile: Ok(profile),
            exchange_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            last_code: Mutex::new(None),
        }
    }

    /// Provider whose code exchange fails
    pub fn failing_exchange(error: IdentityError) -> Self {
        Self {
            exchange: Err(error),
            ..Self::new(default_profile())
        }
    }

    /// Provider whose profile fetch fails
    pub fn failing_profile(error: IdentityError) -> Self {
        Self {
            profile: Err(error),
            ..Self::new(default_profile())
        }
    }

    pub fn calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst) + self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError> {
        Ok(format!("https://accounts.example.test/o/oauth2/auth?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, IdentityError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code.lock().unwrap() = Some(code.to_owned());
        self.exchange.clone()
    }

    async fn fetch_profile(
        &self,
        _token: &ProviderToken,
    ) -> Result<IdentityProfile, IdentityError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile.clone()
    }
}

/// Account store wrapper that counts calls and can be told to fail
pub struct CountingAccountStore {
    inner: Arc<SqliteDatabase>,
    pub exists_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub fail_lookups: AtomicBool,
    pub fail_creates: AtomicBool,
    /// Answer "not found" from `exists` even when the account is stored
    pub report_missing: AtomicBool,
}

impl CountingAccountStore {
    pub fn new(inner: Arc<SqliteDatabase>) -> Self {
        Self {
            inner,
            exists_calls: AtomicUsize::new(0),
            find_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            fail_lookups: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
            report_missing: AtomicBool::new(false),
        }
    }

    /// Total calls of every kind
    pub fn calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
            + self.find_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStore for CountingAccountStore {
    async fn exists(&self, subject: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("account store unavailable"));
        }
        if self.report_missing.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.exists(subject).await
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("account store unavailable"));
        }
        self.inner.find_by_subject(subject).await
    }

    async fn create(&self, subject: &str, email: &str, picture_url: Option<&str>) -> Result<User> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(anyhow!("account store is read-only"));
        }
        self.inner.create(subject, email, picture_url).await
    }
}

/// A fully wired server over an in-memory database and a fixed clock
pub struct TestContext {
    pub database: Arc<SqliteDatabase>,
    pub accounts: Arc<CountingAccountStore>,
    pub identity: Arc<ScriptedIdentityProvider>,
    pub clock: Arc<FixedClock>,
    pub resources: Arc<ServerResources>,
}

impl TestContext {
    /// Server signing in [`default_profile`], clock inside an admission window
    pub async fn new() -> Self {
        Self::with_options(ScriptedIdentityProvider::new(default_profile()), None).await
    }

    /// Server using a specific identity provider
    pub async fn with_identity(identity: ScriptedIdentityProvider) -> Self {
        Self::with_options(identity, None).await
    }

    /// Server announcing positions to `webhook_url`
    pub async fn with_webhook(webhook_url: Url) -> Self {
        Self::with_options(
            ScriptedIdentityProvider::new(default_profile()),
            Some(webhook_url),
        )
        .await
    }

    async fn with_options(identity: ScriptedIdentityProvider, webhook_url: Option<Url>) -> Self {
        let database = create_test_database().await;
        let accounts = Arc::new(CountingAccountStore::new(database.clone()));
        let identity = Arc::new(identity);
        let clock = Arc::new(FixedClock::from_timestamp(ADMITTED_AT));

        let resources = ServerResources::builder()
            .with_jwt_secret(TEST_SECRET)
            .with_identity(identity.clone())
            .with_accounts(accounts.clone())
            .with_locations(database.clone())
            .with_clock(clock.clone())
            .with_webhook_url(webhook_url)
            .build()
            .expect("Failed to build test resources");

        Self {
            database,
            accounts,
            identity,
            clock,
            resources: Arc::new(resources),
        }
    }

    /// Router under test
    pub fn router(&self) -> Router {
        build_router(self.resources.clone())
    }

    /// Create an account directly and return a session token for it
    pub async fn sign_up(&self, subject: &str) -> String {
        self.database
            .create(subject, &format!("{subject}@example.com"), None)
            .await
            .expect("Failed to create account");
        self.token_for(subject)
    }

    /// Session token for `subject` whether or not an account exists
    pub fn token_for(&self, subject: &str) -> String {
        self.resources
            .token_codec
            .issue(subject)
            .expect("Failed to issue token")
    }
}
