// ABOUTME: Outbound HTTP client factory with per-purpose timeout configuration
// ABOUTME: Identity provider calls and webhook deliveries each get their own tuned client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tenchi_core::constants::timeouts::{
    OAUTH_CLIENT_CONNECT_TIMEOUT_SECS, OAUTH_CLIENT_TIMEOUT_SECS,
    WEBHOOK_CLIENT_CONNECT_TIMEOUT_SECS, WEBHOOK_CLIENT_TIMEOUT_SECS,
};

/// Create a new HTTP client with custom timeout settings
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Client for token exchange and profile fetches
///
/// These are single round trips that should complete quickly.
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(OAUTH_CLIENT_TIMEOUT_SECS, OAUTH_CLIENT_CONNECT_TIMEOUT_SECS)
}

/// Client for fire-and-forget webhook posts
#[must_use]
pub fn webhook_client() -> Client {
    create_client_with_timeout(
        WEBHOOK_CLIENT_TIMEOUT_SECS,
        WEBHOOK_CLIENT_CONNECT_TIMEOUT_SECS,
    )
}
