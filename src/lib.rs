// ABOUTME: Main library entry point for the Tenchi team geolocation service
// ABOUTME: Google sign-in, stateless cookie sessions and time-window gated position check-ins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

#![deny(unsafe_code)]

//! # Tenchi Geolocation
//!
//! A small service where team members sign in with Google and share the
//! position of their team.
//!
//! ## Request admission
//!
//! - **Sessions**: a signed token in the `jwt` cookie, checked on every
//!   protected request by [`middleware::auth`]. Sessions are stateless; an
//!   account that no longer exists invalidates its tokens.
//! - **Admission windows**: check-ins are only accepted within three minutes
//!   of each half hour, enforced by [`middleware::admission`].
//! - **Login**: the authorization-code flow in [`routes::auth`] creates the
//!   account on first sign-in.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenchi_geolocation::config::ServerConfig;
//! use tenchi_geolocation::database_plugins::sqlite::SqliteDatabase;
//! use tenchi_geolocation::resources::ServerResources;
//! use tenchi_geolocation::routes::build_router;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Arc::new(SqliteDatabase::new(&config.database_url).await?);
//!     database.migrate().await?;
//!
//!     let resources = Arc::new(ServerResources::from_config(&config, database));
//!     let app = build_router(resources);
//!
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// Session token issuance and verification
pub mod auth;

/// Injectable wall clock
pub mod clock;

/// Environment configuration
pub mod config;

/// Account and location storage
pub mod database_plugins;

/// Structured logging setup
pub mod logging;

/// Session, admission and tracing middleware
pub mod middleware;

/// Position announcements to a chat webhook
pub mod notifications;

/// Google `OAuth2` identity exchange
pub mod oauth2_client;

/// Shared server state
pub mod resources;

/// HTTP routes
pub mod routes;

/// Cookie and anti-forgery helpers
pub mod security;

/// HTTP client construction
pub mod utils;

pub use tenchi_core::{constants, errors, models};
