// ABOUTME: OAuth 2.0 client for signing users in through Google
// ABOUTME: Authorization URL construction, code exchange and profile fetch behind a trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! # OAuth 2.0 Client Module
//!
//! The service acts as an OAuth 2.0 client of Google to authenticate users.
//! This module handles:
//! - authorization URL construction with a caller-supplied anti-forgery state
//! - the authorization-code-to-token exchange
//! - fetching the signed-in user's profile
//!
//! The [`IdentityProvider`] trait is the seam the login callback depends on,
//! so the callback can run against a scripted provider in tests.

/// Core OAuth 2.0 client implementation
pub mod client;

pub use client::{
    IdentityError, IdentityProvider, OAuth2Client, OAuth2Config, ProviderToken, UserInfoResponse,
};
