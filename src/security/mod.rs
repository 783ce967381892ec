// ABOUTME: Security utilities for the browser-facing auth flow
// ABOUTME: Cookie construction and parsing plus the per-login anti-forgery state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

/// Secure cookie helpers
pub mod cookies;

/// Anti-forgery state for the OAuth redirect round trip
pub mod oauth_state;
