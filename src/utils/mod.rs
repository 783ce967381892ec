// ABOUTME: Small shared helpers used across the server crate
// ABOUTME: Currently the outbound HTTP client factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

/// Outbound HTTP clients with per-purpose timeouts
pub mod http_client;
