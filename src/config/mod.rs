// ABOUTME: Configuration module for the server binary
// ABOUTME: Environment-only configuration parsed once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! Environment-based configuration

/// Environment variable parsing and validation
pub mod environment;

pub use environment::{ConfigError, ServerConfig};
