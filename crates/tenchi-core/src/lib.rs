// ABOUTME: Core types and constants for the Tenchi team geolocation service
// ABOUTME: Foundation crate with error handling, shared constants, and persisted record models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

#![deny(unsafe_code)]

//! # Tenchi Core
//!
//! Foundation crate providing shared types and constants for the Tenchi
//! geolocation service. It holds nothing that talks to the network or the
//! database, so it changes rarely and keeps rebuilds of the server crate cheap.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Account, team and geolocation records plus the identity profile

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Persisted records and transient identity types
pub mod models;
