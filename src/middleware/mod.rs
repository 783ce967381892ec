// ABOUTME: HTTP middleware for session authentication, admission windows and request tracing
// ABOUTME: Each gate is an axum from_fn middleware with its own shared state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

/// Session cookie authentication
pub mod auth;
/// Time-of-day admission gate
pub mod admission;
/// Request spans and ids
pub mod tracing;

pub use admission::{require_admission_window, AdmissionRejection, AdmissionWindowGate};
pub use auth::{require_session, AuthenticatedUser, SessionAuthenticator, SessionRejection};
pub use tracing::{create_request_span, make_request_span};
