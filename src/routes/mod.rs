// ABOUTME: Route module organization and top-level router assembly
// ABOUTME: Composes public auth routes, session-protected data routes, static files and tracing layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! Route module for the Tenchi geolocation server
//!
//! Each domain module exposes a `XRoutes::routes(resources)` constructor.
//! [`build_router`] merges them and decides which middleware guards what:
//!
//! | Route | Gates |
//! |---|---|
//! | `/api/login`, `/api/callback`, `/api/logout` | none |
//! | `/api/user/*`, `/api/team/*`, `GET /api/geo` | session |
//! | `POST /api/geo` | session, then admission window |

/// Login, callback and logout routes
pub mod auth;
/// Extractors with uniform rejections
pub mod extract;
/// Position routes
pub mod geo;
/// Team routes
pub mod teams;
/// User routes
pub mod users;

pub use auth::{AuthFlowController, AuthFlowError, AuthRoutes, CallbackParams};
pub use extract::{ApiJson, ApiPath};
pub use geo::GeoRoutes;
pub use teams::TeamRoutes;
pub use users::UserRoutes;

use crate::middleware::tracing::{propagate_request_id_layer, set_request_id_layer};
use crate::middleware::{make_request_span, require_session};
use crate::resources::ServerResources;
use axum::{middleware, Router};
use std::sync::Arc;
use tenchi_core::constants::accounts::MAX_NAME_LENGTH;
use tenchi_core::errors::AppError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    // route_layer so unknown paths reach the fallback instead of answering 401
    let protected = Router::new()
        .merge(UserRoutes::routes(resources.clone()))
        .merge(TeamRoutes::routes(resources.clone()))
        .merge(GeoRoutes::routes(resources.clone()))
        .route_layer(middleware::from_fn_with_state(
            resources.session_authenticator.clone(),
            require_session,
        ));

    let mut router = Router::new()
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(protected);

    if let Some(dir) = &resources.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

/// Trim a user-supplied display or team name and check its length
///
/// # Errors
///
/// Returns an invalid-input error if the name is blank or too long
pub fn validate_name(raw: &str) -> Result<&str, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("Name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}
