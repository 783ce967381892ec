// ABOUTME: Route handlers for the signed-in user's profile and other users' details
// ABOUTME: Every route here sits behind the session middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use crate::middleware::AuthenticatedUser;
use crate::resources::ServerResources;
use crate::routes::{validate_name, ApiJson, ApiPath};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tenchi_core::errors::AppError;
use tenchi_core::models::{Team, UserProfile};

/// Body of `GET /api/user/me`
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    /// Caller's profile
    pub user_profile: UserProfile,
    /// Caller's team
    pub team: Team,
    /// Everyone on the caller's team, the caller included
    pub team_members: Vec<UserProfile>,
}

/// Rename request shared by users and teams
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// Requested name
    pub name: String,
}

/// User routes
pub struct UserRoutes;

impl UserRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/user/me", get(Self::handle_me))
            .route("/api/user/me/name", post(Self::handle_rename))
            .route("/api/user/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle GET /api/user/me
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
    ) -> Result<Response, AppError> {
        let detail = resources
            .locations
            .get_user_detail(&user.subject)
            .await
            .map_err(|e| AppError::database(format!("Failed to load profile: {e}")))?
            .ok_or_else(|| AppError::not_found("User profile"))?;

        let team_members = resources
            .locations
            .get_team_detail(detail.team.id)
            .await
            .map_err(|e| AppError::database(format!("Failed to load team: {e}")))?
            .map(|team| team.members)
            .unwrap_or_default();

        let response = CurrentUserResponse {
            user_profile: detail.user_profile,
            team: detail.team,
            team_members,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/user/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        ApiPath(id): ApiPath<String>,
    ) -> Result<Response, AppError> {
        let detail = resources
            .locations
            .get_user_detail(&id)
            .await
            .map_err(|e| AppError::database(format!("Failed to load user: {e}")))?
            .ok_or_else(|| AppError::not_found(format!("User {id}")))?;

        Ok((StatusCode::OK, Json(detail)).into_response())
    }

    /// Handle POST /api/user/me/name
    async fn handle_rename(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
        ApiJson(body): ApiJson<RenameRequest>,
    ) -> Result<Response, AppError> {
        let name = validate_name(&body.name)?;

        resources
            .locations
            .rename_user(&user.subject, name)
            .await
            .map_err(|e| AppError::database(format!("Failed to rename user: {e}")))?
            .ok_or_else(|| AppError::not_found("User profile"))?;

        let detail = resources
            .locations
            .get_user_detail(&user.subject)
            .await
            .map_err(|e| AppError::database(format!("Failed to load user: {e}")))?
            .ok_or_else(|| AppError::not_found("User profile"))?;

        tracing::info!(subject = %user.subject, "User renamed");
        Ok((StatusCode::OK, Json(detail)).into_response())
    }
}
