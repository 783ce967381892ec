// ABOUTME: Route handlers for team details and team renaming
// ABOUTME: Team names are unique; a clashing rename answers 409
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use crate::database_plugins::DatabaseError;
use crate::middleware::AuthenticatedUser;
use crate::resources::ServerResources;
use crate::routes::users::RenameRequest;
use crate::routes::{validate_name, ApiJson, ApiPath};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tenchi_core::errors::{AppError, ErrorCode};

/// Team routes
pub struct TeamRoutes;

impl TeamRoutes {
    /// Create all team routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/team/:id", get(Self::handle_get))
            .route("/api/team/:id", post(Self::handle_rename))
            .with_state(resources)
    }

    /// Handle GET /api/team/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        ApiPath(id): ApiPath<i64>,
    ) -> Result<Response, AppError> {
        let detail = resources
            .locations
            .get_team_detail(id)
            .await
            .map_err(|e| AppError::database(format!("Failed to load team: {e}")))?
            .ok_or_else(|| AppError::not_found(format!("Team {id}")))?;

        Ok((StatusCode::OK, Json(detail)).into_response())
    }

    /// Handle POST /api/team/:id
    async fn handle_rename(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
        ApiPath(id): ApiPath<i64>,
        ApiJson(body): ApiJson<RenameRequest>,
    ) -> Result<Response, AppError> {
        let name = validate_name(&body.name)?;

        let team = resources
            .locations
            .rename_team(id, name)
            .await
            .map_err(|e| match e.downcast_ref::<DatabaseError>() {
                Some(DatabaseError::Conflict { .. }) => AppError::new(
                    ErrorCode::ResourceAlreadyExists,
                    format!("Team name {name:?} is already taken"),
                ),
                None => AppError::database(format!("Failed to rename team: {e}")),
            })?
            .ok_or_else(|| AppError::not_found(format!("Team {id}")))?;

        tracing::info!(subject = %user.subject, team_id = id, "Team renamed");
        Ok((StatusCode::OK, Json(team)).into_response())
    }
}
