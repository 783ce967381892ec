// ABOUTME: Route handlers for reading team positions and checking in a new one
// ABOUTME: Check-ins pass the admission window gate and announce themselves on the webhook
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use crate::middleware::{require_admission_window, AuthenticatedUser};
use crate::resources::ServerResources;
use crate::routes::ApiJson;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tenchi_core::errors::AppError;

/// Body of `POST /api/geo`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckInRequest {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl CheckInRequest {
    /// Reject coordinates outside the valid ranges
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error naming the offending coordinate
    pub fn validate(&self) -> Result<(), AppError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::invalid_input(
                "Latitude must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::invalid_input(
                "Longitude must be between -180 and 180",
            ));
        }
        Ok(())
    }
}

/// Geolocation routes
pub struct GeoRoutes;

impl GeoRoutes {
    /// Create all geolocation routes
    ///
    /// Only the check-in is admission gated; reading positions is always open
    /// to signed-in users.
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        let gate = resources.admission_gate.clone();

        Router::new()
            .route("/api/geo", get(Self::handle_list))
            .route(
                "/api/geo",
                post(Self::handle_check_in).route_layer(middleware::from_fn_with_state(
                    gate,
                    require_admission_window,
                )),
            )
            .with_state(resources)
    }

    /// Handle GET /api/geo
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let latest = resources
            .locations
            .latest_geolocations()
            .await
            .map_err(|e| AppError::database(format!("Failed to load positions: {e}")))?;

        Ok((StatusCode::OK, Json(latest)).into_response())
    }

    /// Handle POST /api/geo
    async fn handle_check_in(
        State(resources): State<Arc<ServerResources>>,
        Extension(user): Extension<AuthenticatedUser>,
        ApiJson(body): ApiJson<CheckInRequest>,
    ) -> Result<Response, AppError> {
        body.validate()?;

        let geolocation = resources
            .locations
            .add_geolocation(&user.subject, body.latitude, body.longitude)
            .await
            .map_err(|e| AppError::database(format!("Failed to record position: {e}")))?;

        tracing::info!(subject = %user.subject, geolocation_id = geolocation.id, "Position recorded");

        if resources.notifier.is_enabled() {
            match resources.locations.get_user_detail(&user.subject).await {
                Ok(Some(detail)) => {
                    resources
                        .notifier
                        .notify_geolocation_update(&detail, &geolocation);
                }
                Ok(None) => {
                    tracing::warn!(subject = %user.subject, "No profile to announce position for");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping position announcement");
                }
            }
        }

        Ok((StatusCode::CREATED, Json(geolocation)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ranges_are_inclusive() {
        assert!(CheckInRequest { latitude: 90.0, longitude: -180.0 }.validate().is_ok());
        assert!(CheckInRequest { latitude: -90.0, longitude: 180.0 }.validate().is_ok());
        assert!(CheckInRequest { latitude: 90.5, longitude: 0.0 }.validate().is_err());
        assert!(CheckInRequest { latitude: 0.0, longitude: -180.1 }.validate().is_err());
        assert!(CheckInRequest { latitude: f64::NAN, longitude: 0.0 }.validate().is_err());
    }
}
