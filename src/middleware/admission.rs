// ABOUTME: Time-of-day admission gate for check-in requests
// ABOUTME: Admits only within three minutes of one of the 48 half-hour marks of the day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! # Admission Windows
//!
//! A day has 48 allowed instants (`00:00`, `00:30`, ... `23:30`). A request is
//! admitted when the local time-of-day, at minute resolution, lies within
//! three minutes either side of any of them. Windows are evaluated on the
//! plain minute-of-day number and do not wrap around midnight, so `00:00`
//! covers `00:00..=00:03` but not `23:57..=23:59`.

use crate::clock::Clock;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::sync::Arc;
use tenchi_core::constants::admission::{MARK_COUNT, MARK_INTERVAL_MINUTES, TOLERANCE_MINUTES};
use tenchi_core::errors::{AppError, ErrorCode};
use thiserror::Error;

/// Refusal from the admission gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionRejection {
    /// Local time is not near any allowed instant
    #[error("{local_time} is outside every admission window")]
    OutsideWindow {
        /// Local `HH:MM` that was evaluated
        local_time: String,
    },
}

impl AdmissionRejection {
    /// Stable machine-readable reason
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::OutsideWindow { .. } => "OutsideWindow",
        }
    }
}

impl From<AdmissionRejection> for AppError {
    fn from(rejection: AdmissionRejection) -> Self {
        Self::new(ErrorCode::OutsideWindow, rejection.to_string()).with_reason(rejection.reason())
    }
}

/// Allowed instants as minutes since local midnight
pub fn allowed_instants() -> impl Iterator<Item = i32> {
    (0..MARK_COUNT).map(|mark| mark * MARK_INTERVAL_MINUTES)
}

/// Whether `hour:minute` falls inside any admission window
#[must_use]
pub fn admits(hour: u32, minute: u32) -> bool {
    let Ok(now_minutes) = i32::try_from(hour * 60 + minute) else {
        return false;
    };
    allowed_instants().any(|mark| {
        (mark - TOLERANCE_MINUTES..=mark + TOLERANCE_MINUTES).contains(&now_minutes)
    })
}

/// Gate evaluating the clock in a fixed UTC offset
pub struct AdmissionWindowGate {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl AdmissionWindowGate {
    /// Create a gate for the given local offset
    #[must_use]
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    /// Evaluate the gate at `instant`; the date part is ignored
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionRejection::OutsideWindow`] when no window contains
    /// the local time
    pub fn check_at(&self, instant: DateTime<Utc>) -> Result<(), AdmissionRejection> {
        let local = instant.with_timezone(&self.offset);
        if admits(local.hour(), local.minute()) {
            Ok(())
        } else {
            Err(AdmissionRejection::OutsideWindow {
                local_time: local.format("%H:%M").to_string(),
            })
        }
    }

    /// Evaluate the gate now
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionRejection::OutsideWindow`] when no window contains
    /// the current local time
    pub fn check(&self) -> Result<(), AdmissionRejection> {
        self.check_at(self.clock.now())
    }
}

/// Axum middleware refusing requests outside the admission windows with 403
pub async fn require_admission_window(
    State(gate): State<Arc<AdmissionWindowGate>>,
    req: Request,
    next: Next,
) -> Response {
    match gate.check() {
        Ok(()) => next.run(req).await,
        Err(rejection) => {
            tracing::debug!(reason = rejection.reason(), %rejection, "Admission refused");
            AppError::from(rejection).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    #[test]
    fn test_marks_cover_the_day() {
        let marks: Vec<i32> = allowed_instants().collect();
        assert_eq!(marks.len(), 48);
        assert_eq!(marks[0], 0);
        assert_eq!(marks[1], 30);
        assert_eq!(marks[47], 23 * 60 + 30);
    }

    #[test]
    fn test_window_edges() {
        assert!(admits(8, 0));
        assert!(admits(8, 3));
        assert!(!admits(8, 4));
        assert!(admits(7, 57));
        assert!(!admits(7, 56));
        assert!(admits(0, 0));
        assert!(admits(0, 3));
        assert!(admits(23, 33));
        assert!(!admits(23, 34));
        assert!(!admits(23, 57));
        assert!(!admits(23, 59));
    }

    #[test]
    fn test_gate_applies_offset() {
        // 23:00 UTC is 08:00 at +09:00
        let instant = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(instant));
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert!(AdmissionWindowGate::new(tokyo, clock.clone()).check().is_ok());

        clock.set(Utc.with_ymd_and_hms(2025, 3, 1, 23, 10, 0).unwrap());
        let rejection = AdmissionWindowGate::new(tokyo, clock).check().unwrap_err();
        assert_eq!(
            rejection,
            AdmissionRejection::OutsideWindow {
                local_time: "08:10".to_owned()
            }
        );
    }
}
