// ABOUTME: Storage abstraction consumed by the session gate, the login flow and the data routes
// ABOUTME: AccountStore answers "does this subject exist"; LocationStore covers teams and positions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use anyhow::Result;
use async_trait::async_trait;
use tenchi_core::models::{Geolocation, GeolocationDetail, Team, TeamDetail, User, UserDetail, UserProfile};
use thiserror::Error;

/// SQLite implementation
pub mod sqlite;

/// Store-level failures that callers distinguish from plain I/O errors
///
/// Returned inside `anyhow::Error`; recover with `downcast_ref`.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A unique constraint rejected the write
    #[error("{entity} named {name:?} already exists")]
    Conflict {
        /// Kind of record
        entity: &'static str,
        /// Conflicting value
        name: String,
    },
}

/// Account lookup and creation
///
/// Account existence is what keeps a session valid: deleting the account
/// revokes every outstanding token for its subject.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Whether an account exists for `subject`
    async fn exists(&self, subject: &str) -> Result<bool>;

    /// Load the account for `subject`
    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>>;

    /// Create the account and its default profile atomically
    async fn create(&self, subject: &str, email: &str, picture_url: Option<&str>) -> Result<User>;
}

/// Team, profile and position queries behind the data routes
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Profile of `subject` joined with its team
    async fn get_user_detail(&self, subject: &str) -> Result<Option<UserDetail>>;

    /// Team with all of its members
    async fn get_team_detail(&self, team_id: i64) -> Result<Option<TeamDetail>>;

    /// Change a display name; `None` if the profile does not exist
    async fn rename_user(&self, subject: &str, name: &str) -> Result<Option<UserProfile>>;

    /// Change a team name; `None` if the team does not exist
    ///
    /// Fails with [`DatabaseError::Conflict`] if another team holds the name.
    async fn rename_team(&self, team_id: i64, name: &str) -> Result<Option<Team>>;

    /// Record a position for `subject`
    async fn add_geolocation(&self, subject: &str, latitude: f64, longitude: f64)
        -> Result<Geolocation>;

    /// Most recent position of every team that has one, ordered by team id
    async fn latest_geolocations(&self) -> Result<Vec<GeolocationDetail>>;
}
