// ABOUTME: Persisted records for accounts, teams and geolocations plus the identity profile
// ABOUTME: Plain serde data types shared between the store, the routes and the auth flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! # Data Models
//!
//! Records are keyed by the identity provider's stable subject, so an
//! account's `id` and its profile's `id` are both the subject string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account record; its existence is what keeps a session valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Subject issued by the identity provider
    pub id: String,
    /// Email reported at first login
    pub email: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Display profile attached to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Subject of the owning account
    pub id: String,
    /// Display name
    pub user_name: String,
    /// Team membership
    pub team_id: i64,
    /// Avatar picture from the identity provider
    pub avatar_url: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// A team of users sharing a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier
    pub id: i64,
    /// Unique team name
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// One recorded position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    /// Row identifier
    pub id: i64,
    /// Subject of the reporting user
    pub user_id: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Time the fix was recorded
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Profile joined with its team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    /// Display profile
    pub user_profile: UserProfile,
    /// Team the user belongs to
    pub team: Team,
}

/// Team joined with its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDetail {
    /// The team
    pub team: Team,
    /// Profiles of every member
    pub members: Vec<UserProfile>,
}

/// Latest position reported by any member of a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeolocationDetail {
    /// Team and members
    pub team_detail: TeamDetail,
    /// Most recent fix across the team
    pub geolocation: Geolocation,
}

/// Authenticated user as reported by the identity provider
///
/// Transient: produced once per login and consumed immediately to decide
/// whether an account must be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    /// Stable external identity key
    pub subject: String,
    /// Verified email
    pub email: String,
    /// Avatar picture, when the provider shares one
    pub picture_url: Option<String>,
}
