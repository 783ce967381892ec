// ABOUTME: SQLite-backed account and location store built on a sqlx connection pool
// ABOUTME: Creates the schema on startup and seeds the default "No team assigned" team
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! SQLite database implementation
//!
//! Implements [`AccountStore`] and [`LocationStore`] on a `sqlx` pool.
//! Timestamps are stored as RFC 3339 text. A `sqlite::memory:` URL keeps a
//! single pooled connection alive so every query sees the same database.

use super::{AccountStore, DatabaseError, LocationStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tenchi_core::constants::accounts::{DEFAULT_TEAM_ID, DEFAULT_TEAM_NAME, DEFAULT_USER_NAME};
use tenchi_core::constants::timeouts::DATABASE_TIMEOUT_SECS;
use tenchi_core::models::{
    Geolocation, GeolocationDetail, Team, TeamDetail, User, UserDetail, UserProfile,
};

/// SQLite database implementation
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: Pool<Sqlite>,
}

impl SqliteDatabase {
    /// Open (creating if missing) the database at `database_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the database cannot be opened
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(DATABASE_TIMEOUT_SECS));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        Ok(Self { pool })
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create tables if absent and seed the default team
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                user_name TEXT NOT NULL,
                team_id INTEGER NOT NULL REFERENCES teams(id),
                avatar_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS geolocations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_profiles_team ON user_profiles(team_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_geolocations_user ON geolocations(user_id)")
            .execute(&self.pool)
            .await?;

        let now = Utc::now();
        sqlx::query(
            "INSERT OR IGNORE INTO teams (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(DEFAULT_TEAM_ID)
        .bind(DEFAULT_TEAM_NAME)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Administrative operations
///
/// No HTTP route reaches these. Teams are seeded and users moved between
/// them by an operator with direct database access, and deleting an account
/// is how its sessions are revoked. They are the write paths the stores
/// assume exist, and the integration tests use them to stage fixtures.
impl SqliteDatabase {
    /// Insert a team with an explicit id
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Conflict`] if the name is taken, or the
    /// underlying error if the insert fails
    pub async fn create_team(&self, team_id: i64, name: &str) -> Result<Team> {
        let now = Utc::now();
        sqlx::query("INSERT INTO teams (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(team_id)
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "team", name))?;

        Ok(Team {
            id: team_id,
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Move a user to another team; false if `subject` has no profile
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails, including when `team_id` names
    /// no team
    pub async fn assign_team(&self, subject: &str, team_id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE user_profiles SET team_id = ?, updated_at = ? WHERE id = ?")
                .bind(team_id)
                .bind(Utc::now())
                .bind(subject)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an account; its sessions stop validating immediately
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_user(&self, subject: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(subject)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl SqliteDatabase {
    async fn get_team(&self, team_id: i64) -> Result<Option<Team>> {
        let row = sqlx::query("SELECT id, name, created_at, updated_at FROM teams WHERE id = ?")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn get_profile(&self, subject: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT id, user_name, team_id, avatar_url, created_at, updated_at
            FROM user_profiles WHERE id = ?
            ",
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn get_members(&self, team_id: i64) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_name, team_id, avatar_url, created_at, updated_at
            FROM user_profiles WHERE team_id = ? ORDER BY user_name, id
            ",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_profile).collect()
    }
}

#[async_trait]
impl AccountStore for SqliteDatabase {
    async fn exists(&self, subject: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at, updated_at FROM users WHERE id = ?")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, subject: &str, email: &str, picture_url: Option<&str>) -> Result<User> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (id, email, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(subject)
            .bind(email)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "user", subject))?;

        sqlx::query(
            r"
            INSERT INTO user_profiles (id, user_name, team_id, avatar_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(subject)
        .bind(DEFAULT_USER_NAME)
        .bind(DEFAULT_TEAM_ID)
        .bind(picture_url)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(User {
            id: subject.to_owned(),
            email: email.to_owned(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[async_trait]
impl LocationStore for SqliteDatabase {
    async fn get_user_detail(&self, subject: &str) -> Result<Option<UserDetail>> {
        let Some(user_profile) = self.get_profile(subject).await? else {
            return Ok(None);
        };
        let team = self
            .get_team(user_profile.team_id)
            .await?
            .with_context(|| format!("Team {} of user {subject} is missing", user_profile.team_id))?;

        Ok(Some(UserDetail { user_profile, team }))
    }

    async fn get_team_detail(&self, team_id: i64) -> Result<Option<TeamDetail>> {
        let Some(team) = self.get_team(team_id).await? else {
            return Ok(None);
        };
        let members = self.get_members(team_id).await?;

        Ok(Some(TeamDetail { team, members }))
    }

    async fn rename_user(&self, subject: &str, name: &str) -> Result<Option<UserProfile>> {
        let result =
            sqlx::query("UPDATE user_profiles SET user_name = ?, updated_at = ? WHERE id = ?")
                .bind(name)
                .bind(Utc::now())
                .bind(subject)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_profile(subject).await
    }

    async fn rename_team(&self, team_id: i64, name: &str) -> Result<Option<Team>> {
        let result = sqlx::query("UPDATE teams SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "team", name))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_team(team_id).await
    }

    async fn add_geolocation(
        &self,
        subject: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Geolocation> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO geolocations (user_id, latitude, longitude, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(subject)
        .bind(latitude)
        .bind(longitude)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Geolocation {
            id: result.last_insert_rowid(),
            user_id: subject.to_owned(),
            latitude,
            longitude,
            created_at: now,
            updated_at: now,
        })
    }

    async fn latest_geolocations(&self) -> Result<Vec<GeolocationDetail>> {
        let rows = sqlx::query(
            r"
            SELECT g.id, g.user_id, g.latitude, g.longitude, g.created_at, g.updated_at,
                   p.team_id
            FROM geolocations g
            JOIN user_profiles p ON p.id = g.user_id
            ORDER BY g.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        // Rows arrive newest first, so the first row seen per team wins
        let mut latest: BTreeMap<i64, Geolocation> = BTreeMap::new();
        for row in &rows {
            let team_id: i64 = row.try_get("team_id")?;
            if let Entry::Vacant(slot) = latest.entry(team_id) {
                slot.insert(row_to_geolocation(row)?);
            }
        }

        let mut details = Vec::with_capacity(latest.len());
        for (team_id, geolocation) in latest {
            if let Some(team_detail) = self.get_team_detail(team_id).await? {
                details.push(GeolocationDetail {
                    team_detail,
                    geolocation,
                });
            }
        }
        Ok(details)
    }
}

fn map_unique_violation(error: sqlx::Error, entity: &'static str, name: &str) -> anyhow::Error {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Conflict {
            entity,
            name: name.to_owned(),
        }
        .into(),
        _ => error.into(),
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn row_to_profile(row: &SqliteRow) -> Result<UserProfile> {
    Ok(UserProfile {
        id: row.try_get("id")?,
        user_name: row.try_get("user_name")?,
        team_id: row.try_get("team_id")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_team(row: &SqliteRow) -> Result<Team> {
    Ok(Team {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_geolocation(row: &SqliteRow) -> Result<Geolocation> {
    Ok(Geolocation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
