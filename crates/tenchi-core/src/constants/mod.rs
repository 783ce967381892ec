// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for sessions, cookies, admission windows, routes and defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! flat list, mirroring how they are consumed by the server crate.

/// Session credential lifetime and layout
pub mod session {
    /// Lifetime of an issued session token
    pub const TOKEN_EXPIRY_HOURS: i64 = 24;
    /// Session cookie Max-Age in seconds (matches token expiry)
    pub const COOKIE_MAX_AGE_SECS: i64 = TOKEN_EXPIRY_HOURS * 60 * 60;
    /// Signing algorithms accepted on verification
    pub const ALLOWED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];
    /// Minimum secret length accepted at startup
    pub const SECRET_MIN_LENGTH: usize = 32;
}

/// Cookie names
pub mod cookies {
    /// Cookie holding the signed session token
    pub const SESSION: &str = "jwt";
    /// Cookie holding the per-login anti-forgery state
    pub const OAUTH_STATE: &str = "oauth_state";
    /// Lifetime of the anti-forgery state cookie in seconds
    pub const OAUTH_STATE_MAX_AGE_SECS: i64 = 10 * 60;
}

/// Time-of-day admission windows for gated mutations
pub mod admission {
    /// Number of allowed instants in a day
    pub const MARK_COUNT: i32 = 48;
    /// Spacing between allowed instants in minutes
    pub const MARK_INTERVAL_MINUTES: i32 = 30;
    /// Minutes on either side of a mark that are still admitted
    pub const TOLERANCE_MINUTES: i32 = 3;
}

/// OAuth configuration constants
pub mod oauth {
    /// Google authorization endpoint
    pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
    /// Google token endpoint
    pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
    /// Google profile endpoint
    pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
    /// Scopes requested at login
    pub const GOOGLE_SCOPES: [&str; 2] = [
        "https://www.googleapis.com/auth/userinfo.email",
        "https://www.googleapis.com/auth/userinfo.profile",
    ];
    /// Random bytes in the anti-forgery state (hex encoded on the wire)
    pub const STATE_BYTES: usize = 32;
}

/// Defaults applied to freshly created accounts
pub mod accounts {
    /// Team that new accounts join until they pick one
    pub const DEFAULT_TEAM_ID: i64 = 9;
    /// Name of the default team
    pub const DEFAULT_TEAM_NAME: &str = "No team assigned";
    /// Display name given to new accounts
    pub const DEFAULT_USER_NAME: &str = "Unregistered user";
    /// Longest accepted display or team name, in characters
    pub const MAX_NAME_LENGTH: usize = 64;
}

/// Webhook notification defaults
pub mod webhook {
    /// Sender name shown by the receiving chat service
    pub const USERNAME: &str = "Tenchi Geolocation";
    /// Avatar shown by the receiving chat service
    pub const AVATAR_URL: &str =
        "https://lh3.googleusercontent.com/a/ACg8ocIAjvLfg1jNaC3znxz_Zy1AV6fCJ0aNUath8zBQwvzPhmZzUq0=s96-c";
}

/// Network defaults
pub mod network {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 3000;
    /// Default static asset directory
    pub const DEFAULT_STATIC_DIR: &str = "./web";
    /// Default database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/tenchi.db";
}

/// Timeout configurations
pub mod timeouts {
    /// OAuth client request timeout in seconds
    pub const OAUTH_CLIENT_TIMEOUT_SECS: u64 = 15;
    /// OAuth client connect timeout in seconds
    pub const OAUTH_CLIENT_CONNECT_TIMEOUT_SECS: u64 = 5;
    /// Webhook client request timeout in seconds
    pub const WEBHOOK_CLIENT_TIMEOUT_SECS: u64 = 10;
    /// Webhook client connect timeout in seconds
    pub const WEBHOOK_CLIENT_CONNECT_TIMEOUT_SECS: u64 = 5;
    /// Database acquire timeout in seconds
    pub const DATABASE_TIMEOUT_SECS: u64 = 10;
}

/// Service identity used in logs
pub mod service_names {
    /// Name reported by the logging layer
    pub const TENCHI_SERVER: &str = "tenchi-geolocation";
}
