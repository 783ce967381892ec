// ABOUTME: Integration tests for loading server configuration from the process environment
// ABOUTME: Serialized because every case mutates shared environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tenchi_geolocation::config::{ConfigError, ServerConfig};

const VARIABLES: &[&str] = &[
    "JWT_SECRET",
    "GOOGLE_CLIENT_ID",
    "GOOGLE_CLIENT_SECRET",
    "GOOGLE_REDIRECT_URL",
    "GOOGLE_AUTH_URL",
    "GOOGLE_TOKEN_URL",
    "GOOGLE_USERINFO_URL",
    "HTTP_PORT",
    "DATABASE_URL",
    "STATIC_DIR",
    "WEBHOOK_URL",
    "ADMISSION_UTC_OFFSET",
    "COOKIE_SECURE",
];

fn clear_env() {
    for key in VARIABLES {
        env::remove_var(key);
    }
}

fn set_required_env() {
    clear_env();
    env::set_var("JWT_SECRET", "a-sufficiently-long-session-secret!!");
    env::set_var("GOOGLE_CLIENT_ID", "client-id.apps.example");
    env::set_var("GOOGLE_CLIENT_SECRET", "client-secret");
    env::set_var("GOOGLE_REDIRECT_URL", "https://tenchi.example/api/callback");
}

#[test]
#[serial]
fn test_from_env_with_required_variables() {
    set_required_env();
    env::set_var("ADMISSION_UTC_OFFSET", "+09:00");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 3000);
    assert_eq!(config.static_dir, PathBuf::from("./web"));
    assert_eq!(config.oauth.client_id, "client-id.apps.example");
    assert_eq!(config.admission_offset.local_minus_utc(), 9 * 3600);
    assert!(config.webhook_url.is_none());
    assert!(config.cookie_secure);

    clear_env();
}

#[test]
#[serial]
fn test_missing_secret_is_reported_by_name() {
    set_required_env();
    env::remove_var("JWT_SECRET");
    assert_eq!(
        ServerConfig::from_env().unwrap_err(),
        ConfigError::Missing("JWT_SECRET")
    );

    env::set_var("JWT_SECRET", "too-short");
    let error = ServerConfig::from_env().unwrap_err();
    assert!(matches!(error, ConfigError::Invalid { key: "JWT_SECRET", .. }));
    assert!(error.to_string().contains("JWT_SECRET"));

    clear_env();
}

#[test]
#[serial]
fn test_optional_overrides() {
    set_required_env();
    env::set_var("HTTP_PORT", "8088");
    env::set_var("DATABASE_URL", "sqlite:./data/test.db");
    env::set_var("STATIC_DIR", "/srv/tenchi");
    env::set_var("WEBHOOK_URL", "https://hooks.example/api/webhooks/1/abc");
    env::set_var("ADMISSION_UTC_OFFSET", "-05:30");
    env::set_var("COOKIE_SECURE", "false");
    env::set_var("GOOGLE_TOKEN_URL", "http://127.0.0.1:9999/token");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 8088);
    assert_eq!(config.database_url, "sqlite:./data/test.db");
    assert_eq!(config.static_dir, PathBuf::from("/srv/tenchi"));
    assert_eq!(
        config.webhook_url.as_ref().map(url::Url::as_str),
        Some("https://hooks.example/api/webhooks/1/abc")
    );
    assert_eq!(config.admission_offset.local_minus_utc(), -(5 * 3600 + 30 * 60));
    assert!(!config.cookie_secure);
    assert_eq!(config.oauth.token_url, "http://127.0.0.1:9999/token");

    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    for (key, value) in [
        ("WEBHOOK_URL", "ftp://hooks.example/abc"),
        ("ADMISSION_UTC_OFFSET", "JST"),
        ("COOKIE_SECURE", "sometimes"),
        ("HTTP_PORT", "70000"),
        ("GOOGLE_USERINFO_URL", "not a url"),
    ] {
        set_required_env();
        env::set_var(key, value);

        match ServerConfig::from_env() {
            Err(ConfigError::Invalid { key: reported, .. }) => assert_eq!(reported, key),
            other => panic!("{key}={value} should be invalid, got {other:?}"),
        }
    }

    clear_env();
}

#[test]
#[serial]
fn test_debug_output_redacts_secrets() {
    set_required_env();
    env::set_var("WEBHOOK_URL", "https://hooks.example/api/webhooks/1/token-part");

    let config = ServerConfig::from_env().unwrap();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("a-sufficiently-long-session-secret"));
    assert!(!rendered.contains("token-part"));
    assert!(rendered.contains("[REDACTED]"));

    clear_env();
}
