// ABOUTME: Integration tests for login, OAuth callback and logout
// ABOUTME: Verifies account creation happens once, state checking, and cookies on every outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{default_profile, ScriptedIdentityProvider, TestContext};
use helpers::axum_test::{AxumTestRequest, AxumTestResponse};
use std::sync::atomic::Ordering;
use tenchi_geolocation::database_plugins::{AccountStore, LocationStore};
use tenchi_geolocation::oauth2_client::IdentityError;
use tenchi_geolocation::routes::{AuthFlowController, AuthFlowError, CallbackParams};
use url::Url;

const STATE: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

async fn callback(ctx: &TestContext, query: &str, state_cookie: Option<&str>) -> AxumTestResponse {
    let request = AxumTestRequest::get(&format!("/api/callback?{query}"));
    let request = match state_cookie {
        Some(state) => request.cookie("oauth_state", state),
        None => request,
    };
    request.send(ctx.router()).await
}

fn assert_no_session_cookie(response: &AxumTestResponse) {
    assert!(
        response.set_cookie("jwt").is_none(),
        "unexpected session cookie: {:?}",
        response.set_cookies()
    );
}

#[tokio::test]
async fn test_login_redirects_with_fresh_state() {
    let ctx = TestContext::new().await;

    let first = AxumTestRequest::get("/api/login").send(ctx.router()).await;
    let second = AxumTestRequest::get("/api/login").send(ctx.router()).await;

    assert_eq!(first.status(), 302);
    let location = Url::parse(&first.header("location").unwrap()).unwrap();
    let state = location
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    assert_eq!(state.len(), 64);
    assert_eq!(first.cookie_value("oauth_state").as_deref(), Some(state.as_str()));
    assert_ne!(first.cookie_value("oauth_state"), second.cookie_value("oauth_state"));

    let cookie = first.set_cookie("oauth_state").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=600"));
    assert_no_session_cookie(&first);
}

#[tokio::test]
async fn test_callback_creates_new_account_once() {
    let ctx = TestContext::new().await;

    let response = callback(&ctx, &format!("code=4%2F0Ab-code&state={STATE}"), Some(STATE)).await;

    assert_eq!(response.status(), 302);
    assert_eq!(response.header("location").as_deref(), Some("/"));
    assert_eq!(ctx.accounts.exists_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.accounts.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        ctx.identity.last_code.lock().unwrap().as_deref(),
        Some("4/0Ab-code")
    );

    let profile = default_profile();
    let token = response.cookie_value("jwt").unwrap();
    assert_eq!(ctx.resources.token_codec.verify(&token).unwrap(), profile.subject);

    let detail = ctx
        .database
        .get_user_detail(&profile.subject)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.user_profile.user_name, "Unregistered user");
    assert_eq!(detail.user_profile.avatar_url, profile.picture_url);
    assert_eq!(detail.team.id, 9);
}

#[tokio::test]
async fn test_callback_session_cookie_attributes() {
    let ctx = TestContext::new().await;

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;

    let cookie = response.set_cookie("jwt").unwrap();
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(!cookie.contains("Domain"));

    let cleared_state = response.set_cookie("oauth_state").unwrap();
    assert!(cleared_state.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_callback_for_existing_account_skips_create() {
    let ctx = TestContext::new().await;
    let profile = default_profile();
    ctx.database
        .create(&profile.subject, &profile.email, None)
        .await
        .unwrap();

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;

    assert_eq!(response.status(), 302);
    assert_eq!(ctx.accounts.exists_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.accounts.create_calls.load(Ordering::SeqCst), 0);
    assert!(response.cookie_value("jwt").is_some());
}

#[tokio::test]
async fn test_missing_code_makes_no_calls() {
    let ctx = TestContext::new().await;

    for query in [format!("state={STATE}"), format!("code=&state={STATE}")] {
        let response = callback(&ctx, &query, Some(STATE)).await;

        assert_eq!(response.status(), 400, "{query}");
        assert_eq!(response.error_reason().as_deref(), Some("MissingCode"));
        assert_no_session_cookie(&response);
    }
    assert_eq!(ctx.accounts.calls(), 0);
    assert_eq!(ctx.identity.calls(), 0);
}

#[tokio::test]
async fn test_provider_error_is_missing_code() {
    let ctx = TestContext::new().await;

    let response = callback(
        &ctx,
        &format!("error=access_denied&code=abc&state={STATE}"),
        Some(STATE),
    )
    .await;

    assert_eq!(response.status(), 400);
    assert_eq!(response.error_reason().as_deref(), Some("MissingCode"));
    assert_eq!(ctx.identity.calls(), 0);
}

#[tokio::test]
async fn test_mismatched_state_makes_no_calls() {
    let ctx = TestContext::new().await;

    for (query, cookie) in [
        (format!("code=abc&state={STATE}"), Some("0000")),
        (format!("code=abc&state={STATE}"), None),
        ("code=abc".to_owned(), Some(STATE)),
        ("code=abc&state=".to_owned(), Some("")),
    ] {
        let response = callback(&ctx, &query, cookie).await;

        assert_eq!(response.status(), 400, "{query} with {cookie:?}");
        assert_eq!(response.error_reason().as_deref(), Some("InvalidState"));
        assert_no_session_cookie(&response);
    }
    assert_eq!(ctx.accounts.calls(), 0);
    assert_eq!(ctx.identity.calls(), 0);
}

#[tokio::test]
async fn test_exchange_failure_sets_no_cookie() {
    let ctx = TestContext::with_identity(ScriptedIdentityProvider::failing_exchange(
        IdentityError::ExchangeFailed("token endpoint returned 400 Bad Request".to_owned()),
    ))
    .await;

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;

    assert_eq!(response.status(), 502);
    assert_eq!(response.error_reason().as_deref(), Some("ExchangeFailed"));
    assert_no_session_cookie(&response);
    assert_eq!(ctx.accounts.calls(), 0);
}

#[tokio::test]
async fn test_profile_failure_sets_no_cookie() {
    let ctx = TestContext::with_identity(ScriptedIdentityProvider::failing_profile(
        IdentityError::ProfileFetchFailed("profile has no email".to_owned()),
    ))
    .await;

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;

    assert_eq!(response.status(), 502);
    assert_eq!(response.error_reason().as_deref(), Some("ProfileFetchFailed"));
    assert_no_session_cookie(&response);
}

#[tokio::test]
async fn test_store_failures_are_internal_errors() {
    let ctx = TestContext::new().await;
    ctx.accounts.fail_lookups.store(true, Ordering::SeqCst);

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;
    assert_eq!(response.status(), 500);
    assert_eq!(response.error_reason().as_deref(), Some("LookupFailed"));
    assert_no_session_cookie(&response);

    ctx.accounts.fail_lookups.store(false, Ordering::SeqCst);
    ctx.accounts.fail_creates.store(true, Ordering::SeqCst);

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;
    assert_eq!(response.status(), 500);
    assert_eq!(response.error_reason().as_deref(), Some("CreateFailed"));
    assert_no_session_cookie(&response);
    assert!(!ctx.database.exists(&default_profile().subject).await.unwrap());
}

#[tokio::test]
async fn test_signed_in_user_can_reach_protected_routes() {
    let ctx = TestContext::new().await;

    let response = callback(&ctx, &format!("code=abc&state={STATE}"), Some(STATE)).await;
    let token = response.cookie_value("jwt").unwrap();

    let me = AxumTestRequest::get("/api/user/me")
        .cookie("jwt", &token)
        .send(ctx.router())
        .await;
    assert_eq!(me.status(), 200);
    let body: serde_json::Value = me.json();
    assert_eq!(body["user_profile"]["id"], default_profile().subject);
    assert_eq!(body["team"]["id"], 9);
    assert_eq!(body["team_members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_logout_expires_session_cookie() {
    let ctx = TestContext::new().await;

    for request in [
        AxumTestRequest::post("/api/logout"),
        AxumTestRequest::post("/api/logout").cookie("jwt", "whatever"),
    ] {
        let response = request.send(ctx.router()).await;

        assert_eq!(response.status(), 200);
        let cookie = response.set_cookie("jwt").unwrap();
        assert!(cookie.starts_with("jwt=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }
}

#[tokio::test]
async fn test_controller_without_http() {
    let ctx = TestContext::new().await;
    let controller = AuthFlowController::from_resources(&ctx.resources);

    let redirect = controller.begin_login().unwrap();
    assert!(redirect.url.ends_with(&redirect.state));

    let params = CallbackParams {
        code: Some("abc".to_owned()),
        state: Some(redirect.state.clone()),
        error: None,
    };
    let first = controller
        .complete_login(&params, Some(&redirect.state))
        .await
        .unwrap();
    let second = controller
        .complete_login(&params, Some(&redirect.state))
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.subject, second.subject);
    assert_eq!(ctx.accounts.create_calls.load(Ordering::SeqCst), 1);

    let refused = controller
        .complete_login(&params, Some("other"))
        .await
        .unwrap_err();
    assert!(matches!(refused, AuthFlowError::InvalidState));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_first_logins_share_one_account() {
    let ctx = TestContext::new().await;
    let controller = AuthFlowController::from_resources(&ctx.resources);
    let redirect = controller.begin_login().unwrap();
    let params = CallbackParams {
        code: Some("abc".to_owned()),
        state: Some(redirect.state.clone()),
        error: None,
    };

    let (first, second) = tokio::join!(
        controller.complete_login(&params, Some(&redirect.state)),
        controller.complete_login(&params, Some(&redirect.state)),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.subject, second.subject);
    assert_eq!(u8::from(first.created) + u8::from(second.created), 1);
    assert!(ctx.accounts.exists(&first.subject).await.unwrap());
    assert!(ctx
        .database
        .get_user_detail(&first.subject)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_login_losing_creation_race_reuses_account() {
    let ctx = TestContext::new().await;
    let controller = AuthFlowController::from_resources(&ctx.resources);
    let redirect = controller.begin_login().unwrap();
    let params = CallbackParams {
        code: Some("abc".to_owned()),
        state: Some(redirect.state.clone()),
        error: None,
    };

    let first = controller
        .complete_login(&params, Some(&redirect.state))
        .await
        .unwrap();
    assert!(first.created);

    // The lookup misses, so the second login reaches the insert and collides
    ctx.accounts.report_missing.store(true, Ordering::SeqCst);
    let second = controller
        .complete_login(&params, Some(&redirect.state))
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(second.subject, first.subject);
    assert_eq!(ctx.accounts.create_calls.load(Ordering::SeqCst), 2);
    assert!(!second.token.is_empty());
}
