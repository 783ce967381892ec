// ABOUTME: Request extractors whose rejections use the JSON error body
// ABOUTME: Wraps axum's Json and Path so malformed input answers INVALID_INPUT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use axum::extract::{FromRequest, FromRequestParts};
use tenchi_core::errors::AppError;

/// JSON request body; a bad body is a 400 with the standard error body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; a segment that fails to parse is a 400 with the standard error body
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
