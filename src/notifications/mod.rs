// ABOUTME: Outbound notifications sent when team positions change
// ABOUTME: Chat webhook delivery, best effort and detached from the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

/// Discord-compatible webhook notifier
pub mod webhook;

pub use webhook::{WebhookError, WebhookMessage, WebhookNotifier};
