// ABOUTME: Discord-compatible webhook notifier announcing new team positions
// ABOUTME: Delivery runs on a detached task; failures are logged and never retried
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use crate::utils::http_client::webhook_client;
use serde::Serialize;
use tenchi_core::constants::webhook::{AVATAR_URL, USERNAME};
use tenchi_core::models::{Geolocation, UserDetail};
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// Webhook delivery failures
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Request could not be sent
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Receiver answered with a non-success status
    #[error("webhook endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Chat message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    /// Sender name
    pub username: String,
    /// Sender avatar
    pub avatar_url: String,
    /// Message text
    pub content: String,
}

impl WebhookMessage {
    /// Announcement that `detail`'s team has a new position
    #[must_use]
    pub fn geolocation_update(detail: &UserDetail, geolocation: &Geolocation) -> Self {
        Self {
            username: USERNAME.to_owned(),
            avatar_url: AVATAR_URL.to_owned(),
            content: format!(
                "Location of `{}` was updated by user `{}`.\nLocation: latitude {:.6}, longitude {:.6}",
                detail.team.name,
                detail.user_profile.user_name,
                geolocation.latitude,
                geolocation.longitude,
            ),
        }
    }
}

/// Posts position announcements to a configured webhook
#[derive(Clone)]
pub struct WebhookNotifier {
    url: Option<Url>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Notifier posting to `url`; `None` disables notifications
    #[must_use]
    pub fn new(url: Option<Url>) -> Self {
        Self {
            url,
            client: webhook_client(),
        }
    }

    /// Whether a webhook is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Deliver `message` and wait for the response
    ///
    /// Does nothing when no webhook is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the receiver rejects it
    pub async fn send(&self, message: &WebhookMessage) -> Result<(), WebhookError> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        let response = self
            .client
            .post(url.as_str())
            .json(message)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            return Err(WebhookError::Status(response.status()));
        }
        Ok(())
    }

    /// Announce a new position without waiting for delivery
    ///
    /// Returns the delivery task, or `None` when notifications are disabled.
    pub fn notify_geolocation_update(
        &self,
        detail: &UserDetail,
        geolocation: &Geolocation,
    ) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            return None;
        }

        let message = WebhookMessage::geolocation_update(detail, geolocation);
        let notifier = self.clone();
        let team_id = detail.team.id;

        Some(tokio::spawn(async move {
            match notifier.send(&message).await {
                Ok(()) => tracing::debug!(team_id, "Geolocation webhook delivered"),
                Err(e) => tracing::warn!(team_id, error = %e, "Geolocation webhook failed"),
            }
        }))
    }
}
