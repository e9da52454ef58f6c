// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Course delivery emails.
//!
//! [`EmailNotifier`] is what handlers call. It never fails and only reports whether a
//! mail went out. The actual transport sits behind [`Mailer`], with SendGrid's v3 HTTP API
//! as the production implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::EmailConfig;

/// Default SendGrid API origin.
pub const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

/// Errors from the mail transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmailError {
    /// The provider refused the message.
    #[error("provider rejected message with HTTP {status}: {body}")]
    Rejected {
        /// HTTP status from the provider.
        status: u16,
        /// Response body, usually a JSON error list.
        body: String,
    },

    /// The request never produced a response.
    #[error("email request failed: {0}")]
    Transport(String),
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
}

/// Transport that hands a message to an email provider.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// SendGrid v3 `mail/send` client.
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    client: Client,
    api_base: String,
    api_key: String,
}

impl SendGridMailer {
    /// Create a client against the public SendGrid API.
    pub fn new(api_key: &str) -> Self {
        Self::with_api_base(api_key, SENDGRID_API_BASE)
    }

    /// Create a client against a custom API origin.
    pub fn with_api_base(api_key: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": message.from },
            "subject": message.subject,
            "content": [{ "type": "text/plain", "value": message.text }],
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(EmailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Course delivery details.
#[derive(Debug, Clone)]
pub struct CourseEmail<'a> {
    /// Student address.
    pub to: &'a str,
    /// Course being delivered.
    pub course_title: &'a str,
    /// Optional note for the student.
    pub note: Option<&'a str>,
}

/// Sends course emails when a provider is configured, and is a no-op otherwise.
#[derive(Clone)]
pub struct EmailNotifier {
    transport: Option<(Arc<dyn Mailer>, String)>,
}

impl EmailNotifier {
    /// Notifier that never sends.
    pub fn disabled() -> Self {
        Self { transport: None }
    }

    /// Notifier sending through `mailer` from `sender`.
    pub fn new(mailer: Arc<dyn Mailer>, sender: &str) -> Self {
        Self {
            transport: Some((mailer, sender.to_string())),
        }
    }

    /// Build from configuration: SendGrid when credentials exist, disabled otherwise.
    pub fn from_config(config: Option<&EmailConfig>) -> Self {
        match config {
            Some(cfg) => Self::new(Arc::new(SendGridMailer::new(&cfg.api_key)), &cfg.sender),
            None => Self::disabled(),
        }
    }

    /// Whether a provider is configured.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the course access email. Returns whether it was handed to the provider.
    #[instrument(skip(self, email), fields(course = %email.course_title))]
    pub async fn send_course_email(&self, email: CourseEmail<'_>) -> bool {
        let Some((mailer, sender)) = &self.transport else {
            return false;
        };

        let message = course_message(&email, sender);
        match mailer.send(&message).await {
            Ok(()) => {
                info!("Course email sent");
                true
            }
            Err(e) => {
                error!(error = %e, "SendGrid error");
                false
            }
        }
    }
}

/// Compose the course delivery message.
pub fn course_message(email: &CourseEmail<'_>, sender: &str) -> EmailMessage {
    let note = email
        .note
        .filter(|n| !n.is_empty())
        .unwrap_or("No extra notes provided.");
    EmailMessage {
        to: email.to.to_string(),
        from: sender.to_string(),
        subject: format!("Gold Wealth Academy access: {}", email.course_title),
        text: [
            format!("Course delivered: {}", email.course_title),
            format!("Access link sent to {}", email.to),
            note.to_string(),
        ]
        .join("\n"),
    }
}
