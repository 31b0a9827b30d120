//! Outgoing mail via the Resend HTTP API.
//!
//! Booking-related notifications are best-effort: callers on the booking
//! path use [`send_or_log`] so a delivery failure never fails the request.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from_address: String,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Self {
        if config.resend_api_key.is_none() {
            tracing::warn!("RESEND_API_KEY not set; outgoing email is disabled");
        }
        ResendMailer {
            client: reqwest::Client::new(),
            api_key: config.resend_api_key.clone(),
            from_address: config.from_address.clone(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                tracing::info!("Email disabled; would have sent '{}' to {}", subject, to);
                return Ok(());
            }
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&ResendRequest {
                from: &self.from_address,
                to,
                subject,
                html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!(
                "Resend API error ({}): {}",
                status, body
            )));
        }

        tracing::info!("Email '{}' sent to {}", subject, to);
        Ok(())
    }
}

/// Send and swallow failures, logging them. Used on paths where email is a
/// courtesy and must not fail the surrounding request.
pub async fn send_or_log(mailer: &dyn Mailer, to: &str, subject: &str, html: &str) {
    if let Err(e) = mailer.send(to, subject, html).await {
        tracing::warn!("Failed to send email '{}' to {}: {:?}", subject, to, e);
    }
}

pub fn confirmation_email(frontend_url: &str, date: &str, time: &str) -> String {
    format!(
        "Your appointment for {} at {} has been confirmed. \
         View your appointments <a href=\"{}/my-appointments\">here</a>.",
        date,
        time,
        frontend_url.trim_end_matches('/')
    )
}

pub fn admin_booking_notification(
    frontend_url: &str,
    first_name: &str,
    last_name: &str,
    client_email: &str,
    date: &str,
    time: &str,
) -> String {
    format!(
        "A new appointment has been booked:\
         <br>Name: {} {}\
         <br>Email: {}\
         <br>Date: {}\
         <br>Time: {}\
         <br><a href=\"{}/admin\">View in Admin Dashboard</a>",
        first_name,
        last_name,
        client_email,
        date,
        time,
        frontend_url.trim_end_matches('/')
    )
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records outgoing mail instead of sending it.
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            RecordingMailer {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _html: &str) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Email("recording mailer failure".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }
}
