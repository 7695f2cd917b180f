#![deny(missing_docs)]

//! Minimal client for the Pushover messages API.
//!
//! Build a [`Client`] with the application token and user key, then call
//! [`Client::send`] with a [`Message`]. Each call is a single form-encoded POST.
//! Any response other than HTTP 200 is returned as [`Error::Api`] with the status code
//! and body, and transport failures (including the per-request timeout) as
//! [`Error::Reqwest`].
//!
//! See <https://pushover.net/api>

use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

mod error;
pub use error::Error;

/// The Pushover messages endpoint.
pub const DEFAULT_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Message priority. Emergency priority (2) needs retry parameters and is not supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Priority {
    /// No notification at all, only a badge.
    Lowest,
    /// Quiet notification.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Bypasses the user's quiet hours.
    High,
}

impl Priority {
    /// The numeric value on the wire.
    pub fn value(self) -> i8 {
        match self {
            Priority::Lowest => -2,
            Priority::Low => -1,
            Priority::Normal => 0,
            Priority::High => 1,
        }
    }
}

/// One notification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Title shown above the message.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Supplementary URL.
    pub url: Option<String>,
    /// Label for the supplementary URL.
    pub url_title: Option<String>,
    /// Priority.
    pub priority: Priority,
    /// Name of the sound to play, e.g. `pushover` or `persistent`.
    pub sound: String,
}

/// Form body for POST /1/messages.json
#[derive(Serialize)]
struct MessageForm<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    title: &'a str,
    priority: i8,
    sound: &'a str,
    url: &'a str,
    url_title: &'a str,
}

/// Client bound to one application token and one user key.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    token: String,
    user: String,
}

impl Client {
    /// Create a client. `api_url` is normally [`DEFAULT_API_URL`].
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("irc-topic-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            token: token.into(),
            user: user.into(),
        })
    }

    /// The endpoint this client posts to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send a message, failing if no response arrives within `timeout`.
    pub async fn send(&self, msg: &Message, timeout: Duration) -> Result<(), Error> {
        let form = MessageForm {
            token: &self.token,
            user: &self.user,
            message: &msg.message,
            title: &msg.title,
            priority: msg.priority.value(),
            sound: &msg.sound,
            url: msg.url.as_deref().unwrap_or_default(),
            url_title: msg.url_title.as_deref().unwrap_or_default(),
        };

        let response = self
            .http
            .post(&self.api_url)
            .form(&form)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
        Err(Error::Api(status.as_u16(), body))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
