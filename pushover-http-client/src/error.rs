//! Error types for pushover-http-client

use displaydoc::Display;

/// Errors that can occur when sending a Pushover message
#[derive(Debug, Display)]
pub enum Error {
    /// Reqwest: {0}
    Reqwest(reqwest::Error),
    /// API: {0}: {1}
    Api(u16, String),
}

impl From<reqwest::Error> for Error {
    fn from(src: reqwest::Error) -> Self {
        Self::Reqwest(src)
    }
}

impl std::error::Error for Error {}
