// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlexError>;

#[derive(Debug, Error)]
pub enum PlexError {
    #[error("HTTP client setup failed: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// `url` is already redacted; `source` carries no URL.
    #[error("HTTP request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response from Plex: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("watchlist unavailable after {attempts} attempts: {last_error}")]
    UpstreamUnavailable { attempts: usize, last_error: String },
}

impl PlexError {
    /// Wrap a transport error for `redacted_url`, dropping the raw URL reqwest kept.
    pub(crate) fn transport(redacted_url: &str, source: reqwest::Error) -> Self {
        Self::RequestFailed {
            url: redacted_url.to_string(),
            source: source.without_url(),
        }
    }
}
