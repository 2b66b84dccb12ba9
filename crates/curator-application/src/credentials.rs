// SPDX-License-Identifier: GPL-3.0-or-later
use curator_config::PlexConfig;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("plex token is not configured")]
    MissingToken,
}

/// Server address and token for the acting user.
#[derive(Clone, PartialEq, Eq)]
pub struct PlexCredentials {
    pub base_url: String,
    pub token: String,
}

impl fmt::Debug for PlexCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexCredentials")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of the acting user's Plex credentials.
pub trait CredentialsProvider: Send + Sync {
    fn credentials(&self) -> Result<PlexCredentials, CredentialsError>;
}

/// Credentials read from the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigCredentials {
    config: PlexConfig,
}

impl ConfigCredentials {
    pub fn new(config: PlexConfig) -> Self {
        Self { config }
    }
}

impl CredentialsProvider for ConfigCredentials {
    fn credentials(&self) -> Result<PlexCredentials, CredentialsError> {
        let token = self
            .config
            .usable_token()
            .ok_or(CredentialsError::MissingToken)?;

        Ok(PlexCredentials {
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}
