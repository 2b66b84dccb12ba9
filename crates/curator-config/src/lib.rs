// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Literal values people leave in sample configs instead of a real token.
const PLACEHOLDER_TOKENS: &[&str] = &["PLEX_TOKEN", "YOUR_PLEX_TOKEN", "CHANGEME"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    /// Address of the user's own Plex Media Server.
    pub base_url: String,
    pub token: Option<String>,
    /// Stable `X-Plex-Client-Identifier`; a random one is generated when unset.
    pub client_identifier: Option<String>,
    pub product: String,
    pub version: String,
    pub device: String,
    pub device_name: String,
    pub platform: String,
    pub platform_version: String,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:32400".to_string(),
            token: None,
            client_identifier: None,
            product: "Curator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            device: "Curator".to_string(),
            device_name: "Curator".to_string(),
            platform: std::env::consts::OS.to_string(),
            platform_version: "1.0".to_string(),
        }
    }
}

impl PlexConfig {
    /// The configured token, unless it is blank or an obvious placeholder.
    pub fn usable_token(&self) -> Option<&str> {
        let token = self.token.as_deref()?.trim();
        if is_placeholder_secret(token) {
            return None;
        }
        Some(token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    /// Discover hosts probed in order for every watchlist call.
    pub hosts: Vec<String>,
    pub list_timeout_secs: u64,
    pub removal_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            hosts: vec![
                "https://discover.provider.plex.tv".to_string(),
                "https://metadata.provider.plex.tv".to_string(),
            ],
            list_timeout_secs: 20,
            removal_timeout_secs: 15,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub plex: PlexConfig,
    pub watchlist: WatchlistConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: CURATOR_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("CURATOR_").split("__"));

    let config: AppConfig = figment.extract()?;
    if config.plex.token.is_some() && config.plex.usable_token().is_none() {
        warn!(target: "config", "plex token looks like a placeholder, treating it as unset");
    }
    if config.watchlist.hosts.is_empty() {
        anyhow::bail!("watchlist.hosts must list at least one host");
    }
    info!(target: "config", "configuration loaded");
    Ok(config)
}

/// Blank values, known literals and runs of eight or more `x` count as "not configured".
pub fn is_placeholder_secret(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    let upper = value.to_ascii_uppercase();
    if PLACEHOLDER_TOKENS.contains(&upper.as_str()) {
        return true;
    }

    let mut run = 0usize;
    for c in value.chars() {
        if c.eq_ignore_ascii_case(&'x') {
            run += 1;
            if run >= 8 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}
