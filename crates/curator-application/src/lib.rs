// SPDX-License-Identifier: GPL-3.0-or-later
use curator_config::{AppConfig, PlexConfig};
use curator_plex::{ClientIdentity, PlexWatchlistClient};
pub mod credentials;
pub mod gateway;
pub mod matching;
pub mod reconcile;

pub use credentials::{ConfigCredentials, CredentialsError, CredentialsProvider, PlexCredentials};
pub use gateway::WatchlistGateway;
pub use matching::{
    normalize_title, select_candidates, similarity_score, MatchCandidateSet, MatchedBy,
    FUZZY_MATCH_THRESHOLD,
};
pub use reconcile::{ReconcileError, ReconcileResult, RemovalOutcome, WatchlistReconciler};

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Process-wide services, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub identity: Arc<ClientIdentity>,
    pub credentials: Arc<dyn CredentialsProvider>,
    pub reconciler: Arc<WatchlistReconciler>,
}

impl AppState {
    pub fn new(config: AppConfig) -> curator_plex::Result<Self> {
        let identity = Arc::new(identity_from_config(&config.plex));

        let client = PlexWatchlistClient::builder()
            .hosts(config.watchlist.hosts.iter().cloned())
            .identity(identity.clone())
            .list_timeout(Duration::from_secs(config.watchlist.list_timeout_secs))
            .removal_timeout(Duration::from_secs(config.watchlist.removal_timeout_secs))
            .connect_timeout(Duration::from_secs(config.watchlist.connect_timeout_secs))
            .build()?;

        Ok(Self {
            credentials: Arc::new(ConfigCredentials::new(config.plex.clone())),
            reconciler: Arc::new(WatchlistReconciler::new(Arc::new(client))),
            identity,
            config,
        })
    }

    pub fn on_start(&self) {
        info!(
            target: "application",
            client_identifier = %self.identity.client_identifier,
            hosts = self.config.watchlist.hosts.len(),
            "application state initialized"
        );
    }
}

/// Identity headers from config; the client identifier is generated when unset.
pub fn identity_from_config(plex: &PlexConfig) -> ClientIdentity {
    ClientIdentity {
        product: plex.product.clone(),
        version: plex.version.clone(),
        device: plex.device.clone(),
        device_name: plex.device_name.clone(),
        platform: plex.platform.clone(),
        platform_version: plex.platform_version.clone(),
        ..ClientIdentity::with_identifier(plex.client_identifier.clone())
    }
}
