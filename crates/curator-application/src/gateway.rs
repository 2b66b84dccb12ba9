// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use curator_plex::{MediaKind, PlexWatchlistClient, WatchlistListing};

/// Watchlist operations the reconciler needs from the provider.
#[async_trait]
pub trait WatchlistGateway: Send + Sync {
    async fn list_watchlist(
        &self,
        token: &str,
        kind: MediaKind,
    ) -> curator_plex::Result<WatchlistListing>;

    /// `true` when some probe accepted the removal.
    async fn remove_from_watchlist(&self, token: &str, external_id: &str) -> bool;
}

#[async_trait]
impl WatchlistGateway for PlexWatchlistClient {
    async fn list_watchlist(
        &self,
        token: &str,
        kind: MediaKind,
    ) -> curator_plex::Result<WatchlistListing> {
        PlexWatchlistClient::list_watchlist(self, token, kind).await
    }

    async fn remove_from_watchlist(&self, token: &str, external_id: &str) -> bool {
        PlexWatchlistClient::remove_from_watchlist(self, token, external_id).await
    }
}
