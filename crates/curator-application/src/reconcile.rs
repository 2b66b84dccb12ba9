// SPDX-License-Identifier: GPL-3.0-or-later

//! Watchlist reconciliation: remove titles the rest of the system no longer
//! needs from the user's Plex watchlist.
//!
//! Each call lists the watchlist once, selects candidates with
//! [`select_candidates`], then removes them one after another. Only a failed
//! listing is an error; per-item removal failures show up as
//! `removed < attempted` in the returned [`RemovalOutcome`].

use crate::gateway::WatchlistGateway;
use crate::matching::{select_candidates, MatchedBy};
use curator_plex::{MediaKind, PlexError, WatchlistEntry, WatchlistListing};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Maximum number of matched entries echoed back in an outcome.
pub const SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Upstream(#[from] PlexError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Summary of one remove-by-title call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalOutcome {
    pub attempted: usize,
    pub removed: usize,
    pub matched_by: MatchedBy,
    pub sample: Vec<WatchlistEntry>,
    pub base_host_tried: Option<String>,
}

impl RemovalOutcome {
    fn nothing_to_do() -> Self {
        Self {
            attempted: 0,
            removed: 0,
            matched_by: MatchedBy::None,
            sample: Vec::new(),
            base_host_tried: None,
        }
    }

    /// Whether every matched entry was removed.
    pub fn is_complete(&self) -> bool {
        self.removed == self.attempted
    }
}

pub struct WatchlistReconciler {
    gateway: Arc<dyn WatchlistGateway>,
}

impl WatchlistReconciler {
    pub fn new(gateway: Arc<dyn WatchlistGateway>) -> Self {
        Self { gateway }
    }

    /// List the watchlist for `kind` without touching it.
    pub async fn list(&self, token: &str, kind: MediaKind) -> ReconcileResult<WatchlistListing> {
        Ok(self.gateway.list_watchlist(token, kind).await?)
    }

    /// Remove a film from the watchlist. `year`, when given, must match exactly.
    pub async fn remove_film_by_title(
        &self,
        token: &str,
        title: &str,
        year: Option<i32>,
        dry_run: bool,
    ) -> ReconcileResult<RemovalOutcome> {
        self.remove_by_title(token, MediaKind::Film, title, year, dry_run)
            .await
    }

    /// Remove a series from the watchlist.
    pub async fn remove_series_by_title(
        &self,
        token: &str,
        title: &str,
        dry_run: bool,
    ) -> ReconcileResult<RemovalOutcome> {
        self.remove_by_title(token, MediaKind::Series, title, None, dry_run)
            .await
    }

    async fn remove_by_title(
        &self,
        token: &str,
        kind: MediaKind,
        title: &str,
        year: Option<i32>,
        dry_run: bool,
    ) -> ReconcileResult<RemovalOutcome> {
        let title = title.trim();
        if title.is_empty() {
            debug!(target: "watchlist", kind = %kind, "blank title, nothing to remove");
            return Ok(RemovalOutcome::nothing_to_do());
        }

        let listing = self.gateway.list_watchlist(token, kind).await?;
        let candidates = select_candidates(&listing.items, title, year);

        let mut removed = 0usize;
        if dry_run {
            info!(
                target: "watchlist",
                kind = %kind,
                title,
                matched = candidates.entries.len(),
                "dry run, skipping removal"
            );
        } else {
            for entry in &candidates.entries {
                if self
                    .gateway
                    .remove_from_watchlist(token, &entry.external_id)
                    .await
                {
                    removed += 1;
                } else {
                    warn!(
                        target: "watchlist",
                        external_id = %entry.external_id,
                        title = %entry.title,
                        "could not remove watchlist entry"
                    );
                }
            }
        }

        let outcome = RemovalOutcome {
            attempted: candidates.entries.len(),
            removed,
            matched_by: candidates.matched_by,
            sample: candidates
                .entries
                .into_iter()
                .take(SAMPLE_LIMIT)
                .collect(),
            base_host_tried: Some(listing.base_host_tried),
        };

        info!(
            target: "watchlist",
            kind = %kind,
            title,
            matched_by = ?outcome.matched_by,
            attempted = outcome.attempted,
            removed = outcome.removed,
            "watchlist reconciliation finished"
        );

        Ok(outcome)
    }
}
