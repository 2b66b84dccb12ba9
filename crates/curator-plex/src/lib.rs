// SPDX-License-Identifier: GPL-3.0-or-later

//! Plex watchlist client.
//!
//! The watchlist lives on Plex's discover/metadata hosts, which have moved
//! endpoints between releases. The client therefore probes an ordered set of
//! hosts and request shapes for every logical call and stops at the first one
//! that answers successfully.

pub mod client;
pub mod error;
pub mod identity;
pub mod models;
pub mod redact;

pub use client::PlexWatchlistClient;
pub use error::{PlexError, Result};
pub use identity::ClientIdentity;
pub use models::{parse_watchlist_document, MediaKind, WatchlistEntry, WatchlistListing};
pub use redact::redact_url;
