// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{PlexError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Keys under which the media container may hold its items. The first
/// non-empty one wins.
const CONTAINER_KEYS: [&str; 3] = ["Metadata", "Video", "Directory"];

/// Media kind a watchlist query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Film,
    Series,
}

impl MediaKind {
    /// Value of the provider's `type` query parameter.
    pub fn plex_type(self) -> u8 {
        match self {
            Self::Film => 1,
            Self::Series => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item on the user's watchlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Provider identifier (`ratingKey`), never empty.
    pub external_id: String,
    /// Display title, never empty.
    pub title: String,
    pub year: Option<i32>,
    /// Provider item type (e.g. "movie", "show").
    pub kind: Option<String>,
}

/// Result of a successful list probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistListing {
    /// Host of the probe that answered.
    pub base_host_tried: String,
    pub items: Vec<WatchlistEntry>,
}

/// Attribute value that may arrive as a number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                (value as i64).to_string()
            }
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.trim().to_string(),
        }
    }

    fn into_year(self) -> Option<i32> {
        match self {
            Self::Int(value) => i32::try_from(value).ok(),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                i32::try_from(value as i64).ok()
            }
            Self::Float(_) => None,
            Self::Text(value) => value.trim().parse().ok(),
        }
    }
}

/// Item node as found in either the JSON or the XML rendition of the container.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "ratingKey", alias = "@ratingKey", default)]
    rating_key: Option<Scalar>,
    #[serde(alias = "@title", default)]
    title: Option<String>,
    #[serde(alias = "@year", default)]
    year: Option<Scalar>,
    #[serde(rename = "type", alias = "@type", default)]
    kind: Option<String>,
}

impl RawNode {
    fn into_entry(self) -> Option<WatchlistEntry> {
        let external_id = self.rating_key?.into_text();
        let title = self.title?.trim().to_string();
        if external_id.is_empty() || title.is_empty() {
            return None;
        }

        Some(WatchlistEntry {
            external_id,
            title,
            year: self.year.and_then(Scalar::into_year),
            kind: self
                .kind
                .map(|kind| kind.trim().to_string())
                .filter(|kind| !kind.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct XmlMediaContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<RawNode>,
    #[serde(rename = "Video", default)]
    video: Vec<RawNode>,
    #[serde(rename = "Directory", default)]
    directory: Vec<RawNode>,
}

/// Parse a watchlist response body (JSON or XML) into entries.
///
/// Nodes without an id or a title are dropped.
pub fn parse_watchlist_document(body: &str) -> Result<Vec<WatchlistEntry>> {
    let nodes = if body.trim_start().starts_with('<') {
        parse_xml_nodes(body)?
    } else {
        parse_json_nodes(body)?
    };

    let total = nodes.len();
    let entries: Vec<WatchlistEntry> = nodes.into_iter().filter_map(RawNode::into_entry).collect();
    if entries.len() < total {
        debug!(
            target: "plex",
            dropped = total - entries.len(),
            "dropped watchlist nodes without id or title"
        );
    }

    Ok(entries)
}

fn parse_json_nodes(body: &str) -> Result<Vec<RawNode>> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| PlexError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let container = match root.get("MediaContainer") {
        Some(container) => container,
        None if CONTAINER_KEYS.iter().any(|key| root.get(key).is_some()) => &root,
        None => {
            return Err(PlexError::InvalidResponse(
                "response has no media container".to_string(),
            ))
        }
    };
    if !container.is_object() {
        return Err(PlexError::InvalidResponse(
            "response has no media container".to_string(),
        ));
    }

    let items = CONTAINER_KEYS
        .iter()
        .filter_map(|key| container.get(key))
        .map(coerce_to_sequence)
        .find(|items| !items.is_empty())
        .unwrap_or_default();

    Ok(items
        .into_iter()
        .filter_map(|item| match RawNode::deserialize(item) {
            Ok(node) => Some(node),
            Err(error) => {
                debug!(target: "plex", error = %error, "skipping malformed watchlist node");
                None
            }
        })
        .collect())
}

fn parse_xml_nodes(body: &str) -> Result<Vec<RawNode>> {
    if !body.contains("<MediaContainer") {
        return Err(PlexError::InvalidResponse(
            "response has no media container".to_string(),
        ));
    }

    let container: XmlMediaContainer = quick_xml::de::from_str(body)
        .map_err(|e| PlexError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    Ok([container.metadata, container.video, container.directory]
        .into_iter()
        .find(|items| !items.is_empty())
        .unwrap_or_default())
}

/// A container key may hold a list or a single object.
fn coerce_to_sequence(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}
