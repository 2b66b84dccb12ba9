// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{PlexError, Result};
use crate::identity::ClientIdentity;
use crate::models::{parse_watchlist_document, MediaKind, WatchlistEntry, WatchlistListing};
use crate::redact::redact_url;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use url::Url;

const DISCOVER_HOST: &str = "https://discover.provider.plex.tv";
const METADATA_HOST: &str = "https://metadata.provider.plex.tv";
const WATCHLIST_PATH: &str = "/library/sections/watchlist/all";
const TOKEN_PARAM: &str = "X-Plex-Token";
const ERROR_BODY_LIMIT: usize = 200;

/// List request variants, tried in this order on every host.
const LIST_VARIANTS: [ListVariant; 2] = [ListVariant::WithGuids, ListVariant::Plain];

#[derive(Debug, Clone, Copy)]
enum ListVariant {
    WithGuids,
    Plain,
}

impl ListVariant {
    fn as_str(self) -> &'static str {
        match self {
            Self::WithGuids => "include-guids",
            Self::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Verb {
    Put,
    Post,
    Delete,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Self::Put => Method::PUT,
            Self::Post => Method::POST,
            Self::Delete => Method::DELETE,
        }
    }
}

/// One historical shape of the "remove from watchlist" call.
#[derive(Debug, Clone, Copy)]
struct RemovalShape {
    verb: Verb,
    /// Path template; `{id}` is replaced by the encoded rating key.
    path: &'static str,
    rating_key_in_query: bool,
}

/// Removal shapes in priority order: action paths, metadata-action paths, then
/// the watchlist resource itself.
const REMOVAL_SHAPES: [RemovalShape; 7] = [
    RemovalShape { verb: Verb::Put, path: "/actions/removeFromWatchlist", rating_key_in_query: true },
    RemovalShape { verb: Verb::Post, path: "/actions/removeFromWatchlist", rating_key_in_query: true },
    RemovalShape { verb: Verb::Put, path: "/library/metadata/{id}/actions/removeFromWatchlist", rating_key_in_query: false },
    RemovalShape { verb: Verb::Post, path: "/library/metadata/{id}/actions/removeFromWatchlist", rating_key_in_query: false },
    RemovalShape { verb: Verb::Put, path: "/library/metadata/actions/removeFromWatchlist", rating_key_in_query: true },
    RemovalShape { verb: Verb::Post, path: "/library/metadata/actions/removeFromWatchlist", rating_key_in_query: true },
    RemovalShape { verb: Verb::Delete, path: "/library/sections/watchlist/items/{id}", rating_key_in_query: false },
];

/// Plex watchlist client probing several hosts and request shapes.
///
/// Probing is strictly sequential: a probe starts only after the previous one
/// resolved, and the first success ends the search.
#[derive(Debug, Clone)]
pub struct PlexWatchlistClient {
    client: Client,
    hosts: Vec<String>,
    identity: Arc<ClientIdentity>,
    list_timeout: Duration,
    removal_timeout: Duration,
}

impl PlexWatchlistClient {
    /// Create a client builder for custom configuration.
    pub fn builder() -> PlexWatchlistClientBuilder {
        PlexWatchlistClientBuilder::default()
    }

    /// List the watchlist for `kind`.
    ///
    /// Returns the first parseable answer; fails with
    /// [`PlexError::UpstreamUnavailable`] only when every host/variant failed.
    pub async fn list_watchlist(&self, token: &str, kind: MediaKind) -> Result<WatchlistListing> {
        let mut attempts = 0usize;
        let mut last_error: Option<PlexError> = None;

        for host in &self.hosts {
            for variant in LIST_VARIANTS {
                attempts += 1;
                match self.fetch_listing(host, token, kind, variant).await {
                    Ok(items) => {
                        debug!(
                            target: "plex",
                            host = %host,
                            variant = variant.as_str(),
                            kind = %kind,
                            count = items.len(),
                            "watchlist listed"
                        );
                        return Ok(WatchlistListing {
                            base_host_tried: host.clone(),
                            items,
                        });
                    }
                    Err(error) => {
                        debug!(
                            target: "plex",
                            host = %host,
                            variant = variant.as_str(),
                            error = %error,
                            "watchlist probe failed"
                        );
                        last_error = Some(error);
                    }
                }
            }
        }

        let last_error = last_error
            .map(|error| error.to_string())
            .unwrap_or_else(|| "no watchlist hosts configured".to_string());
        warn!(target: "plex", attempts, error = %last_error, "all watchlist list probes failed");

        Err(PlexError::UpstreamUnavailable {
            attempts,
            last_error,
        })
    }

    /// Remove one item from the watchlist. Never fails: `false` means every
    /// host/shape combination was rejected.
    pub async fn remove_from_watchlist(&self, token: &str, external_id: &str) -> bool {
        let mut attempts = 0usize;

        for host in &self.hosts {
            for shape in &REMOVAL_SHAPES {
                attempts += 1;
                match self.try_removal(host, token, external_id, shape).await {
                    Ok(()) => {
                        info!(
                            target: "plex",
                            host = %host,
                            external_id,
                            attempts,
                            "removed from watchlist"
                        );
                        return true;
                    }
                    Err(error) => {
                        debug!(
                            target: "plex",
                            host = %host,
                            method = %shape.verb.method(),
                            path = shape.path,
                            error = %error,
                            "watchlist removal probe failed"
                        );
                    }
                }
            }
        }

        warn!(target: "plex", external_id, attempts, "all watchlist removal probes failed");
        false
    }

    async fn fetch_listing(
        &self,
        host: &str,
        token: &str,
        kind: MediaKind,
        variant: ListVariant,
    ) -> Result<Vec<WatchlistEntry>> {
        let mut url = endpoint(host, WATCHLIST_PATH, None)?;
        url.query_pairs_mut()
            .append_pair("type", &kind.plex_type().to_string());
        if matches!(variant, ListVariant::WithGuids) {
            url.query_pairs_mut().append_pair("includeGuids", "1");
        }
        url.query_pairs_mut().append_pair(TOKEN_PARAM, token);

        let logged_url = redact_url(&url);
        trace!(target: "plex", "GET {}", logged_url);

        let request = self.authorized(self.client.get(url), token, "application/json, application/xml");
        let (status, body) = send_with_deadline(request, &logged_url, self.list_timeout).await?;
        ensure_success(status, &body)?;

        parse_watchlist_document(&body)
    }

    async fn try_removal(
        &self,
        host: &str,
        token: &str,
        external_id: &str,
        shape: &RemovalShape,
    ) -> Result<()> {
        let mut url = endpoint(host, shape.path, Some(external_id))?;
        if shape.rating_key_in_query {
            url.query_pairs_mut().append_pair("ratingKey", external_id);
        }
        url.query_pairs_mut().append_pair(TOKEN_PARAM, token);

        let method = shape.verb.method();
        let logged_url = redact_url(&url);
        trace!(target: "plex", "{} {}", method, logged_url);

        let request = self.authorized(self.client.request(method, url), token, "application/json");
        let (status, body) = send_with_deadline(request, &logged_url, self.removal_timeout).await?;
        ensure_success(status, &body)
    }

    fn authorized(&self, request: RequestBuilder, token: &str, accept: &str) -> RequestBuilder {
        self.identity
            .header_pairs()
            .into_iter()
            .fold(request.header("Accept", accept), |request, (name, value)| {
                request.header(name, value)
            })
            .header(TOKEN_PARAM, token)
    }
}

/// Build `{host}{template}` with `{id}` replaced by the percent-encoded id.
fn endpoint(host: &str, template: &str, id: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(host.trim_end_matches('/'))
        .map_err(|e| PlexError::InvalidUrl(format!("{}: {}", host, e)))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| PlexError::InvalidUrl(format!("{} cannot be a base URL", host)))?;
        segments.pop_if_empty();
        for segment in template.split('/').filter(|segment| !segment.is_empty()) {
            match (segment, id) {
                ("{id}", Some(id)) => segments.push(id),
                ("{id}", None) => {
                    return Err(PlexError::InvalidUrl(format!(
                        "{} requires an item id",
                        template
                    )))
                }
                (segment, _) => segments.push(segment),
            };
        }
    }

    Ok(url)
}

/// Send `request` and read its body under one deadline. Dropping the future on
/// timeout cancels the call. Transport errors only ever mention `logged_url`.
async fn send_with_deadline(
    request: RequestBuilder,
    logged_url: &str,
    deadline: Duration,
) -> Result<(StatusCode, String)> {
    let call = async {
        let response = request
            .send()
            .await
            .map_err(|e| PlexError::transport(logged_url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlexError::transport(logged_url, e))?;
        Ok::<_, PlexError>((status, body))
    };

    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| PlexError::Timeout(deadline))?
}

fn ensure_success(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    Err(PlexError::ApiError {
        status: status.as_u16(),
        message,
    })
}

/// Builder for configuring a Plex watchlist client.
#[derive(Debug)]
pub struct PlexWatchlistClientBuilder {
    hosts: Vec<String>,
    identity: Option<Arc<ClientIdentity>>,
    list_timeout: Duration,
    removal_timeout: Duration,
    connect_timeout: Duration,
}

impl Default for PlexWatchlistClientBuilder {
    fn default() -> Self {
        Self {
            hosts: vec![DISCOVER_HOST.to_string(), METADATA_HOST.to_string()],
            identity: None,
            list_timeout: Duration::from_secs(20),
            removal_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl PlexWatchlistClientBuilder {
    /// Replace the probed hosts (useful for testing with mock servers).
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts
            .into_iter()
            .map(|host| host.into().trim_end_matches('/').to_string())
            .collect();
        self
    }

    /// Share an already-built identity instead of generating one.
    pub fn identity(mut self, identity: Arc<ClientIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Deadline for each list probe.
    pub fn list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = timeout;
        self
    }

    /// Deadline for each removal probe.
    pub fn removal_timeout(mut self, timeout: Duration) -> Self {
        self.removal_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build the watchlist client.
    pub fn build(self) -> Result<PlexWatchlistClient> {
        let client = Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(PlexError::ClientBuild)?;

        Ok(PlexWatchlistClient {
            client,
            hosts: self.hosts,
            identity: self
                .identity
                .unwrap_or_else(|| Arc::new(ClientIdentity::default())),
            list_timeout: self.list_timeout,
            removal_timeout: self.removal_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_item_id() {
        let url = endpoint(
            "https://discover.provider.plex.tv/",
            "/library/metadata/{id}/actions/removeFromWatchlist",
            Some("abc/123"),
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://discover.provider.plex.tv/library/metadata/abc%2F123/actions/removeFromWatchlist"
        );
    }

    #[test]
    fn endpoint_keeps_host_path_prefix() {
        let url = endpoint("http://127.0.0.1:8080/plex", WATCHLIST_PATH, None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/plex/library/sections/watchlist/all"
        );
    }

    #[test]
    fn endpoint_rejects_missing_id() {
        assert!(matches!(
            endpoint(DISCOVER_HOST, "/library/sections/watchlist/items/{id}", None),
            Err(PlexError::InvalidUrl(_))
        ));
    }

    #[test]
    fn fourteen_removal_probes_per_item() {
        assert_eq!(REMOVAL_SHAPES.len() * 2, 14);
        assert!(matches!(REMOVAL_SHAPES[6].verb, Verb::Delete));
    }

    #[tokio::test]
    async fn removal_connection_error_is_redacted_through_source_chain() {
        let client = PlexWatchlistClient::builder()
            .hosts(["http://127.0.0.1:1"])
            .build()
            .unwrap();

        let error = client
            .try_removal("http://127.0.0.1:1", "SUPERSECRET", "42", &REMOVAL_SHAPES[0])
            .await
            .unwrap_err();
        assert!(matches!(error, PlexError::RequestFailed { .. }));

        let mut rendered = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(inner) = source {
            rendered.push_str(&format!(": {}", inner));
            source = inner.source();
        }

        assert!(!rendered.contains("SUPERSECRET"), "token leaked: {}", rendered);
        assert!(rendered.contains("X-Plex-Token=REDACTED"));
        assert!(rendered.contains("ratingKey=42"));
    }

    #[test]
    fn error_bodies_are_truncated() {
        let body = "x".repeat(1_000);
        match ensure_success(StatusCode::BAD_GATEWAY, &body) {
            Err(PlexError::ApiError { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), ERROR_BODY_LIMIT);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
