use curator_application::{MatchedBy, WatchlistReconciler};
use curator_plex::{ClientIdentity, PlexWatchlistClient};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "integration-token";

fn reconciler_for(servers: &[&MockServer]) -> WatchlistReconciler {
    let client = PlexWatchlistClient::builder()
        .hosts(servers.iter().map(|server| server.uri()))
        .identity(Arc::new(ClientIdentity::with_identifier(Some(
            "integration-client".to_string(),
        ))))
        .build()
        .unwrap();

    WatchlistReconciler::new(Arc::new(client))
}

async fn mount_watchlist(server: &MockServer, plex_type: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/library/sections/watchlist/all"))
        .and(query_param("type", plex_type))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_remove_film_end_to_end() {
    let server = MockServer::start().await;

    mount_watchlist(
        &server,
        "1",
        json!({
            "MediaContainer": {
                "Metadata": [
                    { "ratingKey": "101", "title": "Inception", "year": 2010 },
                    { "ratingKey": "102", "title": "Heat", "year": 1995 }
                ]
            }
        }),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/actions/removeFromWatchlist"))
        .and(query_param("ratingKey", "101"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconciler_for(&[&server])
        .remove_film_by_title(TOKEN, "Inception", Some(2010), false)
        .await
        .unwrap();

    assert_eq!(outcome.matched_by, MatchedBy::Normalized);
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.sample[0].external_id, "101");
    assert_eq!(outcome.base_host_tried, Some(server.uri()));
}

#[tokio::test]
async fn test_dry_run_sends_no_removal_requests() {
    let server = MockServer::start().await;

    mount_watchlist(
        &server,
        "2",
        json!({
            "MediaContainer": {
                "Directory": { "ratingKey": "201", "title": "The Expanse", "type": "show" }
            }
        }),
    )
    .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = reconciler_for(&[&server])
        .remove_series_by_title(TOKEN, "the expanse", true)
        .await
        .unwrap();

    assert_eq!(outcome.matched_by, MatchedBy::Normalized);
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.removed, 0);
}

#[tokio::test]
async fn test_failed_removal_is_reported_in_counts() {
    let server = MockServer::start().await;

    mount_watchlist(
        &server,
        "1",
        json!({
            "MediaContainer": {
                "Metadata": [{ "ratingKey": "301", "title": "Heat", "year": 1995 }]
            }
        }),
    )
    .await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .with_priority(10)
        .expect(7)
        .mount(&server)
        .await;

    let outcome = reconciler_for(&[&server])
        .remove_film_by_title(TOKEN, "heat", None, false)
        .await
        .unwrap();

    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.removed, 0);
    assert!(!outcome.is_complete());
}

#[tokio::test]
async fn test_unavailable_watchlist_surfaces_error() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let result = reconciler_for(&[&server])
        .remove_film_by_title(TOKEN, "Heat", None, false)
        .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("2 attempts"));
}
