//! Tests for the HTTP catalog provider.
//!
//! These tests use mock servers to verify provider behavior without
//! requiring a real catalog server.

use reverie_catalog::{CatalogError, CatalogProvider, HttpCatalogProvider, ProviderConfig, TrackId};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> HttpCatalogProvider {
    HttpCatalogProvider::new(ProviderConfig::new(format!("{}/api/tracks", server.uri()))).unwrap()
}

// =============================================================================
// Successful Fetches
// =============================================================================

mod fetch {
    use super::*;

    #[tokio::test]
    async fn test_fetches_track_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 1,
                    "title": "Glass Harbor",
                    "artist": "Tidewater",
                    "durationSeconds": 180,
                    "sourceLocator": "/music/glass-harbor.mp3",
                    "coverArt": null
                },
                {
                    "id": 2,
                    "title": "Salt Lines",
                    "artist": "Tidewater",
                    "durationSeconds": 200,
                    "sourceLocator": "/music/salt-lines.mp3"
                }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let catalog = provider_for(&mock_server).fetch_tracks().await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.ids(), vec![TrackId::new(1), TrackId::new(2)]);
        assert_eq!(catalog.at(1).unwrap().duration_seconds, 200.0);
    }

    #[tokio::test]
    async fn test_accepts_legacy_payload_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "title": "Old Shape", "artist": "Unknown Artist", "duration": 61, "url": "/music/old.mp3"}
            ])))
            .mount(&mock_server)
            .await;

        let catalog = provider_for(&mock_server).fetch_tracks().await.unwrap();
        let track = catalog.at(0).unwrap();

        assert_eq!(track.source_locator, "/music/old.mp3");
        assert_eq!(track.duration_seconds, 61.0);
    }

    #[tokio::test]
    async fn test_empty_list_is_an_empty_catalog() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let catalog = provider_for(&mock_server).fetch_tracks().await.unwrap();
        assert!(catalog.is_empty());
    }
}

// =============================================================================
// Failure Handling
// =============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_error_payload_with_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Failed to read music directory"
            })))
            .mount(&mock_server)
            .await;

        let result = provider_for(&mock_server).fetch_tracks().await;

        match result.unwrap_err() {
            CatalogError::Provider { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "Failed to read music directory");
            }
            e => panic!("Expected Provider error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        match provider_for(&mock_server).fetch_tracks().await.unwrap_err() {
            CatalogError::Provider { status, message } => {
                assert_eq!(status, Some(503));
                assert!(message.contains("Service Unavailable"));
            }
            e => panic!("Expected Provider error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_success_with_object_body_is_invalid() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"tracks": [], "total": 0})),
            )
            .mount(&mock_server)
            .await;

        let result = provider_for(&mock_server).fetch_tracks().await;
        assert!(matches!(result, Err(CatalogError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_success_with_error_object_is_provider_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "busy"})),
            )
            .mount(&mock_server)
            .await;

        let result = provider_for(&mock_server).fetch_tracks().await;
        assert!(matches!(result, Err(CatalogError::Provider { status: None, .. })));
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let result = provider_for(&mock_server).fetch_tracks().await;
        assert!(matches!(result, Err(CatalogError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = HttpCatalogProvider::new(
            ProviderConfig::new("http://127.0.0.1:9/api/tracks")
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let result = provider.fetch_tracks().await;
        assert!(matches!(result, Err(CatalogError::Request(_))));
    }
}
