//! Reverie Server Library
//!
//! Track catalog provider for the Reverie player: scans a music directory,
//! answers `GET /api/tracks` and serves the audio files themselves.
//!
//! This library exposes the router and its parts for the binary and tests.

pub mod api;
pub mod config;
pub mod error;
pub mod library;
pub mod state;

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, TraceLayer},
};

// Re-export commonly used types for convenience
pub use config::{LibrarySettings, ServerConfig};
pub use error::{Result, ServerError};
pub use library::LibraryScanner;
pub use state::AppState;

/// Build the full router
///
/// `/api/*` carries the catalog, the mount path serves the audio files and an
/// optional web directory (with `index.html` fallback) takes everything else.
pub fn create_router(settings: &LibrarySettings) -> Router {
    let app_state = AppState::new(LibraryScanner::new(settings.clone()));

    let api_routes = Router::new()
        .route("/health", get(api::health::health))
        .route("/tracks", get(api::tracks::list_tracks))
        .route("/tracks/:id", get(api::tracks::get_track));

    let mount = settings.mount_path.trim_end_matches('/');
    let mut router = Router::new()
        .nest("/api", api_routes)
        .nest_service(mount, ServeDir::new(&settings.music_dir));

    if let Some(web_dir) = &settings.web_dir {
        let index = ServeFile::new(web_dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(web_dir).fallback(index));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
