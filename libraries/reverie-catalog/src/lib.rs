//! Reverie track catalog
//!
//! Track records and the catalog they live in, plus the providers that fetch
//! them.
//!
//! # Features
//!
//! - **Validation**: only a list of well-formed track records becomes a catalog
//! - **Search**: case-insensitive title/artist filtering in catalog order
//! - **Providers**: HTTP (`GET /api/tracks`) and static in-memory sources
//!
//! # Example
//!
//! ```ignore
//! use reverie_catalog::{CatalogProvider, HttpCatalogProvider, ProviderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = HttpCatalogProvider::new(ProviderConfig::new(
//!         "http://localhost:8080/api/tracks",
//!     ))?;
//!
//!     let catalog = provider.fetch_tracks().await?;
//!     for track in catalog.search("ambient") {
//!         println!("{} - {}", track.artist, track.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod catalog;
mod error;
mod provider;
mod types;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use provider::{CatalogProvider, HttpCatalogProvider, ProviderConfig, StaticCatalogProvider};
pub use types::{CoverArt, ErrorPayload, Track, TrackId};
