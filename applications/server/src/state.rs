/// Shared application state
use crate::library::LibraryScanner;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<LibraryScanner>,
}

impl AppState {
    pub fn new(library: LibraryScanner) -> Self {
        Self {
            library: Arc::new(library),
        }
    }
}
