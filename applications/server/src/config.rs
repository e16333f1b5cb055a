/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_library")]
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Directory scanned for audio files
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,

    /// URL prefix the audio files are served under
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// Static web UI served for every other path
    #[serde(default)]
    pub web_dir: Option<PathBuf>,
}

impl LibrarySettings {
    /// Locator a client uses to fetch `file_name`
    pub fn locator_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.mount_path.trim_end_matches('/'), file_name)
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `config.toml` in the working
    /// directory is used when present. `REVERIE_` variables override both,
    /// with `__` between sections (e.g. `REVERIE_LIBRARY__MUSIC_DIR`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (prefixed with REVERIE_)
        settings = settings.add_source(
            config::Environment::with_prefix("REVERIE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mount = self.library.mount_path.trim_end_matches('/');
        if mount.is_empty() {
            return Err(ServerError::Config(
                "Mount path must not be empty (set REVERIE_LIBRARY__MOUNT_PATH)".to_string(),
            ));
        }
        if !mount.starts_with('/') {
            return Err(ServerError::Config(format!(
                "Mount path must start with '/': {:?}",
                self.library.mount_path
            )));
        }
        if mount == "/api" || mount.starts_with("/api/") {
            return Err(ServerError::Config(format!(
                "Mount path {:?} collides with the API routes",
                self.library.mount_path
            )));
        }

        if let Some(web_dir) = &self.library.web_dir {
            if !web_dir.is_dir() {
                return Err(ServerError::Config(format!(
                    "Web directory not found at {:?}",
                    web_dir
                )));
            }
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_library() -> LibrarySettings {
    LibrarySettings {
        music_dir: default_music_dir(),
        mount_path: default_mount_path(),
        web_dir: None,
    }
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("./public/music")
}

fn default_mount_path() -> String {
    "/music".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            library: default_library(),
        }
    }
}
