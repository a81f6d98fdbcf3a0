use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::store::default_store_path;

/// Application configuration loaded from TOML config file.
/// Every field is optional; the config file itself is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Category (facet) document. Absent means facets are empty.
    pub category_path: Option<PathBuf>,
    /// Enriched show document (overrides the XDG data default).
    pub enriched_path: Option<PathBuf>,
    /// Listening history store.
    pub history_path: Option<PathBuf>,
    /// Favorites store.
    pub favorites_path: Option<PathBuf>,
    /// Seed for random picks. Unset means a fresh seed per run.
    pub random_seed: Option<u64>,
}

impl AppConfig {
    /// Load config from `~/.config/setlist-vault/config.toml`.
    /// Returns default config if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit file, falling back to defaults (with a warning).
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                return Self::default();
            }
        };
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Category document path: config, else `categories.json` in the data dir if present.
    pub fn resolve_category_path(&self) -> Option<PathBuf> {
        self.category_path.clone().or_else(|| {
            let candidate = default_data_path("categories.json");
            candidate.exists().then_some(candidate)
        })
    }

    pub fn resolve_enriched_path(&self) -> PathBuf {
        self.enriched_path
            .clone()
            .unwrap_or_else(|| default_data_path("shows.json"))
    }

    pub fn resolve_history_path(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| default_store_path("history"))
    }

    pub fn resolve_favorites_path(&self) -> PathBuf {
        self.favorites_path
            .clone()
            .unwrap_or_else(|| default_store_path("favorites"))
    }

    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve a file in the XDG data directory.
pub fn default_data_path(file: &str) -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.data_dir().join(file)
    } else {
        // Fallback: current directory
        PathBuf::from(file)
    }
}
