//! Configuration management for Tributary.
//!
//! Configuration is read from `~/.config/tributary/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Where and how much feed state is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root. `None` means the platform data directory.
    pub directory: Option<PathBuf>,
    /// Unmarked items kept per feed on save; 0 keeps everything.
    pub default_max_items: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            default_max_items: 100,
        }
    }
}

/// Presentation settings for composed item markup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory favicons are loaded from.
    pub favicon_dir: String,
    /// Icon used when a feed has no favicon.
    pub default_icon: String,
    /// Base URL of the related-search footer link.
    pub related_search_url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            favicon_dir: "cache/favicons".to_string(),
            default_icon: "pixmaps/available.png".to_string(),
            related_search_url: "http://www.technorati.com/cosmos/search.html?url=".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            // Create default config with comments
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/tributary/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tributary").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Tributary Configuration
#
# Every setting is optional; missing entries fall back to the defaults
# shown here.

[cache]
# Root directory for cached feed state. Defaults to the platform data
# directory, e.g. ~/.local/share/tributary on Linux.
# directory = "/home/user/.local/share/tributary"

# How many unflagged items to keep per feed when saving. Flagged items
# are always kept. 0 keeps everything.
default_max_items = 100

[render]
# Directory favicons are served from.
favicon_dir = "cache/favicons"

# Icon used when a feed has no favicon of its own.
default_icon = "pixmaps/available.png"

# Base URL of the "Search related items" footer link; the item link is
# appended URL-encoded.
related_search_url = "http://www.technorati.com/cosmos/search.html?url="
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
