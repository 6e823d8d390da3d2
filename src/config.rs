//! Application-level configuration loading for the coordination core.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the core looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "REELMATCH_CONFIG_PATH";

/// Maximum members per room.
const DEFAULT_ROOM_CAPACITY: usize = 10;
/// Collision retries when minting a room code.
const DEFAULT_CODE_ATTEMPTS: usize = 5;
/// Catalog locale.
const DEFAULT_LOCALE: &str = "en-US";
/// Size of the window the initial catalog page is drawn from.
const DEFAULT_PAGE_WINDOW: u32 = 100;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across sessions.
pub struct AppConfig {
    /// Maximum members admitted into a room.
    pub room_capacity: usize,
    /// How many random codes the minter probes before giving up.
    pub code_attempts: usize,
    /// Locale forwarded to catalog fetches.
    pub locale: String,
    /// Initial catalog pages are drawn from `1..=page_window`.
    pub page_window: u32,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room_capacity: DEFAULT_ROOM_CAPACITY,
            code_attempts: DEFAULT_CODE_ATTEMPTS,
            locale: DEFAULT_LOCALE.to_string(),
            page_window: DEFAULT_PAGE_WINDOW,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`]. Every field is optional.
struct RawConfig {
    room_capacity: Option<usize>,
    code_attempts: Option<usize>,
    locale: Option<String>,
    page_window: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            room_capacity: raw.room_capacity.unwrap_or(defaults.room_capacity),
            code_attempts: raw.code_attempts.unwrap_or(defaults.code_attempts),
            locale: raw.locale.unwrap_or(defaults.locale),
            page_window: raw.page_window.unwrap_or(defaults.page_window),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
