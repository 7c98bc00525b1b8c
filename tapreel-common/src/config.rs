//! Bootstrap configuration loading and resolution
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `TAPREEL_CONFIG` environment variable
//! 3. User config file (`<config dir>/tapreel/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! Only the file location is resolved in that order; the file itself is
//! a single document, and any key it leaves out falls back to its default.

use crate::fade_curves::FadeCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TAPREEL_CONFIG";

/// Clips shipped with the original presentation
pub const DEFAULT_PLAYLIST: &[&str] = &[
    "Part_01_edited_v3.mp4",
    "STUK_Flipping__Sequence(Prolonged backside)_v5.mp4",
    "STUK_Flipping_back__Sequence(Prolonged)_v2.mp4",
];

/// Page shell assets pre-cached for offline use
pub const DEFAULT_SHELL_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./styles.css",
    "./app.js",
    "./manifest.json",
];

/// Complete bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapreelConfig {
    /// Ordered clip locators; insertion order is playback order
    #[serde(default = "default_playlist")]
    pub playlist: Vec<String>,

    #[serde(default)]
    pub transition: TransitionConfig,

    #[serde(default)]
    pub preload: PreloadConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Crossfade and advance behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Single crossfade duration used for both the outgoing and incoming slot
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,

    #[serde(default)]
    pub fade_curve: FadeCurve,

    /// What happens to an advance that arrives mid-transition
    #[serde(default)]
    pub busy_policy: BusyPolicy,

    /// Which source drives advances once the session has started
    #[serde(default)]
    pub advance_mode: AdvanceMode,
}

/// Policy for advance commands arriving while a transition is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Drop the command
    #[default]
    Ignore,
    /// Remember at most one command and run it when the transition settles
    Defer,
}

/// Source of advance commands after the first interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// Every user gesture advances
    #[default]
    Tap,
    /// The end of a non-looping clip advances; taps only start the session
    ClipEnd,
}

/// Preload behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Deadline for every slot to become ready
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Platform priming requirement
    #[serde(default)]
    pub priming: PrimingSetting,

    /// Platform hint consulted only when `priming = "auto"`
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Priming configuration value, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimingSetting {
    /// Decide from the user agent hint
    #[default]
    Auto,
    /// No priming
    None,
    /// Issue an explicit load before waiting for readiness
    ForceLoad,
    /// Play then immediately pause once readiness is reached
    PlayPause,
}

/// Input de-duplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Window in which a click and a touchstart count as one gesture
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Offline asset cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Name of the current cache generation
    #[serde(default = "default_cache_name")]
    pub name: String,

    /// Fixed asset list installed into the cache
    #[serde(default = "default_cache_assets")]
    pub assets: Vec<String>,
}

fn default_playlist() -> Vec<String> {
    DEFAULT_PLAYLIST.iter().map(|s| s.to_string()).collect()
}

fn default_fade_ms() -> u64 {
    500
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_dedup_window_ms() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_name() -> String {
    "tapreel-cache-v1".to_string()
}

fn default_cache_assets() -> Vec<String> {
    DEFAULT_SHELL_ASSETS.iter().map(|s| s.to_string()).collect()
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_ms: default_fade_ms(),
            fade_curve: FadeCurve::default(),
            busy_policy: BusyPolicy::default(),
            advance_mode: AdvanceMode::default(),
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            priming: PrimingSetting::default(),
            user_agent: None,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: default_dedup_window_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: default_cache_name(),
            assets: default_cache_assets(),
        }
    }
}

impl Default for TapreelConfig {
    fn default() -> Self {
        Self {
            playlist: default_playlist(),
            transition: TransitionConfig::default(),
            preload: PreloadConfig::default(),
            input: InputConfig::default(),
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl TapreelConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TapreelConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the config file location and load it
    ///
    /// A path named on the command line or in `TAPREEL_CONFIG` must exist
    /// and be valid. Without one, the platform config file is used if
    /// present, otherwise the compiled defaults.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) => Self::load(&path),
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject configurations the presentation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.playlist.is_empty() {
            return Err(Error::Config(
                "playlist must contain at least one clip".to_string(),
            ));
        }
        if let Some(blank) = self.playlist.iter().position(|s| s.trim().is_empty()) {
            return Err(Error::Config(format!("playlist entry {} is blank", blank)));
        }
        if self.transition.fade_ms == 0 {
            return Err(Error::Config("transition.fade_ms must be > 0".to_string()));
        }
        if self.preload.timeout_ms == 0 {
            return Err(Error::Config("preload.timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.transition.fade_ms)
    }

    pub fn preload_timeout(&self) -> Duration {
        Duration::from_millis(self.preload.timeout_ms)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.input.dedup_window_ms)
    }
}

/// Resolve the config file location following the priority order above
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config file, only if it exists
    default_config_file().filter(|p| p.exists())
}

/// Platform config file path (`~/.config/tapreel/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tapreel").join("config.toml"))
}
