// Pilot Configuration
//
// *La Configuration* (The Configuration) - Settings for the control loop and its collaborators

use crate::monitor::DEFAULT_POWER_SUPPLY_DIR;
use crate::switcher::PlanTokenMap;
use anyhow::{Context, Result};
use lemoteur::{AppCatalog, DEFAULT_HEAVY_APPS, DEFAULT_LIGHT_APPS};
use lemotif::{DEFAULT_CAPACITY, DEFAULT_PATTERNS_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory (under the home directory) holding config and data
pub const DEFAULT_DATA_DIR: &str = ".lepilote";

/// Configuration file name inside the data directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Usage ledger file name inside the data directory
pub const DEFAULT_LEDGER_FILE: &str = "usage.db";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PiloteConfig {
    /// Control loop timing and gating
    pub control: ControlConfig,

    /// Where patterns and usage data live
    pub storage: StorageConfig,

    /// Profile tokens and external switch commands
    pub plans: PlansConfig,

    /// Application catalog overrides
    pub apps: AppsConfig,

    /// System monitor sources
    pub monitor: MonitorConfig,
}

impl PiloteConfig {
    /// Default configuration file location (`~/.lepilote/config.toml`)
    pub fn default_path() -> PathBuf {
        default_data_dir().join(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from `path`, or from the default location
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        if !config_path.exists() {
            return Ok(PiloteConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: PiloteConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", config_path))?;

        Ok(config)
    }

    /// Save configuration as pretty TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Reject settings the control loop cannot run with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let control = &self.control;
        if control.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("tick_interval_secs must be positive".into()));
        }
        if control.usage_interval_secs == 0 {
            return Err(ConfigError::Invalid("usage_interval_secs must be positive".into()));
        }
        if !(0.0..=1.0).contains(&control.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within 0.0..=1.0, got {}",
                control.confidence_threshold
            )));
        }
        if self.storage.max_exemplars == 0 {
            return Err(ConfigError::Invalid("max_exemplars must be positive".into()));
        }
        if self.plans.set_command.is_empty() {
            return Err(ConfigError::Invalid("plans.set_command must not be empty".into()));
        }
        if self.plans.query_command.is_empty() {
            return Err(ConfigError::Invalid("plans.query_command must not be empty".into()));
        }
        if !self.plans.set_command.iter().any(|arg| arg.contains(TOKEN_PLACEHOLDER)) {
            return Err(ConfigError::Invalid(format!(
                "plans.set_command must contain the {} placeholder",
                TOKEN_PLACEHOLDER
            )));
        }
        self.plans.token_map().map(|_| ())
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Path of the persisted exemplars
    pub fn patterns_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.patterns_file)
    }

    /// Path of the usage ledger database
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.ledger_file)
    }

    /// Application catalog with any overrides applied
    pub fn catalog(&self) -> AppCatalog {
        let heavy: Vec<String> = match &self.apps.heavy {
            Some(apps) => apps.clone(),
            None => DEFAULT_HEAVY_APPS.iter().map(|a| a.to_string()).collect(),
        };
        let light: Vec<String> = match &self.apps.light {
            Some(apps) => apps.clone(),
            None => DEFAULT_LIGHT_APPS.iter().map(|a| a.to_string()).collect(),
        };
        AppCatalog::new(heavy, light)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DATA_DIR)
}

/// Control loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    /// Seconds between observation ticks
    pub tick_interval_secs: u64,

    /// Seconds between usage-minute accumulations
    pub usage_interval_secs: u64,

    /// Minimum seconds between two automatic switches
    pub min_switch_interval_secs: u64,

    /// Minimum confidence for an automatic switch
    pub confidence_threshold: f64,

    /// Whether recommendations are applied automatically
    pub auto_switch: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            usage_interval_secs: 60,
            min_switch_interval_secs: 60,
            confidence_threshold: 0.70,
            auto_switch: true,
        }
    }
}

impl ControlConfig {
    /// Observation period
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Usage accumulation period
    pub fn usage_interval(&self) -> Duration {
        Duration::from_secs(self.usage_interval_secs)
    }

    /// Cooldown between automatic switches
    pub fn min_switch_interval(&self) -> Duration {
        Duration::from_secs(self.min_switch_interval_secs)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory, `~/.lepilote` when unset
    pub data_dir: Option<PathBuf>,

    /// Exemplar file name inside the data directory
    pub patterns_file: String,

    /// Usage ledger file name inside the data directory
    pub ledger_file: String,

    /// Maximum number of stored exemplars
    pub max_exemplars: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            patterns_file: DEFAULT_PATTERNS_FILE.to_string(),
            ledger_file: DEFAULT_LEDGER_FILE.to_string(),
            max_exemplars: DEFAULT_CAPACITY,
        }
    }
}

/// Placeholder replaced by the profile token in `set_command`
pub const TOKEN_PLACEHOLDER: &str = "{token}";

/// Windows "High performance" scheme GUID
pub const HIGH_PERFORMANCE_GUID: &str = "8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c";
/// Windows "Balanced" scheme GUID
pub const BALANCED_GUID: &str = "381b4222-f694-41f0-9685-ff5bb260df2e";
/// Windows "Power saver" scheme GUID
pub const POWER_SAVER_GUID: &str = "a1841308-3541-4fab-bc81-f71556f20b4a";

/// Profile tokens and the external commands that apply and query them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlansConfig {
    /// Token the OS layer uses for the high performance profile
    pub high_performance: String,

    /// Token the OS layer uses for the balanced profile
    pub balanced: String,

    /// Token the OS layer uses for the power saver profile
    pub power_saver: String,

    /// Command that activates a profile; `{token}` is substituted
    pub set_command: Vec<String>,

    /// Command whose output names the active profile token
    pub query_command: Vec<String>,
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            high_performance: HIGH_PERFORMANCE_GUID.to_string(),
            balanced: BALANCED_GUID.to_string(),
            power_saver: POWER_SAVER_GUID.to_string(),
            set_command: vec![
                "powercfg".to_string(),
                "/setactive".to_string(),
                TOKEN_PLACEHOLDER.to_string(),
            ],
            query_command: vec!["powercfg".to_string(), "/getactivescheme".to_string()],
        }
    }
}

impl PlansConfig {
    /// Bidirectional profile/token table
    pub fn token_map(&self) -> std::result::Result<PlanTokenMap, ConfigError> {
        PlanTokenMap::new(
            self.high_performance.clone(),
            self.balanced.clone(),
            self.power_saver.clone(),
        )
    }
}

/// Optional application catalog overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppsConfig {
    /// Replaces the built-in heavy application list
    pub heavy: Option<Vec<String>>,

    /// Replaces the built-in light application list
    pub light: Option<Vec<String>>,
}

/// Where the system monitor reads battery and foreground-app data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Power supply class directory holding `BAT*` entries
    pub power_supply_dir: PathBuf,

    /// Command printing the foreground process as a PID or a name;
    /// empty disables lookup and reports "unknown"
    pub foreground_command: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            power_supply_dir: PathBuf::from(DEFAULT_POWER_SUPPLY_DIR),
            foreground_command: vec![
                "xdotool".to_string(),
                "getactivewindow".to_string(),
                "getwindowpid".to_string(),
            ],
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration contains invalid values or settings
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
