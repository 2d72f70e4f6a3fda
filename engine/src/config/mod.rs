//! Configuration management
//!
//! This module handles loading, validation, and management of the Valet
//! configuration. Configuration is stored in TOML format at
//! ~/.valet/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **directory**: Paths of the two directory sources that get merged
//! - **scheduling**: Meeting defaults, buffer, working hours, slot stepping
//! - **search**: Restaurant search thresholds and result limits
//! - **email**: Tone and fallback sender identity
//!
//! The scheduling numbers (default duration, buffer, working hours, slot
//! step) are deliberately configuration values rather than literals; nothing
//! in the engine depends on their exact magnitude, only on a default
//! existing.

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;

/// Main configuration structure
///
/// Represents the complete Valet configuration loaded from
/// ~/.valet/config.toml. Missing sections fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Directory source files
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Scheduling policy
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Restaurant search policy
    #[serde(default)]
    pub search: SearchConfig,

    /// Email settings
    #[serde(default)]
    pub email: EmailConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

/// Directory source configuration
///
/// Two sources are merged: a structured team contact list and a user-profile
/// store. Entries from the profile store win on email collision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Team contacts JSON file (supports ~ expansion)
    #[serde(default = "default_contacts_path")]
    pub contacts_path: PathBuf,

    /// User profiles JSON file (supports ~ expansion)
    #[serde(default = "default_profiles_path")]
    pub profiles_path: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            contacts_path: default_contacts_path(),
            profiles_path: default_profiles_path(),
        }
    }
}

/// Scheduling policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Default meeting duration in minutes when the query does not say
    #[serde(default = "default_meeting_duration")]
    pub default_duration_minutes: u32,

    /// Buffer kept free around existing events, in minutes
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: u32,

    /// Working hours start, "HH:MM"
    #[serde(default = "default_working_start")]
    pub working_hours_start: String,

    /// Working hours end, "HH:MM"
    #[serde(default = "default_working_end")]
    pub working_hours_end: String,

    /// Candidate slot stepping in minutes
    #[serde(default = "default_slot_step")]
    pub slot_step_minutes: u32,

    /// Timezone label attached to created events
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Bounded timeout for each external capability call, in seconds
    #[serde(default = "default_capability_timeout")]
    pub capability_timeout_secs: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: default_meeting_duration(),
            buffer_minutes: default_buffer_minutes(),
            working_hours_start: default_working_start(),
            working_hours_end: default_working_end(),
            slot_step_minutes: default_slot_step(),
            timezone: default_timezone(),
            capability_timeout_secs: default_capability_timeout(),
        }
    }
}

impl SchedulingConfig {
    /// Parsed working hours start
    pub fn working_start(&self) -> NaiveTime {
        parse_clock(&self.working_hours_start)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"))
    }

    /// Parsed working hours end
    pub fn working_end(&self) -> NaiveTime {
        parse_clock(&self.working_hours_end)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"))
    }

    /// Capability timeout as a std Duration
    pub fn capability_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.capability_timeout_secs)
    }
}

/// Restaurant search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum acceptable rating
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,

    /// Maximum number of options presented to the user
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_rating: default_min_rating(),
            max_results: default_max_results(),
        }
    }
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Drafting tone passed to the content generator
    #[serde(default = "default_email_tone")]
    pub tone: String,

    /// Sender address used when the requester has no profile
    #[serde(default = "default_fallback_sender")]
    pub fallback_sender: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            tone: default_email_tone(),
            fallback_sender: default_fallback_sender(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.valet")
}

fn default_contacts_path() -> PathBuf {
    PathBuf::from("~/.valet/team_contacts.json")
}

fn default_profiles_path() -> PathBuf {
    PathBuf::from("~/.valet/user_profiles.json")
}

fn default_meeting_duration() -> u32 {
    60
}

fn default_buffer_minutes() -> u32 {
    15
}

fn default_working_start() -> String {
    "09:00".to_string()
}

fn default_working_end() -> String {
    "18:00".to_string()
}

fn default_slot_step() -> u32 {
    30
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_capability_timeout() -> u64 {
    10
}

fn default_min_rating() -> f64 {
    3.5
}

fn default_max_results() -> usize {
    5
}

fn default_email_tone() -> String {
    "professional".to_string()
}

fn default_fallback_sender() -> String {
    "assistant@company.com".to_string()
}

/// Parse an "HH:MM" clock string
fn parse_clock(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            directory: DirectoryConfig::default(),
            scheduling: SchedulingConfig::default(),
            search: SearchConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.valet/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration. Validates the configuration after loading and returns
    /// descriptive errors if validation fails.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.valet/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".valet").join("config.toml"))
    }

    /// Validate and process configuration
    ///
    /// This method validates field values, expands ~ in paths, and creates
    /// the data directory if it doesn't exist.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        // Validate log level
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate working hours
        let start = parse_clock(&self.scheduling.working_hours_start).ok_or_else(|| {
            EngineError::Config(format!(
                "Invalid working_hours_start '{}'. Expected HH:MM",
                self.scheduling.working_hours_start
            ))
        })?;
        let end = parse_clock(&self.scheduling.working_hours_end).ok_or_else(|| {
            EngineError::Config(format!(
                "Invalid working_hours_end '{}'. Expected HH:MM",
                self.scheduling.working_hours_end
            ))
        })?;
        if start >= end {
            return Err(EngineError::Config(
                "working_hours_start must be before working_hours_end".to_string(),
            ));
        }

        // Validate scheduling bounds
        if self.scheduling.default_duration_minutes < 15
            || self.scheduling.default_duration_minutes > 480
        {
            return Err(EngineError::Config(
                "default_duration_minutes must be between 15 and 480".to_string(),
            ));
        }
        if self.scheduling.slot_step_minutes == 0 {
            return Err(EngineError::Config(
                "slot_step_minutes must be greater than zero".to_string(),
            ));
        }
        if self.scheduling.capability_timeout_secs == 0 {
            return Err(EngineError::Config(
                "capability_timeout_secs must be greater than zero".to_string(),
            ));
        }

        // Validate search thresholds
        if self.search.min_rating < 0.0 || self.search.min_rating > 5.0 {
            return Err(EngineError::Config(
                "min_rating must be between 0.0 and 5.0".to_string(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(EngineError::Config(
                "max_results must be greater than zero".to_string(),
            ));
        }

        // Expand paths
        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.directory.contacts_path = expand_path(&self.directory.contacts_path)?;
        self.directory.profiles_path = expand_path(&self.directory.profiles_path)?;

        // Create data directory if it doesn't exist
        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.scheduling.default_duration_minutes, 60);
        assert_eq!(config.scheduling.buffer_minutes, 15);
        assert_eq!(config.scheduling.slot_step_minutes, 30);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn test_working_hours_parse() {
        let config = Config::default();
        assert_eq!(
            config.scheduling.working_start(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            config.scheduling.working_end(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(
            config.scheduling.default_duration_minutes,
            deserialized.scheduling.default_duration_minutes
        );
    }

    #[test]
    fn test_invalid_working_hours_rejected() {
        let mut config = Config::default();
        config.scheduling.working_hours_start = "19:00".to_string();
        config.scheduling.working_hours_end = "09:00".to_string();

        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.core.log_level = "verbose".to_string();

        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let data_dir = dir.path().join("data");

        let toml = format!(
            "[core]\nlog_level = \"debug\"\ndata_dir = \"{}\"\n\n[scheduling]\ndefault_duration_minutes = 45\n",
            data_dir.display()
        );
        fs::write(&path, toml).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.scheduling.default_duration_minutes, 45);
        // Unset sections fall back to defaults
        assert_eq!(config.search.max_results, 5);
        assert!(data_dir.exists());
    }
}
