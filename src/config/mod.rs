//! Configuration file support for blackshot.
//!
//! Settings are loaded from `~/.config/blackshot/config.toml` (the platform
//! config directory on macOS). They cover the capture command and temporary
//! files, clipboard formats, the global shortcut, and the UI language.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod keybindings;
pub mod types;

pub use keybindings::{KeyChord, ModifierState};
pub use types::{CaptureConfig, ClipboardConfig, HotkeyConfig, UiConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MAX_CLEANUP_DELAY_MS: u64 = 60_000;

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [capture]
/// cleanup_delay_ms = 5000
///
/// [clipboard]
/// include_tiff = true
/// stage_file = true
///
/// [hotkey]
/// chord = "Cmd+Shift+6"
///
/// [ui]
/// language = "en"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Screen capture and temporary file settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Clipboard formats to publish
    #[serde(default)]
    pub clipboard: ClipboardConfig,

    /// Global shortcut
    #[serde(default)]
    pub hotkey: HotkeyConfig,

    /// Display preferences
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Validates and clamps configuration values to acceptable ranges.
    ///
    /// Invalid values are replaced and a warning is logged:
    /// - `cleanup_delay_ms`: 0 - 60000
    /// - `temp_filename`: a bare file name (no directories)
    /// - `command`: must name a program when present
    /// - `chord`: must parse, otherwise the default chord is used
    fn validate_and_clamp(&mut self) {
        if self.capture.cleanup_delay_ms > MAX_CLEANUP_DELAY_MS {
            log::warn!(
                "Invalid cleanup_delay_ms {}, clamping to 0-{} range",
                self.capture.cleanup_delay_ms,
                MAX_CLEANUP_DELAY_MS
            );
            self.capture.cleanup_delay_ms = MAX_CLEANUP_DELAY_MS;
        }

        let filename_ok = {
            let name = Path::new(&self.capture.temp_filename);
            !self.capture.temp_filename.trim().is_empty()
                && name.file_name().map(|f| f == name.as_os_str()).unwrap_or(false)
        };
        if !filename_ok {
            log::warn!(
                "Invalid temp_filename '{}', falling back to default",
                self.capture.temp_filename
            );
            self.capture.temp_filename = CaptureConfig::default().temp_filename;
        }

        if let Some(command) = &self.capture.command
            && command.first().is_none_or(|program| program.trim().is_empty())
        {
            log::warn!("Empty capture command, using the platform screenshot tool");
            self.capture.command = None;
        }

        if let Err(err) = KeyChord::parse(&self.hotkey.chord) {
            log::warn!(
                "Invalid hotkey chord '{}' ({}), falling back to default",
                self.hotkey.chord,
                err
            );
            self.hotkey.chord = HotkeyConfig::default().chord;
        }
    }

    /// The parsed global shortcut. Always valid after loading.
    pub fn chord(&self) -> KeyChord {
        KeyChord::parse(&self.hotkey.chord).unwrap_or_else(|_| KeyChord::capture_default())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("blackshot");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Loads configuration from `config_path`, or returns defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not valid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Serializes the config to TOML and writes it to `config_path`,
    /// creating the parent directory if needed.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Writes the documented example config to the user's config directory.
    ///
    /// # Errors
    /// Returns an error if a config file already exists or cannot be written.
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(&config_path, default_config)?;

        info!("Created default config at {}", config_path.display());
        Ok(config_path)
    }

    /// JSON schema describing the config file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}
