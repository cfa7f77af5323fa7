//! Configuration type definitions.

use crate::i18n::Language;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Screen capture settings.
///
/// Controls where the interactive capture is written and how long temporary
/// artifacts live after the clipboard has been updated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    /// File name of the capture inside the system temporary directory.
    /// The same file is overwritten on every capture.
    #[serde(default = "default_temp_filename")]
    pub temp_filename: String,

    /// Delay before temporary files are removed, in milliseconds
    /// (valid range: 0 - 60000)
    #[serde(default = "default_cleanup_delay_ms")]
    pub cleanup_delay_ms: u64,

    /// Replace the platform screenshot command. The output path is appended
    /// as the last argument, e.g. `["screencapture", "-i", "-s", "-t", "png"]`.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            temp_filename: default_temp_filename(),
            cleanup_delay_ms: default_cleanup_delay_ms(),
            command: None,
        }
    }
}

/// Clipboard publishing options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipboardConfig {
    /// Also offer a TIFF representation next to the PNG
    #[serde(default = "default_true")]
    pub include_tiff: bool,

    /// Write the inverted image to a temporary file and offer it as a file
    /// reference, for apps that only accept file-backed pastes
    #[serde(default = "default_true")]
    pub stage_file: bool,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            include_tiff: true,
            stage_file: true,
        }
    }
}

/// Global shortcut settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HotkeyConfig {
    /// Register the global shortcut when the daemon starts
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Key chord such as "Cmd+Shift+6"
    #[serde(default = "default_chord")]
    pub chord: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chord: default_chord(),
        }
    }
}

/// UI display preferences.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UiConfig {
    /// Language for menus, notifications, and dialogs ("en" or "zh-Hans")
    #[serde(default)]
    pub language: Language,

    /// Post a notification after every successful capture
    #[serde(default = "default_true")]
    pub notify_on_success: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            notify_on_success: true,
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_temp_filename() -> String {
    "blackshot_capture.png".to_string()
}

fn default_cleanup_delay_ms() -> u64 {
    5000
}

fn default_chord() -> String {
    "Cmd+Shift+6".to_string()
}

fn default_true() -> bool {
    true
}
