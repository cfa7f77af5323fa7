//! Accessibility and Screen Recording permission checks.
//!
//! On macOS the global shortcut needs Accessibility access and
//! `screencapture` needs Screen Recording access. Other platforms have no
//! equivalent gate and report both as granted.

use std::fmt;

use crate::i18n::{Language, Message};

/// System Settings pane for Accessibility access.
pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

/// System Settings pane for Screen Recording access.
pub const SCREEN_RECORDING_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture";

/// A permission blackshot depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Accessibility,
    ScreenRecording,
}

impl Permission {
    pub fn settings_url(self) -> &'static str {
        match self {
            Permission::Accessibility => ACCESSIBILITY_SETTINGS_URL,
            Permission::ScreenRecording => SCREEN_RECORDING_SETTINGS_URL,
        }
    }

    /// Explanation shown in the permission dialog.
    pub fn explanation(self, language: Language) -> &'static str {
        match self {
            Permission::Accessibility => language.text(Message::AccessibilityMissing),
            Permission::ScreenRecording => language.text(Message::ScreenRecordingMissing),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Permission::Accessibility => "Accessibility",
            Permission::ScreenRecording => "Screen Recording",
        })
    }
}

/// Snapshot of the process's permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionState {
    pub accessibility: bool,
    pub screen_recording: bool,
}

impl PermissionState {
    /// Query the OS without prompting.
    pub fn current() -> Self {
        let state = Self {
            accessibility: platform::accessibility_trusted(),
            screen_recording: platform::screen_recording_allowed(),
        };
        log::debug!("Permission state: {:?}", state);
        state
    }

    /// Permissions that are not granted, in the order they should be asked for.
    pub fn missing(&self) -> Vec<Permission> {
        let mut missing = Vec::new();
        if !self.screen_recording {
            missing.push(Permission::ScreenRecording);
        }
        if !self.accessibility {
            missing.push(Permission::Accessibility);
        }
        missing
    }

    pub fn all_granted(&self) -> bool {
        self.accessibility && self.screen_recording
    }
}

/// Ask the OS to show its own Screen Recording prompt. Returns the state
/// after the request; the prompt only appears once per install.
pub fn request_screen_recording() -> bool {
    platform::request_screen_recording()
}

#[cfg(target_os = "macos")]
mod platform {
    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        fn AXIsProcessTrusted() -> bool;
    }

    #[link(name = "CoreGraphics", kind = "framework")]
    unsafe extern "C" {
        fn CGRequestScreenCaptureAccess() -> bool;
        fn CGPreflightScreenCaptureAccess() -> bool;
    }

    pub fn accessibility_trusted() -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    pub fn screen_recording_allowed() -> bool {
        unsafe { CGPreflightScreenCaptureAccess() }
    }

    pub fn request_screen_recording() -> bool {
        unsafe { CGRequestScreenCaptureAccess() }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    pub fn accessibility_trusted() -> bool {
        true
    }

    pub fn screen_recording_allowed() -> bool {
        true
    }

    pub fn request_screen_recording() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_screen_recording_first() {
        let state = PermissionState {
            accessibility: false,
            screen_recording: false,
        };
        assert_eq!(
            state.missing(),
            vec![Permission::ScreenRecording, Permission::Accessibility]
        );
        assert!(!state.all_granted());
    }

    #[test]
    fn granted_state_has_nothing_missing() {
        let state = PermissionState {
            accessibility: true,
            screen_recording: true,
        };
        assert!(state.missing().is_empty());
        assert!(state.all_granted());
    }

    #[test]
    fn deep_links_target_privacy_panes() {
        assert!(
            Permission::Accessibility
                .settings_url()
                .ends_with("Privacy_Accessibility")
        );
        assert!(
            Permission::ScreenRecording
                .settings_url()
                .ends_with("Privacy_ScreenCapture")
        );
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn other_platforms_report_granted() {
        assert!(PermissionState::current().all_granted());
    }
}
