//! Display language preference and the handful of strings blackshot shows itself.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// Language used for menu labels, notifications, and dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Language {
    /// English
    #[default]
    #[serde(rename = "en")]
    English,
    /// Simplified Chinese
    #[serde(rename = "zh-Hans")]
    SimplifiedChinese,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::SimplifiedChinese];

    /// Identifier stored in the config file and accepted on the command line.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::SimplifiedChinese => "zh-Hans",
        }
    }

    /// Name of the language written in that language, for menus.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::SimplifiedChinese => "简体中文",
        }
    }

    pub fn text(self, message: Message) -> &'static str {
        use Message::*;
        match self {
            Language::English => match message {
                MenuCapture => "Capture Inverted Region",
                MenuLanguage => "Language",
                MenuCheckPermissions => "Check Permissions…",
                MenuQuit => "Quit",
                CaptureCopiedTitle => "Inverted capture copied",
                CaptureCopiedBody => "The inverted image is on the clipboard.",
                CaptureFailedTitle => "Capture failed",
                HotkeyFailedTitle => "Global shortcut unavailable",
                HotkeyFailedBody => {
                    "The capture shortcut could not be registered. Grant Accessibility access and restart blackshot."
                }
                PermissionTitle => "Permission required",
                AccessibilityMissing => {
                    "blackshot needs Accessibility access to listen for its global shortcut."
                }
                ScreenRecordingMissing => {
                    "blackshot needs Screen Recording access to capture the screen."
                }
                PermissionsGranted => "All required permissions are granted.",
                OpenSettings => "Open System Settings",
                Dismiss => "Not Now",
            },
            Language::SimplifiedChinese => match message {
                MenuCapture => "截取反色区域",
                MenuLanguage => "语言",
                MenuCheckPermissions => "检查权限…",
                MenuQuit => "退出",
                CaptureCopiedTitle => "反色截图已复制",
                CaptureCopiedBody => "反色图片已放入剪贴板。",
                CaptureFailedTitle => "截图失败",
                HotkeyFailedTitle => "全局快捷键不可用",
                HotkeyFailedBody => "无法注册截图快捷键。请授予辅助功能权限后重新启动 blackshot。",
                PermissionTitle => "需要权限",
                AccessibilityMissing => "blackshot 需要辅助功能权限才能监听全局快捷键。",
                ScreenRecordingMissing => "blackshot 需要屏幕录制权限才能截取屏幕。",
                PermissionsGranted => "所有必需的权限均已授予。",
                OpenSettings => "打开系统设置",
                Dismiss => "稍后",
            },
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "zh-hans" | "zh-cn" | "chinese" => Ok(Language::SimplifiedChinese),
            other => Err(format!(
                "unknown language '{other}' (expected one of: en, zh-Hans)"
            )),
        }
    }
}

/// Strings presented by the menu, notifications, and dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    MenuCapture,
    MenuLanguage,
    MenuCheckPermissions,
    MenuQuit,
    CaptureCopiedTitle,
    CaptureCopiedBody,
    CaptureFailedTitle,
    HotkeyFailedTitle,
    HotkeyFailedBody,
    PermissionTitle,
    AccessibilityMissing,
    ScreenRecordingMissing,
    PermissionsGranted,
    OpenSettings,
    Dismiss,
}

/// Currently selected language, shared between the event loop (the only
/// writer) and the feedback paths that read it.
#[derive(Debug, Clone, Default)]
pub struct LanguageSetting {
    current: Arc<RwLock<Language>>,
}

impl LanguageSetting {
    pub fn new(language: Language) -> Self {
        Self {
            current: Arc::new(RwLock::new(language)),
        }
    }

    pub fn get(&self) -> Language {
        match self.current.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set(&self, language: Language) {
        match self.current.write() {
            Ok(mut guard) => *guard = language,
            Err(poisoned) => *poisoned.into_inner() = language,
        }
    }

    pub fn text(&self, message: Message) -> &'static str {
        self.get().text(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert_eq!(
            "zh-hans".parse::<Language>().unwrap(),
            Language::SimplifiedChinese
        );
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn code_round_trips_through_from_str() {
        for language in Language::ALL {
            assert_eq!(language.code().parse::<Language>().unwrap(), language);
        }
    }

    #[test]
    fn setting_is_shared_between_clones() {
        let setting = LanguageSetting::new(Language::English);
        let reader = setting.clone();
        setting.set(Language::SimplifiedChinese);
        assert_eq!(reader.get(), Language::SimplifiedChinese);
        assert_eq!(reader.text(Message::MenuQuit), "退出");
    }

    #[test]
    fn serializes_with_config_codes() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            language: Language,
        }

        let text = toml::to_string(&Wrapper {
            language: Language::SimplifiedChinese,
        })
        .unwrap();
        assert!(text.contains("\"zh-Hans\""));
        let parsed: Wrapper = toml::from_str("language = \"en\"").unwrap();
        assert_eq!(parsed.language, Language::English);
    }
}
