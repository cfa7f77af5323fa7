//! Menu bar (macOS) and status notifier tray (Linux) entry points.
//!
//! Both front ends offer the same menu and translate clicks into
//! [`DaemonEvent`]s; neither runs any capture work itself.

use crate::config::KeyChord;
use crate::daemon::DaemonEvent;
use crate::i18n::{Language, Message};

#[cfg(target_os = "linux")]
mod status_notifier;
#[cfg(target_os = "macos")]
mod menubar;

#[cfg(target_os = "linux")]
pub use status_notifier::{BlackshotTray, TrayHandle, start_system_tray};
#[cfg(target_os = "macos")]
pub use menubar::run_menu_bar;

pub const TRAY_ID: &str = "blackshot";
pub const ICON_SIZE: usize = 22;

/// One entry of the tray menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Action { label: &'static str, event: DaemonEvent },
    Languages {
        label: &'static str,
        options: Vec<(Language, bool)>,
    },
    Separator,
}

/// Menu contents for the current language.
pub fn menu_entries(language: Language) -> Vec<MenuEntry> {
    vec![
        MenuEntry::Action {
            label: language.text(Message::MenuCapture),
            event: DaemonEvent::Capture(crate::capture::CaptureTrigger::Menu),
        },
        MenuEntry::Separator,
        MenuEntry::Languages {
            label: language.text(Message::MenuLanguage),
            options: Language::ALL
                .iter()
                .map(|candidate| (*candidate, *candidate == language))
                .collect(),
        },
        MenuEntry::Action {
            label: language.text(Message::MenuCheckPermissions),
            event: DaemonEvent::CheckPermissions,
        },
        MenuEntry::Separator,
        MenuEntry::Action {
            label: language.text(Message::MenuQuit),
            event: DaemonEvent::Quit,
        },
    ]
}

/// Tooltip mentioning the configured shortcut.
pub fn tooltip(chord: Option<&KeyChord>) -> String {
    match chord {
        Some(chord) => format!("blackshot {} ({})", env!("CARGO_PKG_VERSION"), chord),
        None => format!("blackshot {}", env!("CARGO_PKG_VERSION")),
    }
}

/// Square RGBA icon: a circle whose left half is filled and right half is
/// outlined, suggesting inversion.
pub fn icon_rgba(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size * size * 4);
    let center = (size as f32 - 1.0) / 2.0;
    let outer = size as f32 / 2.0 - 1.0;
    let inner = outer - 2.0;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            let on = if distance > outer {
                false
            } else if dx <= 0.0 {
                true
            } else {
                distance >= inner
            };

            let alpha = if on { 255 } else { 0 };
            data.extend_from_slice(&[0, 0, 0, alpha]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_offers_capture_language_permissions_quit() {
        let entries = menu_entries(Language::English);
        let actions: Vec<&DaemonEvent> = entries
            .iter()
            .filter_map(|entry| match entry {
                MenuEntry::Action { event, .. } => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(
            actions,
            vec![
                &DaemonEvent::Capture(crate::capture::CaptureTrigger::Menu),
                &DaemonEvent::CheckPermissions,
                &DaemonEvent::Quit
            ]
        );
    }

    #[test]
    fn language_submenu_marks_current_language() {
        let entries = menu_entries(Language::SimplifiedChinese);
        let options = entries
            .iter()
            .find_map(|entry| match entry {
                MenuEntry::Languages { options, .. } => Some(options.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            options,
            vec![
                (Language::English, false),
                (Language::SimplifiedChinese, true)
            ]
        );
    }

    #[test]
    fn labels_follow_language() {
        match &menu_entries(Language::SimplifiedChinese)[0] {
            MenuEntry::Action { label, .. } => assert_eq!(*label, "截取反色区域"),
            other => panic!("unexpected first entry {other:?}"),
        }
    }

    #[test]
    fn icon_has_opaque_and_clear_pixels() {
        let icon = icon_rgba(ICON_SIZE);
        assert_eq!(icon.len(), ICON_SIZE * ICON_SIZE * 4);
        let alphas: Vec<u8> = icon.chunks(4).map(|px| px[3]).collect();
        assert!(alphas.contains(&255));
        assert!(alphas.contains(&0));
        assert_eq!(alphas[0], 0, "corners are outside the circle");
    }
}
