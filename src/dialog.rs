//! Modal dialogs for errors and permission requests.
//!
//! macOS uses `display dialog` through `osascript`. Other platforms show a
//! notification instead.

use crate::i18n::{Language, Message};
use crate::permissions::Permission;

/// Show a blocking error dialog with a single OK button.
pub fn show_error(title: &str, message: &str) {
    platform::show_error(title, message);
}

/// Show a blocking informational dialog with a single OK button.
pub fn show_info(title: &str, message: &str) {
    platform::show_info(title, message);
}

/// Explain a missing permission and offer to open the matching settings
/// pane. Blocks until the user answers.
pub fn show_permission_request(permission: Permission, language: Language) {
    let title = language.text(Message::PermissionTitle);
    let message = permission.explanation(language);
    let open_label = language.text(Message::OpenSettings);
    let dismiss_label = language.text(Message::Dismiss);

    log::info!("{} permission missing; asking the user", permission);
    if platform::ask(title, message, open_label, dismiss_label) {
        open_settings(permission);
    }
}

/// Open the System Settings pane for `permission`.
pub fn open_settings(permission: Permission) {
    let url = permission.settings_url();
    #[cfg(target_os = "macos")]
    {
        match std::process::Command::new("open").arg(url).status() {
            Ok(status) if status.success() => log::debug!("Opened {}", url),
            Ok(status) => log::warn!("open {} exited with {}", url, status),
            Err(e) => log::warn!("Failed to run open {}: {}", url, e),
        }
    }
    #[cfg(not(target_os = "macos"))]
    {
        log::info!("Grant {} in the system settings ({})", permission, url);
    }
}

/// `display dialog` statement; `default` is the button bound to Return.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn dialog_script(title: &str, message: &str, buttons: &[&str], default: &str, icon: &str) -> String {
    use crate::util::{applescript_list, applescript_string};

    format!(
        "display dialog {} with title {} buttons {} default button {} with icon {}",
        applescript_string(message),
        applescript_string(title),
        applescript_list(buttons),
        applescript_string(default),
        icon
    )
}

#[cfg(target_os = "macos")]
mod platform {
    use super::dialog_script;
    use crate::util::run_osascript;

    pub fn show_error(title: &str, message: &str) {
        let script = dialog_script(title, message, &["OK"], "OK", "stop");
        if let Err(e) = run_osascript(&script) {
            log::warn!("Failed to show error dialog: {}", e);
        }
    }

    pub fn show_info(title: &str, message: &str) {
        let script = dialog_script(title, message, &["OK"], "OK", "note");
        if let Err(e) = run_osascript(&script) {
            log::warn!("Failed to show dialog: {}", e);
        }
    }

    /// Returns true when the affirmative button was pressed.
    pub fn ask(title: &str, message: &str, accept: &str, dismiss: &str) -> bool {
        let script = dialog_script(title, message, &[dismiss, accept], accept, "caution");
        match run_osascript(&script) {
            Ok(output) if output.status.success() => {
                let answer = String::from_utf8_lossy(&output.stdout);
                answer.contains(&format!("button returned:{}", accept))
            }
            Ok(_) => false,
            Err(e) => {
                log::warn!("Failed to show permission dialog: {}", e);
                false
            }
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use crate::notification::send_notification;

    fn notify(title: &str, message: &str, icon: &str) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            crate::notification::send_notification_async(
                &handle,
                title.to_string(),
                message.to_string(),
                Some(icon.to_string()),
            );
            return;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                log::warn!("Failed to create runtime for notification: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(send_notification(title, message, Some(icon))) {
            log::warn!("Failed to send notification: {}", e);
        }
    }

    pub fn show_error(title: &str, message: &str) {
        log::error!("{}: {}", title, message);
        notify(title, message, "dialog-error");
    }

    pub fn show_info(title: &str, message: &str) {
        log::info!("{}: {}", title, message);
        notify(title, message, "dialog-information");
    }

    pub fn ask(title: &str, message: &str, _accept: &str, _dismiss: &str) -> bool {
        log::warn!("{}: {}", title, message);
        notify(title, message, "dialog-warning");
        false
    }
}
