//! System notifications: `osascript` on macOS, freedesktop D-Bus on Linux.

#[cfg(target_os = "linux")]
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use zbus::{Connection, proxy};

/// D-Bus interface for freedesktop Notifications.
#[cfg(target_os = "linux")]
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Send a notification.
    ///
    /// # Arguments
    /// * `app_name` - Application name
    /// * `replaces_id` - ID of notification to replace (0 for new)
    /// * `app_icon` - Icon name or path
    /// * `summary` - Notification title
    /// * `body` - Notification body text
    /// * `actions` - List of action identifiers and labels
    /// * `hints` - Additional metadata
    /// * `expire_timeout` - Timeout in milliseconds (-1 for default)
    ///
    /// # Returns
    /// Notification ID
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Send a system notification.
///
/// # Arguments
/// * `summary` - Notification title
/// * `body` - Notification body text
/// * `icon` - Optional icon name (Linux only, defaults to "edit-copy")
#[cfg(target_os = "linux")]
pub async fn send_notification(summary: &str, body: &str, icon: Option<&str>) -> Result<(), String> {
    let connection = Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session bus: {}", e))?;

    let proxy = NotificationsProxy::new(&connection)
        .await
        .map_err(|e| format!("Failed to create notifications proxy: {}", e))?;

    let icon = icon.unwrap_or("edit-copy");
    let hints = HashMap::new();

    proxy
        .notify(
            "Blackshot",
            0,
            icon,
            summary,
            body,
            vec![],
            hints,
            3000, // 3 second timeout
        )
        .await
        .map_err(|e| format!("Failed to send notification: {}", e))?;

    Ok(())
}

#[cfg(target_os = "macos")]
pub async fn send_notification(summary: &str, body: &str, _icon: Option<&str>) -> Result<(), String> {
    let script = notification_script(summary, body);
    let output = tokio::task::spawn_blocking(move || crate::util::run_osascript(&script))
        .await
        .map_err(|e| format!("Notification task failed: {}", e))?
        .map_err(|e| format!("Failed to run osascript: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("osascript failed: {}", stderr.trim()));
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub async fn send_notification(summary: &str, body: &str, _icon: Option<&str>) -> Result<(), String> {
    log::info!("{}: {}", summary, body);
    Ok(())
}

/// `display notification` statement with the app name as subtitle.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn notification_script(summary: &str, body: &str) -> String {
    use crate::util::applescript_string;

    format!(
        "display notification {} with title {} subtitle {}",
        applescript_string(body),
        applescript_string(summary),
        applescript_string("blackshot")
    )
}

/// Send a notification in the background (non-blocking).
///
/// Spawns a tokio task to send the notification and logs errors.
///
/// # Arguments
/// * `runtime_handle` - Handle to the tokio runtime
/// * `summary` - Notification title
/// * `body` - Notification body text
/// * `icon` - Optional icon name
pub fn send_notification_async(
    runtime_handle: &tokio::runtime::Handle,
    summary: String,
    body: String,
    icon: Option<String>,
) {
    runtime_handle.spawn(async move {
        let icon_ref = icon.as_deref();
        if let Err(e) = send_notification(&summary, &body, icon_ref).await {
            log::warn!("Failed to send notification: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_script_escapes_both_fields() {
        let script = notification_script("Say \"hi\"", "line");
        assert_eq!(
            script,
            "display notification \"line\" with title \"Say \\\"hi\\\"\" subtitle \"blackshot\""
        );
    }
}
