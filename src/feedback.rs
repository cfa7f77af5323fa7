//! User-facing feedback for pipeline outcomes.

use crate::capture::{CaptureError, CaptureFeedback, CaptureResult};
use crate::dialog;
use crate::i18n::{LanguageSetting, Message};
use crate::notification;

/// Posts a notification on success and shows an error dialog on
/// user-visible failures, in the currently selected language.
pub struct DesktopFeedback {
    runtime: tokio::runtime::Handle,
    language: LanguageSetting,
    notify_on_success: bool,
}

impl DesktopFeedback {
    pub fn new(
        runtime: tokio::runtime::Handle,
        language: LanguageSetting,
        notify_on_success: bool,
    ) -> Self {
        Self {
            runtime,
            language,
            notify_on_success,
        }
    }
}

impl CaptureFeedback for DesktopFeedback {
    fn published(&self, result: &CaptureResult) {
        if !self.notify_on_success {
            return;
        }

        let language = self.language.get();
        let body = format!(
            "{} ({}×{})",
            language.text(Message::CaptureCopiedBody),
            result.width,
            result.height
        );
        notification::send_notification_async(
            &self.runtime,
            language.text(Message::CaptureCopiedTitle).to_string(),
            body,
            Some("edit-copy".to_string()),
        );
    }

    fn failed(&self, error: &CaptureError) {
        let title = self.language.text(Message::CaptureFailedTitle);
        let message = error.to_string();
        // The dialog blocks until dismissed; keep it off the capture worker.
        self.runtime.spawn_blocking(move || dialog::show_error(title, &message));
    }
}
