/// Daemon mode implementation: menu bar agent with hotkey and signal triggers
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::capture::{CaptureDependencies, CaptureError, CaptureManager, CaptureTrigger};
use crate::config::Config;
use crate::dialog;
use crate::feedback::DesktopFeedback;
use crate::hotkey::{self, HotkeyListener};
use crate::i18n::{Language, LanguageSetting, Message};
use crate::permissions::{self, PermissionState};
#[cfg(any(target_os = "linux", target_os = "macos"))]
use crate::tray;

/// Everything the event loop reacts to. Menu clicks, the global shortcut and
/// Unix signals all funnel into one channel of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    Capture(CaptureTrigger),
    SetLanguage(Language),
    CheckPermissions,
    Quit,
}

type CaptureRunner = dyn Fn(CaptureTrigger) -> Result<(), CaptureError> + Send + Sync;
type PermissionChecker = dyn Fn(Language) + Send + Sync;

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

pub struct Daemon {
    config: Config,
    config_path: Option<PathBuf>,
    language: LanguageSetting,
    capture_runner: Arc<CaptureRunner>,
    permission_checker: Arc<PermissionChecker>,
    events_tx: mpsc::Sender<DaemonEvent>,
    events_rx: mpsc::Receiver<DaemonEvent>,
    manager: Option<CaptureManager>,
    runtime: Option<tokio::runtime::Runtime>,
    hotkey: Option<HotkeyListener>,
}

impl Daemon {
    /// Build the runtime, capture manager and feedback for `config`.
    /// `config_path` is where language changes are persisted.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("blackshot-worker")
            .build()
            .context("Failed to create Tokio runtime")?;

        let language = LanguageSetting::new(config.ui.language);
        let feedback = DesktopFeedback::new(
            runtime.handle().clone(),
            language.clone(),
            config.ui.notify_on_success,
        );
        let dependencies = CaptureDependencies::with_command(config.capture.command.clone())
            .with_feedback(Arc::new(feedback));
        let manager = CaptureManager::from_config(runtime.handle(), &config, dependencies);

        let runner_manager = manager.clone();
        let capture_runner: Arc<CaptureRunner> =
            Arc::new(move |trigger| runner_manager.request_capture(trigger));

        let mut daemon = Self::with_runners_internal(
            config,
            config_path,
            language,
            capture_runner,
            Arc::new(spawn_permission_report),
        );
        daemon.manager = Some(manager);
        daemon.runtime = Some(runtime);
        Ok(daemon)
    }

    fn with_runners_internal(
        config: Config,
        config_path: Option<PathBuf>,
        language: LanguageSetting,
        capture_runner: Arc<CaptureRunner>,
        permission_checker: Arc<PermissionChecker>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            config,
            config_path,
            language,
            capture_runner,
            permission_checker,
            events_tx,
            events_rx,
            manager: None,
            runtime: None,
            hotkey: None,
        }
    }

    #[cfg(test)]
    pub fn with_runners(
        config: Config,
        config_path: Option<PathBuf>,
        capture_runner: Arc<CaptureRunner>,
        permission_checker: Arc<PermissionChecker>,
    ) -> Self {
        let language = LanguageSetting::new(config.ui.language);
        Self::with_runners_internal(
            config,
            config_path,
            language,
            capture_runner,
            permission_checker,
        )
    }

    pub fn language(&self) -> Language {
        self.language.get()
    }

    /// Sender for producers running on other threads.
    pub fn sender(&self) -> mpsc::Sender<DaemonEvent> {
        self.events_tx.clone()
    }

    /// Events queued since the last call, without blocking.
    pub fn drain_events(&self) -> Vec<DaemonEvent> {
        self.events_rx.try_iter().collect()
    }

    /// React to one event. Returns false once the daemon should exit.
    pub fn handle_event(&mut self, event: DaemonEvent) -> bool {
        match event {
            DaemonEvent::Capture(trigger) => {
                info!("Capture requested ({:?})", trigger);
                if let Err(e) = (self.capture_runner)(trigger) {
                    error!("Failed to queue capture: {}", e);
                }
                true
            }
            DaemonEvent::SetLanguage(language) => {
                self.set_language(language);
                true
            }
            DaemonEvent::CheckPermissions => {
                (self.permission_checker)(self.language.get());
                true
            }
            DaemonEvent::Quit => false,
        }
    }

    fn set_language(&mut self, language: Language) {
        if self.language.get() == language {
            debug!("Language already set to {}", language);
            return;
        }

        info!("Switching language to {}", language);
        self.language.set(language);
        self.config.ui.language = language;

        if let Some(path) = &self.config_path
            && let Err(e) = self.config.save_to(path)
        {
            warn!("Failed to persist language preference: {:#}", e);
        }
    }

    /// Run the daemon until Quit. On macOS this hands the main thread to the
    /// menu bar event loop.
    pub fn run(mut self) -> Result<()> {
        info!("Starting blackshot daemon");
        info!("Send SIGUSR1 to capture (e.g., pkill -SIGUSR1 blackshot)");

        self.spawn_signal_listener()?;
        self.register_hotkey();
        self.check_startup_permissions();

        #[cfg(target_os = "macos")]
        {
            let tooltip = tray::tooltip(self.hotkey.as_ref().map(HotkeyListener::chord));
            tray::run_menu_bar(self, tooltip)
        }

        #[cfg(not(target_os = "macos"))]
        {
            self.run_event_loop()
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn run_event_loop(mut self) -> Result<()> {
        #[cfg(target_os = "linux")]
        let tray_handle = {
            let tooltip = tray::tooltip(self.hotkey.as_ref().map(HotkeyListener::chord));
            let tray = tray::BlackshotTray::new(self.sender(), self.language.clone(), tooltip);
            match tray::start_system_tray(tray) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("System tray unavailable, continuing without it: {:#}", e);
                    None
                }
            }
        };

        info!("Daemon ready - waiting for capture requests");

        // The daemon owns a sender, so recv only fails if that is dropped.
        while let Ok(event) = self.events_rx.recv() {
            let language_before = self.language.get();
            if !self.handle_event(event) {
                info!("Quit requested - exiting daemon");
                break;
            }

            #[cfg(target_os = "linux")]
            if let Some(handle) = &tray_handle
                && language_before != self.language.get()
            {
                handle.refresh();
            }
            #[cfg(not(target_os = "linux"))]
            let _ = language_before;
        }

        #[cfg(target_os = "linux")]
        if let Some(handle) = tray_handle {
            handle.shutdown();
        }

        self.shutdown();
        Ok(())
    }

    fn spawn_signal_listener(&self) -> Result<()> {
        let mut signals = Signals::new([SIGUSR1, SIGTERM, SIGINT])
            .context("Failed to register signal handler")?;
        let events = self.sender();

        // Runs until process exit; signals.forever() has no shutdown hook.
        thread::Builder::new()
            .name("blackshot-signals".into())
            .spawn(move || {
                for sig in signals.forever() {
                    let event = match sig {
                        SIGUSR1 => {
                            info!("Received SIGUSR1 - capturing");
                            DaemonEvent::Capture(CaptureTrigger::Signal)
                        }
                        SIGTERM | SIGINT => {
                            info!(
                                "Received {} - initiating graceful shutdown",
                                if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                            );
                            DaemonEvent::Quit
                        }
                        _ => {
                            warn!("Received unexpected signal: {}", sig);
                            continue;
                        }
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
            })
            .context("Failed to spawn signal handler thread")?;
        Ok(())
    }

    fn register_hotkey(&mut self) {
        if !self.config.hotkey.enabled {
            info!("Global shortcut disabled in config");
            return;
        }

        let chord = self.config.chord();
        let events = self.sender();
        let result = hotkey::register(&chord, move || {
            if let Err(e) = events.send(DaemonEvent::Capture(CaptureTrigger::Hotkey)) {
                warn!("Daemon is no longer listening for shortcut events: {}", e);
            }
        });

        match result {
            Ok(listener) => self.hotkey = Some(listener),
            Err(e) if !e.is_user_visible() => {
                info!("{}; use SIGUSR1 or the tray menu to capture", e);
            }
            Err(e) => {
                error!("Failed to register global shortcut {}: {}", chord, e);
                let language = self.language.get();
                let message = format!("{}\n\n{}", language.text(Message::HotkeyFailedBody), e);
                thread::spawn(move || {
                    dialog::show_error(language.text(Message::HotkeyFailedTitle), &message);
                });
            }
        }
    }

    fn check_startup_permissions(&self) {
        let state = PermissionState::current();
        if state.all_granted() {
            debug!("All permissions granted");
            return;
        }

        if !state.screen_recording {
            permissions::request_screen_recording();
        }

        let missing = state.missing();
        let language = self.language.get();
        thread::spawn(move || {
            for permission in missing {
                dialog::show_permission_request(permission, language);
            }
        });
    }

    /// Wait for pending temp file deletions and stop the worker runtime.
    pub fn shutdown(&mut self) {
        info!("Daemon shutting down");
        if let (Some(runtime), Some(manager)) = (&self.runtime, &self.manager) {
            runtime.block_on(manager.flush_cleanup());
        }
        self.manager = None;
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
        }
    }
}

/// Check permissions and tell the user the result, off the event loop.
fn spawn_permission_report(language: Language) {
    thread::spawn(move || {
        let state = PermissionState::current();
        info!("Permission state: {:?}", state);
        if state.all_granted() {
            dialog::show_info(
                language.text(Message::PermissionTitle),
                language.text(Message::PermissionsGranted),
            );
            return;
        }
        for permission in state.missing() {
            dialog::show_permission_request(permission, language);
        }
    });
}
