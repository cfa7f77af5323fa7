//! StatusNotifierItem tray for Linux desktops, via ksni.

use anyhow::{Result, anyhow};
use ksni::TrayMethods;
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{ICON_SIZE, MenuEntry, TRAY_ID, icon_rgba, menu_entries};
use crate::daemon::DaemonEvent;
use crate::i18n::LanguageSetting;

const TRAY_START_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BlackshotTray {
    events: mpsc::Sender<DaemonEvent>,
    language: LanguageSetting,
    tooltip: String,
}

impl BlackshotTray {
    pub fn new(
        events: mpsc::Sender<DaemonEvent>,
        language: LanguageSetting,
        tooltip: String,
    ) -> Self {
        Self {
            events,
            language,
            tooltip,
        }
    }

    fn send(&self, event: DaemonEvent) {
        if let Err(err) = self.events.send(event) {
            warn!("Daemon is no longer listening for tray events: {}", err);
        }
    }
}

impl ksni::Tray for BlackshotTray {
    fn id(&self) -> String {
        TRAY_ID.into()
    }

    fn title(&self) -> String {
        "Blackshot".into()
    }

    fn icon_name(&self) -> String {
        "applets-screenshooter".into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            icon_name: "applets-screenshooter".into(),
            icon_pixmap: vec![],
            title: self.tooltip.clone(),
            description: String::new(),
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        // SNI pixmaps are ARGB in network byte order.
        let rgba = icon_rgba(ICON_SIZE);
        let mut data = Vec::with_capacity(rgba.len());
        for px in rgba.chunks(4) {
            data.extend_from_slice(&[px[3], px[0], px[1], px[2]]);
        }

        vec![ksni::Icon {
            width: ICON_SIZE as i32,
            height: ICON_SIZE as i32,
            data,
        }]
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn status(&self) -> ksni::Status {
        ksni::Status::Active
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::*;

        menu_entries(self.language.get())
            .into_iter()
            .map(|entry| -> MenuItem<Self> {
                match entry {
                    MenuEntry::Action { label, event } => StandardItem {
                        label: label.to_string(),
                        activate: Box::new(move |this: &mut Self| this.send(event.clone())),
                        ..Default::default()
                    }
                    .into(),
                    MenuEntry::Languages { label, options } => {
                        let selected = options
                            .iter()
                            .position(|(_, current)| *current)
                            .unwrap_or(0);
                        let languages: Vec<_> =
                            options.iter().map(|(language, _)| *language).collect();
                        SubMenu {
                            label: label.to_string(),
                            submenu: vec![
                                RadioGroup {
                                    selected,
                                    select: Box::new(move |this: &mut Self, index| {
                                        if let Some(language) = languages.get(index) {
                                            this.send(DaemonEvent::SetLanguage(*language));
                                        }
                                    }),
                                    options: options
                                        .iter()
                                        .map(|(language, _)| RadioItem {
                                            label: language.native_name().to_string(),
                                            ..Default::default()
                                        })
                                        .collect(),
                                }
                                .into(),
                            ],
                            ..Default::default()
                        }
                        .into()
                    }
                    MenuEntry::Separator => MenuItem::Separator,
                }
            })
            .collect()
    }
}

/// Control handle for the tray thread.
pub struct TrayHandle {
    thread: Option<JoinHandle<()>>,
    quit: Arc<AtomicBool>,
    refresh: Arc<AtomicBool>,
}

impl TrayHandle {
    /// Rebuild the menu, e.g. after a language change.
    pub fn refresh(&self) {
        self.refresh.store(true, Ordering::Release);
    }

    pub fn shutdown(mut self) {
        self.quit.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            match handle.join() {
                Ok(()) => info!("System tray thread joined"),
                Err(err) => warn!("System tray thread panicked: {:?}", err),
            }
        }
    }
}

/// Spawn the tray on its own thread with a private Tokio runtime and wait
/// until it is registered with the StatusNotifierWatcher.
pub fn start_system_tray(tray: BlackshotTray) -> Result<TrayHandle> {
    let quit = Arc::new(AtomicBool::new(false));
    let refresh = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    info!("Spawning system tray runtime thread...");

    let tray_quit = quit.clone();
    let tray_refresh = refresh.clone();
    let ready_thread_tx = ready_tx.clone();
    let tray_thread = thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to create Tokio runtime for system tray: {}", e);
                report_tray_readiness(
                    &ready_thread_tx,
                    Err(anyhow!(
                        "Failed to create Tokio runtime for system tray: {e}"
                    )),
                );
                return;
            }
        };

        rt.block_on(async {
            match tray.spawn().await {
                Ok(handle) => {
                    info!("System tray spawned successfully");
                    report_tray_readiness(&ready_thread_tx, Ok(()));

                    loop {
                        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                        if tray_quit.load(Ordering::Acquire) {
                            info!("Quit signal received - shutting down system tray");
                            let _ = handle.shutdown().await;
                            break;
                        }
                        if tray_refresh.swap(false, Ordering::AcqRel) {
                            debug!("Refreshing tray menu");
                            handle.update(|_tray: &mut BlackshotTray| {}).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("System tray error: {}", e);
                    report_tray_readiness(&ready_thread_tx, Err(anyhow!("System tray error: {e}")));
                }
            }
        });
    });

    drop(ready_tx);

    info!("Waiting for system tray readiness signal...");
    match ready_rx.recv_timeout(TRAY_START_TIMEOUT) {
        Ok(result) => {
            result?;
            info!("System tray thread started");
            Ok(TrayHandle {
                thread: Some(tray_thread),
                quit,
                refresh,
            })
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("Timed out waiting for system tray to start");
            quit.store(true, Ordering::Release);
            let _ = tray_thread.join();
            Err(anyhow!("Timed out waiting for system tray to start"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = tray_thread.join();
            Err(anyhow!(
                "System tray thread exited before signaling readiness"
            ))
        }
    }
}

fn report_tray_readiness(tx: &mpsc::Sender<Result<()>>, result: Result<()>) {
    if let Err(err) = tx.send(result) {
        debug!(
            "System tray readiness receiver dropped before signal could be delivered: {}",
            err
        );
    }
}
