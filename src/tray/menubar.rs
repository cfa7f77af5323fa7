//! macOS status bar item, driven by a tao event loop on the main thread.

use std::time::{Duration, Instant};

use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop};
use tao::platform::macos::{ActivationPolicy, EventLoopExtMacOS};
use tray_icon::menu::{
    CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem, Submenu,
};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use super::{ICON_SIZE, MenuEntry, icon_rgba, menu_entries};
use crate::daemon::{Daemon, DaemonEvent};
use crate::i18n::Language;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Menu items kept around so their labels can be swapped on a language
/// change.
struct MenuBarItems {
    menu: Menu,
    actions: Vec<(MenuItem, DaemonEvent)>,
    language_menu: Submenu,
    languages: Vec<(CheckMenuItem, Language)>,
}

impl MenuBarItems {
    fn build(language: Language) -> anyhow::Result<Self> {
        let menu = Menu::new();
        let mut actions = Vec::new();
        let mut language_menu = None;
        let mut languages = Vec::new();

        for entry in menu_entries(language) {
            match entry {
                MenuEntry::Action { label, event } => {
                    let item = MenuItem::new(label, true, None);
                    menu.append(&item)?;
                    actions.push((item, event));
                }
                MenuEntry::Languages { label, options } => {
                    let submenu = Submenu::new(label, true);
                    for (candidate, selected) in options {
                        let item = CheckMenuItem::new(candidate.native_name(), true, selected, None);
                        submenu.append(&item)?;
                        languages.push((item, candidate));
                    }
                    menu.append(&submenu)?;
                    language_menu = Some(submenu);
                }
                MenuEntry::Separator => menu.append(&PredefinedMenuItem::separator())?,
            }
        }

        let language_menu =
            language_menu.ok_or_else(|| anyhow::anyhow!("menu is missing the language submenu"))?;

        Ok(Self {
            menu,
            actions,
            language_menu,
            languages,
        })
    }

    /// Translate a click into a daemon event.
    fn event_for(&self, id: &MenuId) -> Option<DaemonEvent> {
        if let Some((_, event)) = self.actions.iter().find(|(item, _)| item.id() == id) {
            return Some(event.clone());
        }
        self.languages
            .iter()
            .find(|(item, _)| item.id() == id)
            .map(|(_, language)| DaemonEvent::SetLanguage(*language))
    }

    /// Relabel every item for `language` and move the check mark.
    fn apply_language(&self, language: Language) {
        let entries = menu_entries(language);
        let mut action_labels = entries.iter().filter_map(|entry| match entry {
            MenuEntry::Action { label, .. } => Some(*label),
            _ => None,
        });
        for (item, _) in &self.actions {
            if let Some(label) = action_labels.next() {
                item.set_text(label);
            }
        }

        for entry in &entries {
            if let MenuEntry::Languages { label, .. } = entry {
                self.language_menu.set_text(*label);
            }
        }
        for (item, candidate) in &self.languages {
            item.set_checked(*candidate == language);
        }
    }
}

fn build_icon() -> Option<Icon> {
    match Icon::from_rgba(icon_rgba(ICON_SIZE), ICON_SIZE as u32, ICON_SIZE as u32) {
        Ok(icon) => Some(icon),
        Err(err) => {
            log::warn!("Failed to build menu bar icon: {}", err);
            None
        }
    }
}

/// Run the status bar item until Quit. Daemon events from the signal and
/// hotkey threads are drained on the same loop as menu clicks.
pub fn run_menu_bar(mut daemon: Daemon, tooltip: String) -> anyhow::Result<()> {
    let mut event_loop = EventLoop::new();
    event_loop.set_activation_policy(ActivationPolicy::Accessory);

    let items = MenuBarItems::build(daemon.language())?;
    let mut tray_icon: Option<TrayIcon> = None;

    event_loop.run(move |event, _target, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL);

        if let Event::NewEvents(StartCause::Init) = event
            && tray_icon.is_none()
        {
            let mut builder = TrayIconBuilder::new()
                .with_menu(Box::new(items.menu.clone()))
                .with_tooltip(&tooltip);
            builder = match build_icon() {
                Some(icon) => builder.with_icon(icon).with_icon_as_template(true),
                None => builder.with_title("◐"),
            };
            match builder.build() {
                Ok(icon) => tray_icon = Some(icon),
                Err(err) => log::error!("Failed to create status bar item: {}", err),
            }
        }

        let mut pending = Vec::new();
        while let Ok(menu_event) = MenuEvent::receiver().try_recv() {
            if let Some(event) = items.event_for(&menu_event.id) {
                pending.push(event);
            }
        }
        pending.extend(daemon.drain_events());

        for event in pending {
            let before = daemon.language();
            if !daemon.handle_event(event) {
                log::info!("Quit requested - exiting menu bar loop");
                daemon.shutdown();
                tray_icon.take();
                *control_flow = ControlFlow::Exit;
                return;
            }
            let after = daemon.language();
            if before != after {
                items.apply_language(after);
            }
        }
    })
}
