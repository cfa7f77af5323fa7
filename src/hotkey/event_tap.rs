//! Active `CGEventTap` running on its own thread and run loop. The chord is
//! removed from the event stream, every other key passes through.

use std::cell::OnceCell;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use core_foundation::base::TCFType;
use core_foundation::mach_port::{CFMachPort, CFMachPortRef};
use core_foundation::runloop::{CFRunLoop, kCFRunLoopCommonModes};
use core_graphics::event::{
    CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, EventField,
};

use super::{ChordMatcher, HotkeyError, KeyAction, StartupGate, keycodes};
use crate::config::ModifierState;

const TAP_START_TIMEOUT: Duration = Duration::from_secs(5);

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

fn set_tap_enabled(port: &CFMachPort, enabled: bool) {
    unsafe { CGEventTapEnable(port.as_concrete_TypeRef(), enabled) }
}

fn modifier_state(flags: CGEventFlags) -> ModifierState {
    ModifierState {
        command: flags.contains(CGEventFlags::CGEventFlagCommand),
        ctrl: flags.contains(CGEventFlags::CGEventFlagControl),
        shift: flags.contains(CGEventFlags::CGEventFlagShift),
        alt: flags.contains(CGEventFlags::CGEventFlagAlternate),
    }
}

/// The system turns a slow tap off with a timeout notification. It stays
/// off until enabled again. A user-input disable is left alone.
fn reenable_after(event_type: CGEventType) -> bool {
    matches!(event_type, CGEventType::TapDisabledByTimeout)
}

/// Create the tap on a dedicated thread and wait until it is installed.
///
/// If the thread does not report back in time, registration fails and the
/// thread is told to stand down. It never enables its tap after that.
pub(super) fn spawn<F>(matcher: ChordMatcher, on_match: F) -> Result<JoinHandle<()>, HotkeyError>
where
    F: Fn() + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), HotkeyError>>();
    let gate = StartupGate::new();
    let listener_gate = gate.clone();

    let thread = thread::Builder::new()
        .name("blackshot-hotkey".into())
        .spawn(move || {
            let tap_port: OnceCell<CFMachPort> = OnceCell::new();

            let tap = CGEventTap::new(
                CGEventTapLocation::Session,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::Default,
                vec![CGEventType::KeyDown],
                |_proxy, event_type, event| match event_type {
                    CGEventType::KeyDown => {
                        let keycode =
                            event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
                        let repeat = event
                            .get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT)
                            != 0;
                        let modifiers = modifier_state(event.get_flags());

                        let keycode = u16::try_from(keycode).ok();
                        let action = keycode.map_or(KeyAction::Pass, |code| {
                            matcher.action(code, modifiers, repeat)
                        });
                        match action {
                            KeyAction::Fire => {
                                log::debug!(
                                    "Shortcut pressed ({})",
                                    keycode.and_then(keycodes::key_name).unwrap_or("?")
                                );
                                on_match();
                                None
                            }
                            KeyAction::Swallow => None,
                            KeyAction::Pass => Some(event.clone()),
                        }
                    }
                    other => {
                        if reenable_after(other) {
                            log::warn!("Keyboard event tap timed out; re-enabling it");
                            if let Some(port) = tap_port.get() {
                                set_tap_enabled(port, true);
                            }
                        } else {
                            log::warn!("Keyboard event tap was disabled by the system");
                        }
                        None
                    }
                },
            );

            let tap = match tap {
                Ok(tap) => tap,
                Err(()) => {
                    let _ = ready_tx.send(Err(HotkeyError::TapCreation(
                        "the system refused the tap (is Accessibility access granted?)".into(),
                    )));
                    return;
                }
            };
            let _ = tap_port.set(tap.mach_port.clone());

            let source = match tap.mach_port.create_runloop_source(0) {
                Ok(source) => source,
                Err(()) => {
                    set_tap_enabled(&tap.mach_port, false);
                    let _ = ready_tx.send(Err(HotkeyError::TapCreation(
                        "could not create a run loop source".into(),
                    )));
                    return;
                }
            };

            if !listener_gate.try_activate() {
                set_tap_enabled(&tap.mach_port, false);
                log::warn!("Keyboard event tap became ready after registration gave up");
                return;
            }

            let run_loop = CFRunLoop::get_current();
            unsafe {
                run_loop.add_source(&source, kCFRunLoopCommonModes);
            }
            tap.enable();
            let _ = ready_tx.send(Ok(()));

            CFRunLoop::run_current();
            log::info!("Keyboard event tap run loop exited");
        })
        .map_err(|e| HotkeyError::TapCreation(format!("failed to spawn thread: {}", e)))?;

    match ready_rx.recv_timeout(TAP_START_TIMEOUT) {
        Ok(Ok(())) => Ok(thread),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            if gate.abandon() {
                Err(HotkeyError::TapCreation(
                    "timed out waiting for the event tap".into(),
                ))
            } else {
                // Activated between the timeout and the gate check.
                Ok(thread)
            }
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = thread.join();
            Err(HotkeyError::ThreadExited)
        }
    }
}
