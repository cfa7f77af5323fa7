//! Global capture shortcut.
//!
//! The listener observes key-down events process-wide and calls back when
//! the configured chord is pressed. The chord itself is consumed, auto-repeats
//! included. Every other key press reaches the focused application unchanged.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use thiserror::Error;

use crate::config::{KeyChord, ModifierState};

#[cfg(target_os = "macos")]
mod event_tap;
pub mod keycodes;

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("Global shortcuts are not supported on this platform")]
    Unsupported,

    #[error("Key '{0}' cannot be used in a global shortcut")]
    UnknownKey(String),

    #[error("Failed to create keyboard event tap: {0}")]
    TapCreation(String),

    #[error("Shortcut listener stopped before it was ready")]
    ThreadExited,
}

impl HotkeyError {
    /// Whether the user should be told with a dialog. An unsupported
    /// platform is expected and only logged.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, HotkeyError::Unsupported)
    }
}

/// What the listener does with one key-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The chord was pressed: trigger a capture and drop the event.
    Fire,
    /// Auto-repeat of the chord: drop the event without triggering.
    Swallow,
    /// Any other key: let the event through.
    Pass,
}

/// Decides what a raw key event means for the chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordMatcher {
    keycode: u16,
    modifiers: ModifierState,
}

impl ChordMatcher {
    pub fn new(chord: &KeyChord) -> Result<Self, HotkeyError> {
        let keycode = keycodes::keycode_for(&chord.key)
            .ok_or_else(|| HotkeyError::UnknownKey(chord.key.clone()))?;
        Ok(Self {
            keycode,
            modifiers: chord.modifiers(),
        })
    }

    /// Exact match on key code and modifiers. Auto-repeat never fires.
    pub fn action(&self, keycode: u16, modifiers: ModifierState, is_repeat: bool) -> KeyAction {
        if keycode != self.keycode || modifiers != self.modifiers {
            KeyAction::Pass
        } else if is_repeat {
            KeyAction::Swallow
        } else {
            KeyAction::Fire
        }
    }
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartupState {
    Waiting,
    Ready,
    Abandoned,
}

/// Settles the race between the listener thread finishing its setup and
/// `register` giving up on it. Whichever side arrives first wins.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
#[derive(Debug, Clone)]
pub(crate) struct StartupGate {
    state: Arc<Mutex<StartupState>>,
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
impl StartupGate {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StartupState::Waiting)),
        }
    }

    /// Called by the listener before it starts receiving events. Returns
    /// false when registration already gave up; the listener must then tear
    /// itself down without enabling anything.
    pub(crate) fn try_activate(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            StartupState::Abandoned => false,
            _ => {
                *state = StartupState::Ready;
                true
            }
        }
    }

    /// Called by `register` when it stops waiting. Returns false when the
    /// listener activated in the meantime and must be kept.
    pub(crate) fn abandon(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            StartupState::Ready => false,
            _ => {
                *state = StartupState::Abandoned;
                true
            }
        }
    }
}

/// A running shortcut listener. The listener thread lives until the
/// process exits.
pub struct HotkeyListener {
    chord: KeyChord,
    _thread: JoinHandle<()>,
}

impl HotkeyListener {
    pub fn chord(&self) -> &KeyChord {
        &self.chord
    }
}

/// Start listening for `chord` and call `on_match` from the listener thread
/// each time it is pressed.
///
/// Fails without leaving anything running if the key is unknown or the OS
/// refuses the tap (typically missing Accessibility access).
pub fn register<F>(chord: &KeyChord, on_match: F) -> Result<HotkeyListener, HotkeyError>
where
    F: Fn() + Send + 'static,
{
    let matcher = ChordMatcher::new(chord)?;

    #[cfg(target_os = "macos")]
    {
        let thread = event_tap::spawn(matcher, on_match)?;
        log::info!("Global shortcut {} registered", chord);
        Ok(HotkeyListener {
            chord: chord.clone(),
            _thread: thread,
        })
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = (matcher, on_match);
        Err(HotkeyError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(command: bool, ctrl: bool, shift: bool, alt: bool) -> ModifierState {
        ModifierState {
            command,
            ctrl,
            shift,
            alt,
        }
    }

    #[test]
    fn default_chord_fires_on_cmd_shift_six() {
        let matcher = ChordMatcher::new(&KeyChord::capture_default()).unwrap();
        assert_eq!(
            matcher.action(0x16, mods(true, false, true, false), false),
            KeyAction::Fire
        );
    }

    #[test]
    fn extra_or_missing_modifiers_pass_through() {
        let matcher = ChordMatcher::new(&KeyChord::capture_default()).unwrap();
        for modifiers in [
            mods(true, true, true, false),
            mods(true, false, false, false),
            mods(false, false, true, false),
        ] {
            assert_eq!(matcher.action(0x16, modifiers, false), KeyAction::Pass);
        }
    }

    #[test]
    fn other_keys_pass_and_chord_repeats_are_swallowed() {
        let matcher = ChordMatcher::new(&KeyChord::capture_default()).unwrap();
        let chord_mods = mods(true, false, true, false);
        assert_eq!(matcher.action(0x17, chord_mods, false), KeyAction::Pass);
        assert_eq!(matcher.action(0x17, chord_mods, true), KeyAction::Pass);
        assert_eq!(matcher.action(0x16, chord_mods, true), KeyAction::Swallow);
    }

    #[test]
    fn listener_that_loses_the_startup_race_stays_inactive() {
        let gate = StartupGate::new();
        let listener_side = gate.clone();

        assert!(gate.abandon(), "registration gives up first");
        assert!(!listener_side.try_activate());
        assert!(gate.abandon());
    }

    #[test]
    fn listener_ready_before_timeout_is_kept() {
        let gate = StartupGate::new();
        let listener_side = gate.clone();

        assert!(listener_side.try_activate());
        assert!(!gate.abandon(), "a ready listener must not be abandoned");
        assert!(listener_side.try_activate());
    }

    #[test]
    fn startup_gate_settles_across_threads() {
        for _ in 0..50 {
            let gate = StartupGate::new();
            let listener_side = gate.clone();
            let listener = std::thread::spawn(move || listener_side.try_activate());
            let abandoned = gate.abandon();
            let activated = listener.join().unwrap();
            assert_ne!(abandoned, activated, "exactly one side must win");
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let chord = KeyChord::parse("Cmd++").unwrap();
        assert!(matches!(
            ChordMatcher::new(&chord),
            Err(HotkeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn unsupported_is_not_user_visible() {
        assert!(!HotkeyError::Unsupported.is_user_visible());
        assert!(HotkeyError::TapCreation("denied".into()).is_user_visible());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn register_reports_unsupported_off_macos() {
        let result = register(&KeyChord::capture_default(), || {});
        assert!(matches!(result, Err(HotkeyError::Unsupported)));
    }
}
