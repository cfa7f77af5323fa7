//! Key chord parsing for the global capture shortcut.

use std::fmt;

/// A key with the exact set of modifiers that must be held.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: String,
    pub command: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    /// Parse a chord string like "Cmd+Shift+6" or "Ctrl + Alt + Space".
    /// Modifiers can appear in any order and spaces around '+' are ignored.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty key chord".to_string());
        }

        let s_normalized = s.replace(" + ", "+").replace("+ ", "+").replace(" +", "+");
        let parts: Vec<&str> = s_normalized.split('+').collect();

        let mut command = false;
        let mut ctrl = false;
        let mut shift = false;
        let mut alt = false;
        let mut key_parts = Vec::new();

        for part in parts {
            match part.to_lowercase().as_str() {
                "cmd" | "command" | "super" | "meta" => command = true,
                "ctrl" | "control" => ctrl = true,
                "shift" => shift = true,
                "alt" | "option" | "opt" => alt = true,
                _ => key_parts.push(part),
            }
        }

        if key_parts.is_empty() {
            return Err(format!("No key specified in: {}", s));
        }

        // "Cmd++" splits into ["Cmd", "", ""], which joins back to "+"
        let key = key_parts.join("+");
        if key.is_empty() {
            return Err(format!("No key specified in: {}", s));
        }

        if !command && !ctrl && !alt {
            return Err(format!(
                "Global shortcut '{}' needs at least one of Cmd, Ctrl or Alt",
                s
            ));
        }

        Ok(Self {
            key,
            command,
            ctrl,
            shift,
            alt,
        })
    }

    /// Command+Shift+6, the shortcut used when none is configured.
    pub fn capture_default() -> Self {
        Self {
            key: "6".to_string(),
            command: true,
            ctrl: false,
            shift: true,
            alt: false,
        }
    }

    pub fn modifiers(&self) -> ModifierState {
        ModifierState {
            command: self.command,
            ctrl: self.ctrl,
            shift: self.shift,
            alt: self.alt,
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.command {
            f.write_str("Cmd+")?;
        }
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        f.write_str(&self.key.to_uppercase())
    }
}

/// Modifier keys held while a key event was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    pub command: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}
