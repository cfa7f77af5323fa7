//! macOS virtual key codes (ANSI layout) for the keys a chord may name.

/// (key code, canonical name) pairs. Names are lower case.
const KEYCODES: &[(u16, &str)] = &[
    (0x00, "a"),
    (0x01, "s"),
    (0x02, "d"),
    (0x03, "f"),
    (0x04, "h"),
    (0x05, "g"),
    (0x06, "z"),
    (0x07, "x"),
    (0x08, "c"),
    (0x09, "v"),
    (0x0B, "b"),
    (0x0C, "q"),
    (0x0D, "w"),
    (0x0E, "e"),
    (0x0F, "r"),
    (0x10, "y"),
    (0x11, "t"),
    (0x12, "1"),
    (0x13, "2"),
    (0x14, "3"),
    (0x15, "4"),
    (0x16, "6"),
    (0x17, "5"),
    (0x18, "="),
    (0x19, "9"),
    (0x1A, "7"),
    (0x1B, "-"),
    (0x1C, "8"),
    (0x1D, "0"),
    (0x1E, "]"),
    (0x1F, "o"),
    (0x20, "u"),
    (0x21, "["),
    (0x22, "i"),
    (0x23, "p"),
    (0x24, "return"),
    (0x25, "l"),
    (0x26, "j"),
    (0x27, "'"),
    (0x28, "k"),
    (0x29, ";"),
    (0x2A, "\\"),
    (0x2B, ","),
    (0x2C, "/"),
    (0x2D, "n"),
    (0x2E, "m"),
    (0x2F, "."),
    (0x30, "tab"),
    (0x31, "space"),
    (0x32, "`"),
    (0x33, "delete"),
    (0x35, "escape"),
    (0x60, "f5"),
    (0x61, "f6"),
    (0x62, "f7"),
    (0x63, "f3"),
    (0x64, "f8"),
    (0x65, "f9"),
    (0x67, "f11"),
    (0x6D, "f10"),
    (0x6F, "f12"),
    (0x76, "f4"),
    (0x78, "f2"),
    (0x7A, "f1"),
];

fn canonical(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.as_str() {
        "enter" => "return".to_string(),
        "esc" => "escape".to_string(),
        "backspace" => "delete".to_string(),
        "minus" => "-".to_string(),
        "equal" | "equals" => "=".to_string(),
        _ => lower,
    }
}

/// Key code for a chord key name, if the key is on the ANSI layout.
pub fn keycode_for(name: &str) -> Option<u16> {
    let name = canonical(name);
    KEYCODES
        .iter()
        .find(|(_, candidate)| *candidate == name)
        .map(|(code, _)| *code)
}

/// Canonical name of a key code.
#[cfg_attr(not(any(test, target_os = "macos")), allow(dead_code))]
pub fn key_name(code: u16) -> Option<&'static str> {
    KEYCODES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
}
