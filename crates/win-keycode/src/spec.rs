use crate::Key;

// Central mapping between enum variants and spec strings for shorthand/non-name specs.
// Extend this list to cover more punctuation or shorthand.
macro_rules! key_spec_map {
    ($m:ident, $arg:tt) => {
        $m! { $arg,
            Digit0 => "0",
            Digit1 => "1",
            Digit2 => "2",
            Digit3 => "3",
            Digit4 => "4",
            Digit5 => "5",
            Digit6 => "6",
            Digit7 => "7",
            Digit8 => "8",
            Digit9 => "9",
            Space => " ",
            Minus => "-",
            Equal => "=",
            LeftBracket => "[",
            RightBracket => "]",
            Backslash => "\\",
            Semicolon => ";",
            Quote => "'",
            Comma => ",",
            Period => ".",
            Slash => "/",
            Grave => "`",
        }
    };
}

macro_rules! to_spec_match {
    ( $key:expr, $( $k:ident => $s:expr, )* ) => {
        match $key {
            $( Key::$k => $s, )*
            _ => $key.name(),
        }
    }
}

macro_rules! from_spec_match {
    ( $s:expr, $( $k:ident => $v:expr, )* ) => {{
        match $s {
            $( $v => Some(Key::$k), )*
            _ => None,
        }
    }}
}

// Aliases that only apply to parsing specs (not emitted by to_spec).
macro_rules! key_spec_aliases {
    ($m:ident, $arg:expr) => {
        $m! { $arg,
            LeftControl => "ctrl",
            LeftControl => "lctrl",
            RightControl => "rctrl",
            LeftAlt => "alt",
            LeftAlt => "lalt",
            RightAlt => "ralt",
            RightAlt => "altgr",
            LeftShift => "shift",
            LeftShift => "lshift",
            RightShift => "rshift",
            LeftWin => "win",
            LeftWin => "lwin",
            RightWin => "rwin",
            CapsLock => "caps",

            Return => "enter",
            Return => "ret",
            Escape => "esc",
            Space => "space",
            Backspace => "bksp",
            Delete => "del",
            Insert => "ins",
            PrintScreen => "prtsc",
            Apps => "menu",

            PageUp => "pgup",
            PageDown => "pgdn",
        }
    };
}

/// Parses a key specification into a `Key`.
///
/// First tries a case-insensitive enum name (via `Key::from_name`). If that
/// fails, falls back to shorthand specs like digits and punctuation centrally
/// defined in `key_spec_map`, then to alias words.
pub fn from_spec(s: &str) -> Option<Key> {
    if let Some(k) = Key::from_name(s) {
        return Some(k);
    }
    if let some @ Some(_) = key_spec_map!(from_spec_match, s) {
        return some;
    }
    let lowered = s.to_ascii_lowercase();
    key_spec_aliases!(from_spec_match, lowered.as_str())
}

/// Returns the key specification string for a `Key`.
pub fn to_spec(key: Key) -> String {
    let s = key_spec_map!(to_spec_match, key);
    s.to_ascii_lowercase()
}

impl Key {
    /// Parses a key specification string into a `Key`.
    ///
    /// Accepts enum variant names case-insensitively, symbol shorthands for
    /// digits and punctuation, and alias words such as esc, enter, ctrl, alt,
    /// shift, win, pgup and pgdn. Returns `None` if no mapping matches.
    pub fn from_spec(s: &str) -> Option<Self> {
        from_spec(s)
    }

    /// Returns the key specification string for this `Key`.
    pub fn to_spec(self) -> String {
        to_spec(self)
    }
}
