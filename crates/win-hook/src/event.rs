use std::fmt;

use win_keycode::{Key, Modifier, Modifiers};

/// Direction of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Key went down (`WM_KEYDOWN` / `WM_SYSKEYDOWN`), including OS auto-repeat.
    Down,
    /// Key went up (`WM_KEYUP` / `WM_SYSKEYUP`).
    Up,
}

/// A key event as seen by the hook, after key-table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The symbolic key.
    pub key: Key,
    /// Press or release.
    pub transition: Transition,
    /// Modifiers held at the time of the event, including this key if it is one.
    pub modifiers: Modifiers,
    /// The event was produced by software input injection.
    pub injected: bool,
    /// The event was injected by this process's synthesizer.
    pub self_injected: bool,
    /// Hardware scan code reported with the event.
    pub scan_code: u32,
    /// Event timestamp in milliseconds, as reported by the OS.
    pub time: u32,
}

impl KeyEvent {
    /// A physical key-down for `key` with no modifiers held.
    pub fn down(key: Key) -> Self {
        Self::new(key, Transition::Down)
    }

    /// A physical key-up for `key` with no modifiers held.
    pub fn up(key: Key) -> Self {
        Self::new(key, Transition::Up)
    }

    fn new(key: Key, transition: Transition) -> Self {
        Self {
            key,
            transition,
            modifiers: Modifiers::empty(),
            injected: false,
            self_injected: false,
            scan_code: u32::from(key.scan_code()),
            time: 0,
        }
    }

    /// Return a copy with the given modifiers held.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Return a copy marked as injected by another process.
    pub fn injected(mut self) -> Self {
        self.injected = true;
        self
    }

    /// True if the given modifier was held.
    pub fn has(&self, m: Modifier) -> bool {
        self.modifiers.has(m)
    }

    /// True if this is a key-down.
    pub fn is_down(&self) -> bool {
        self.transition == Transition::Down
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.transition {
            Transition::Down => "down",
            Transition::Up => "up",
        };
        let mods = self.modifiers.to_spec();
        if mods.is_empty() {
            write!(f, "{} {}", dir, self.key.to_spec())
        } else {
            write!(f, "{} {}+{}", dir, mods, self.key.to_spec())
        }
    }
}

/// Receiver of hook events.
///
/// Called synchronously on the hook's pump thread for every mapped key event.
/// Implementations must return quickly: evaluate what they need, hand any
/// real work to another thread, and report whether the event is consumed.
pub trait KeySink: Send + Sync {
    /// Handle one key event; return true to stop it reaching other applications.
    fn on_key(&self, event: &KeyEvent) -> bool;
}

impl<F> KeySink for F
where
    F: Fn(&KeyEvent) -> bool + Send + Sync,
{
    fn on_key(&self, event: &KeyEvent) -> bool {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_modifiers() {
        let e = KeyEvent::down(Key::A).with_modifiers(Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(e.to_string(), "down ctrl+shift+a");
        assert_eq!(KeyEvent::up(Key::F1).to_string(), "up f1");
    }

    #[test]
    fn constructors_default_to_physical() {
        let e = KeyEvent::down(Key::Q);
        assert!(!e.injected);
        assert!(!e.self_injected);
        assert!(e.is_down());
        assert_eq!(e.scan_code, 0x10);
        assert!(e.injected().injected);
    }
}
