use win_keycode::{Key, Modifier, Modifiers};

use crate::Transition;

/// Tracks which modifier keys are held, per side.
///
/// The hook sees left and right modifiers as distinct keys; the aggregate
/// `Modifiers` set keeps a modifier active while either side is held.
#[derive(Debug, Default, Clone)]
pub struct ModifierTracker {
    /// One bit per modifier key slot (see `slot`).
    held: u16,
}

/// Bit index for each tracked modifier key.
fn slot(key: Key) -> Option<u16> {
    let idx = match key {
        Key::LeftShift => 0,
        Key::RightShift => 1,
        Key::LeftControl => 2,
        Key::RightControl => 3,
        Key::LeftAlt => 4,
        Key::RightAlt => 5,
        Key::LeftWin => 6,
        Key::RightWin => 7,
        // Side-less codes only show up in injected input.
        Key::Shift => 8,
        Key::Control => 9,
        Key::Alt => 10,
        _ => return None,
    };
    Some(1 << idx)
}

impl ModifierTracker {
    /// Create a tracker with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition and return the modifiers held afterwards.
    ///
    /// A modifier's own key-down reports the modifier as held; its key-up
    /// reports it released.
    pub fn observe(&mut self, key: Key, transition: Transition) -> Modifiers {
        if let Some(bit) = slot(key) {
            match transition {
                Transition::Down => self.held |= bit,
                Transition::Up => self.held &= !bit,
            }
        }
        self.current()
    }

    /// Modifiers currently held.
    pub fn current(&self) -> Modifiers {
        let mut out = Modifiers::empty();
        for key in Key::ALL {
            if let (Some(bit), Some(m)) = (slot(*key), Modifier::of_key(*key))
                && self.held & bit != 0
            {
                out |= Modifiers::from(m);
            }
        }
        out
    }

    /// Forget all held modifiers.
    pub fn reset(&mut self) {
        self.held = 0;
    }
}
