use std::convert::TryFrom;

use bitflags::bitflags;

use crate::Key;

/// Modifier keys, without regard to side.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Win,
}

bitflags! {
    /// A set of held modifiers.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Modifiers: u8 {
        /// Either shift key.
        const SHIFT = 1 << 0;
        /// Either control key.
        const CONTROL = 1 << 1;
        /// Either alt key.
        const ALT = 1 << 2;
        /// Either Windows key.
        const WIN = 1 << 3;
    }
}

impl From<Modifier> for Modifiers {
    fn from(m: Modifier) -> Self {
        match m {
            Modifier::Shift => Self::SHIFT,
            Modifier::Control => Self::CONTROL,
            Modifier::Alt => Self::ALT,
            Modifier::Win => Self::WIN,
        }
    }
}

impl From<Modifier> for Key {
    fn from(m: Modifier) -> Self {
        match m {
            Modifier::Shift => Self::LeftShift,
            Modifier::Control => Self::LeftControl,
            Modifier::Alt => Self::LeftAlt,
            Modifier::Win => Self::LeftWin,
        }
    }
}

impl TryFrom<Key> for Modifier {
    type Error = ();
    fn try_from(k: Key) -> Result<Self, Self::Error> {
        match k {
            Key::Shift | Key::LeftShift | Key::RightShift => Ok(Self::Shift),
            Key::Control | Key::LeftControl | Key::RightControl => Ok(Self::Control),
            Key::Alt | Key::LeftAlt | Key::RightAlt => Ok(Self::Alt),
            Key::LeftWin | Key::RightWin => Ok(Self::Win),
            _ => Err(()),
        }
    }
}

impl Modifier {
    /// All modifiers in canonical order.
    pub const ALL: [Self; 4] = [Self::Control, Self::Alt, Self::Shift, Self::Win];

    /// Returns the modifier a key acts as, if any.
    pub fn of_key(key: Key) -> Option<Self> {
        Self::try_from(key).ok()
    }

    /// Parses a modifier specification string via key specs, then converts.
    ///
    /// Accepts the same names and aliases as `Key::from_spec` (ctrl, alt,
    /// shift, win, ...). If the parsed key is not a modifier, parsing fails.
    pub fn from_spec(s: &str) -> Option<Self> {
        Key::from_spec(s).and_then(Self::of_key)
    }

    /// Returns the canonical lowercase spec string for this modifier.
    pub fn to_spec(self) -> &'static str {
        match self {
            Self::Shift => "shift",
            Self::Control => "ctrl",
            Self::Alt => "alt",
            Self::Win => "win",
        }
    }
}

impl Modifiers {
    /// True if the set holds the given modifier.
    pub fn has(self, m: Modifier) -> bool {
        self.contains(Self::from(m))
    }

    /// Iterate held modifiers in canonical order.
    pub fn iter_modifiers(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL.into_iter().filter(move |m| self.has(*m))
    }

    /// Render as a `ctrl+alt` style prefix, empty when no modifiers are held.
    pub fn to_spec(self) -> String {
        self.iter_modifiers()
            .map(Modifier::to_spec)
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_modifiers() {
        for m in Modifier::ALL {
            let k: Key = m.into();
            let back = Modifier::try_from(k).expect("should map back");
            assert_eq!(m, back);
        }
    }

    #[test]
    fn both_sides_map_to_one_modifier() {
        assert_eq!(Modifier::of_key(Key::RightControl), Some(Modifier::Control));
        assert_eq!(Modifier::of_key(Key::LeftControl), Some(Modifier::Control));
        assert_eq!(Modifier::of_key(Key::RightWin), Some(Modifier::Win));
        assert_eq!(Modifier::of_key(Key::A), None);
    }

    #[test]
    fn modifier_specs() {
        assert_eq!(Modifier::from_spec("ctrl"), Some(Modifier::Control));
        assert_eq!(Modifier::from_spec("alt"), Some(Modifier::Alt));
        assert_eq!(Modifier::from_spec("shift"), Some(Modifier::Shift));
        assert_eq!(Modifier::from_spec("win"), Some(Modifier::Win));
        assert_eq!(Modifier::from_spec("a"), None);
    }

    #[test]
    fn set_rendering() {
        let set = Modifiers::SHIFT | Modifiers::CONTROL;
        assert!(set.has(Modifier::Control));
        assert!(!set.has(Modifier::Alt));
        assert_eq!(set.to_spec(), "ctrl+shift");
        assert_eq!(Modifiers::empty().to_spec(), "");
    }
}
