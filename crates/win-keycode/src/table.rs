//! Native virtual-key codes and the lookup table that maps them to `Key`.
//!
//! A "virtual code" here is the `vkCode` reported in `KBDLLHOOKSTRUCT` by a
//! low-level keyboard hook. The table is indexed directly by that value, so
//! lookup is a single bounds-checked array read. Codes with no declared key,
//! and codes past the end of the table, resolve to `None`.

use crate::Key;

/// Windows virtual-key code as reported by a low-level keyboard hook.
pub type VirtualCode = u32;

/// Number of slots in the lookup table; covers the full `VK_*` byte range.
pub const TABLE_SIZE: usize = 256;

static TABLE: [Option<Key>; TABLE_SIZE] = build_table();

const fn build_table() -> [Option<Key>; TABLE_SIZE] {
    let mut table = [None; TABLE_SIZE];
    let mut i = 0;
    while i < Key::ALL.len() {
        let key = Key::ALL[i];
        table[key.virtual_code() as usize] = Some(key);
        i += 1;
    }
    table
}

impl Key {
    /// Looks up a `Key` from a native virtual-key code.
    pub fn from_code(code: VirtualCode) -> Option<Self> {
        TABLE.get(code as usize).copied().flatten()
    }
}

impl TryFrom<VirtualCode> for Key {
    type Error = ();
    fn try_from(value: VirtualCode) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or(())
    }
}

impl From<Key> for VirtualCode {
    fn from(k: Key) -> Self {
        Self::from(k.virtual_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_keys() {
        for k in Key::ALL {
            let code = VirtualCode::from(*k);
            assert_eq!(Key::from_code(code), Some(*k));
            assert_eq!(Key::try_from(code).ok(), Some(*k));
        }
    }

    #[test]
    fn unmapped_codes_resolve_to_none() {
        // 0x07 is reserved, 0xFF is unassigned.
        assert_eq!(Key::from_code(0x07), None);
        assert_eq!(Key::from_code(0xFF), None);
        // Past the end of the table.
        assert_eq!(Key::from_code(0x1FF), None);
        assert_eq!(Key::from_code(u32::MAX), None);
    }

    #[test]
    fn sided_modifiers_are_distinct() {
        assert_eq!(Key::from_code(0xA0), Some(Key::LeftShift));
        assert_eq!(Key::from_code(0xA1), Some(Key::RightShift));
        assert_eq!(Key::from_code(0x10), Some(Key::Shift));
    }
}
