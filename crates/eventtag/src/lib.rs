//! Shared event tagging helpers used across crates.
//!
//! Windows sets `LLKHF_INJECTED` on every event that came from `SendInput`,
//! whichever process sent it. Events we inject ourselves additionally carry a
//! process-unique marker value in the `dwExtraInfo` field so the hook can
//! tell our own output apart from other software's.

/// `LLKHF_INJECTED`: the event was injected rather than typed.
pub const INJECTED_FLAG: u32 = 1 << 4;

/// `LLKHF_LOWER_IL_INJECTED`: injected from a lower integrity level process.
pub const LOWER_IL_INJECTED_FLAG: u32 = 1 << 1;

/// 'kbmc' in ASCII bytes: 0x6b 0x62 0x6d 0x63 -> 1801612643
pub const MACRO_TAG: usize = 1_801_612_643;

/// True if hook flags mark the event as injected.
pub const fn is_injected(flags: u32) -> bool {
    flags & INJECTED_FLAG != 0
}

/// True if the extra-info field carries our own marker.
pub const fn is_self_tagged(extra: usize) -> bool {
    extra == MACRO_TAG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_bit() {
        assert!(is_injected(INJECTED_FLAG));
        assert!(is_injected(INJECTED_FLAG | LOWER_IL_INJECTED_FLAG));
        assert!(!is_injected(0));
        // Extended-key bit alone is not injection.
        assert!(!is_injected(1));
    }

    #[test]
    fn tag_is_ascii_kbmc() {
        assert_eq!(MACRO_TAG, u32::from_be_bytes(*b"kbmc") as usize);
        assert!(is_self_tagged(MACRO_TAG));
        assert!(!is_self_tagged(0));
    }
}
