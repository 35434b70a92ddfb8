use bitflags::bitflags;
use win_keycode::Key;

bitflags! {
    /// `KEYBDINPUT::dwFlags` bits used for synthesized strokes.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct StrokeFlags: u32 {
        /// `KEYEVENTF_EXTENDEDKEY`
        const EXTENDED_KEY = 0x0001;
        /// `KEYEVENTF_KEYUP`
        const KEY_UP = 0x0002;
        /// `KEYEVENTF_SCANCODE`: the scan code identifies the key, not the vk.
        const SCAN_CODE = 0x0008;
    }
}

/// One synthesized key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    /// Key to press or release.
    pub key: Key,
    /// True for key-down.
    pub down: bool,
}

impl Stroke {
    /// A key-down stroke.
    pub const fn down(key: Key) -> Self {
        Self { key, down: true }
    }

    /// A key-up stroke.
    pub const fn up(key: Key) -> Self {
        Self { key, down: false }
    }

    /// Native flags: always scan-code based, plus key-up and extended bits.
    pub fn flags(&self) -> StrokeFlags {
        let mut f = StrokeFlags::SCAN_CODE;
        if !self.down {
            f |= StrokeFlags::KEY_UP;
        }
        if self.key.is_extended() {
            f |= StrokeFlags::EXTENDED_KEY;
        }
        f
    }

    /// Hardware scan code sent with the stroke.
    pub const fn scan_code(&self) -> u16 {
        self.key.scan_code()
    }

    /// Value placed in `dwExtraInfo` so the hook can recognise our own input.
    pub const fn extra_info(&self) -> usize {
        eventtag::MACRO_TAG
    }
}
