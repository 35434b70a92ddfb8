// Central key list: `Variant = virtual-key code, set-1 scan code [, ext]`.
// `ext` marks keys that need KEYEVENTF_EXTENDEDKEY when injected by scan code.
macro_rules! define_keys {
    ( $( $name:ident = $vk:literal, $scan:literal $(, $ext:ident)? ; )* ) => {
        /// A symbolic key, valued by its Windows virtual-key code (`VK_*`).
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $(
                #[allow(missing_docs)]
                $name = $vk,
            )*
        }

        impl Key {
            /// Every declared key, in virtual-code order.
            pub const ALL: &'static [Self] = &[ $( Self::$name, )* ];

            /// Returns the set-1 hardware scan code for this key.
            pub const fn scan_code(self) -> u16 {
                match self {
                    $( Self::$name => $scan, )*
                }
            }

            /// True if the key lives on the extended part of the keyboard and
            /// must be injected with the extended-key flag.
            pub const fn is_extended(self) -> bool {
                match self {
                    $( Self::$name => define_keys!(@ext $($ext)?), )*
                }
            }

            /// Returns the canonical name for this key (the enum variant string).
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name), )*
                }
            }

            /// Case-insensitive lookup of a `Key` from its name.
            pub fn from_name(name: &str) -> Option<Self> {
                $(
                    if name.eq_ignore_ascii_case(stringify!($name)) {
                        return Some(Self::$name);
                    }
                )*
                None
            }
        }
    };
    (@ext ext) => { true };
    (@ext) => { false };
}

define_keys! {
    Backspace = 0x08, 0x0E;
    Tab = 0x09, 0x0F;
    Return = 0x0D, 0x1C;
    Shift = 0x10, 0x2A;
    Control = 0x11, 0x1D;
    Alt = 0x12, 0x38;
    CapsLock = 0x14, 0x3A;
    Escape = 0x1B, 0x01;
    Space = 0x20, 0x39;
    PageUp = 0x21, 0x49, ext;
    PageDown = 0x22, 0x51, ext;
    End = 0x23, 0x4F, ext;
    Home = 0x24, 0x47, ext;
    Left = 0x25, 0x4B, ext;
    Up = 0x26, 0x48, ext;
    Right = 0x27, 0x4D, ext;
    Down = 0x28, 0x50, ext;
    PrintScreen = 0x2C, 0x37, ext;
    Insert = 0x2D, 0x52, ext;
    Delete = 0x2E, 0x53, ext;
    Digit0 = 0x30, 0x0B;
    Digit1 = 0x31, 0x02;
    Digit2 = 0x32, 0x03;
    Digit3 = 0x33, 0x04;
    Digit4 = 0x34, 0x05;
    Digit5 = 0x35, 0x06;
    Digit6 = 0x36, 0x07;
    Digit7 = 0x37, 0x08;
    Digit8 = 0x38, 0x09;
    Digit9 = 0x39, 0x0A;
    A = 0x41, 0x1E;
    B = 0x42, 0x30;
    C = 0x43, 0x2E;
    D = 0x44, 0x20;
    E = 0x45, 0x12;
    F = 0x46, 0x21;
    G = 0x47, 0x22;
    H = 0x48, 0x23;
    I = 0x49, 0x17;
    J = 0x4A, 0x24;
    K = 0x4B, 0x25;
    L = 0x4C, 0x26;
    M = 0x4D, 0x32;
    N = 0x4E, 0x31;
    O = 0x4F, 0x18;
    P = 0x50, 0x19;
    Q = 0x51, 0x10;
    R = 0x52, 0x13;
    S = 0x53, 0x1F;
    T = 0x54, 0x14;
    U = 0x55, 0x16;
    V = 0x56, 0x2F;
    W = 0x57, 0x11;
    X = 0x58, 0x2D;
    Y = 0x59, 0x15;
    Z = 0x5A, 0x2C;
    LeftWin = 0x5B, 0x5B, ext;
    RightWin = 0x5C, 0x5C, ext;
    Apps = 0x5D, 0x5D, ext;
    Numpad0 = 0x60, 0x52;
    Numpad1 = 0x61, 0x4F;
    Numpad2 = 0x62, 0x50;
    Numpad3 = 0x63, 0x51;
    Numpad4 = 0x64, 0x4B;
    Numpad5 = 0x65, 0x4C;
    Numpad6 = 0x66, 0x4D;
    Numpad7 = 0x67, 0x47;
    Numpad8 = 0x68, 0x48;
    Numpad9 = 0x69, 0x49;
    Multiply = 0x6A, 0x37;
    Add = 0x6B, 0x4E;
    Subtract = 0x6D, 0x4A;
    Decimal = 0x6E, 0x53;
    Divide = 0x6F, 0x35, ext;
    F1 = 0x70, 0x3B;
    F2 = 0x71, 0x3C;
    F3 = 0x72, 0x3D;
    F4 = 0x73, 0x3E;
    F5 = 0x74, 0x3F;
    F6 = 0x75, 0x40;
    F7 = 0x76, 0x41;
    F8 = 0x77, 0x42;
    F9 = 0x78, 0x43;
    F10 = 0x79, 0x44;
    F11 = 0x7A, 0x57;
    F12 = 0x7B, 0x58;
    NumLock = 0x90, 0x45, ext;
    ScrollLock = 0x91, 0x46;
    LeftShift = 0xA0, 0x2A;
    RightShift = 0xA1, 0x36;
    LeftControl = 0xA2, 0x1D;
    RightControl = 0xA3, 0x1D, ext;
    LeftAlt = 0xA4, 0x38;
    RightAlt = 0xA5, 0x38, ext;
    Semicolon = 0xBA, 0x27;
    Equal = 0xBB, 0x0D;
    Comma = 0xBC, 0x33;
    Minus = 0xBD, 0x0C;
    Period = 0xBE, 0x34;
    Slash = 0xBF, 0x35;
    Grave = 0xC0, 0x29;
    LeftBracket = 0xDB, 0x1A;
    Backslash = 0xDC, 0x2B;
    RightBracket = 0xDD, 0x1B;
    Quote = 0xDE, 0x28;
}

impl Key {
    /// Returns the virtual-key code (`VK_*`) for this key.
    pub const fn virtual_code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn virtual_codes_are_unique_and_ordered() {
        let mut seen = HashSet::new();
        for k in Key::ALL {
            assert!(seen.insert(k.virtual_code()), "duplicate vk for {}", k.name());
        }
        assert!(Key::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn scan_codes_are_present() {
        for k in Key::ALL {
            assert_ne!(k.scan_code(), 0, "missing scan code for {}", k.name());
        }
        assert_eq!(Key::A.scan_code(), 0x1E);
        assert_eq!(Key::Escape.scan_code(), 0x01);
    }

    #[test]
    fn extended_keys() {
        assert!(Key::Left.is_extended());
        assert!(Key::RightControl.is_extended());
        assert!(Key::NumLock.is_extended());
        assert!(Key::Divide.is_extended());
        assert!(!Key::ScrollLock.is_extended());
        assert!(!Key::LeftControl.is_extended());
        assert!(!Key::A.is_extended());
    }

    #[test]
    fn names_roundtrip() {
        for k in Key::ALL {
            assert_eq!(Key::from_name(k.name()), Some(*k));
        }
        assert_eq!(Key::from_name("f12"), Some(Key::F12));
        assert_eq!(Key::from_name("nope"), None);
    }
}
