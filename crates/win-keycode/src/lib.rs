//! win-keycode: Virtual-key codes and scan codes for Windows keyboards.
//!
//! - `Key`: Enum of the keys a low-level keyboard hook reports, valued by
//!   their virtual-key code and carrying the set-1 hardware scan code.
//! - `Key::from_code`: O(1) lookup from a native virtual-key code through a
//!   fixed 256-slot table built at compile time.
//! - `Modifier` / `Modifiers`: modifier keys and sets of held modifiers.
//! - Spec helpers: `Key::from_spec`, `Key::to_spec`, `Modifier::from_spec`.

mod key;
pub use key::Key;

mod table;
pub use table::{TABLE_SIZE, VirtualCode};

mod spec;

mod modifiers;
pub use modifiers::{Modifier, Modifiers};
