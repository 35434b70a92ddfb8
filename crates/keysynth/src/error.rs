//! Error types and result alias for the keysynth crate.
use std::result::Result as StdResult;

use thiserror::Error;
use win_keycode::Key;

/// Crate-local `Result` alias using the synthesis error type.
pub type Result<T> = StdResult<T, Error>;

/// Errors that can occur while synthesizing or posting events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The OS accepted fewer events than were submitted.
    #[error("SendInput accepted {sent} of {expected} events")]
    SendFailed {
        /// Events the OS inserted.
        sent: usize,
        /// Events submitted.
        expected: usize,
    },
    /// A key was pressed but its release could not be delivered.
    #[error("Key {0:?} may be stuck down: release could not be sent")]
    StuckKey(Key),
    /// Input injection is only available on Windows.
    #[error("Input synthesis is not supported on this platform")]
    Unsupported,
}
