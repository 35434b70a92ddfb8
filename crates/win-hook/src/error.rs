//! Error types and result alias for the win-hook crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A keyboard hook is already installed in this process.
    #[error("Keyboard hook already installed")]
    AlreadyInstalled,
    /// The OS refused to register the hook.
    #[error("Keyboard hook installation failed: {0}")]
    InstallFailed(String),
    /// The message pump thread could not be started or died during startup.
    #[error("Hook pump thread failed: {0}")]
    PumpThread(String),
    /// Low-level keyboard hooks are only available on Windows.
    #[error("Keyboard hooks are not supported on this platform")]
    Unsupported,
}
