use std::result::Result as StdResult;

use thiserror::Error;

/// Result alias for window queries.
pub type Result<T> = StdResult<T, Error>;

/// Errors from window and screen queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// No window currently has focus.
    #[error("No foreground window")]
    NoWindow,
    /// The screen pixel could not be read.
    #[error("Failed to read pixel at ({x}, {y})")]
    PixelRead {
        /// Horizontal client coordinate.
        x: i32,
        /// Vertical client coordinate.
        y: i32,
    },
    /// Window queries are only available on Windows.
    #[error("Window queries are not supported on this platform")]
    Unsupported,
}
