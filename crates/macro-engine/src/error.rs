use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the macro engine.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the macro engine and the actions it runs.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors from installing or running the keyboard hook.
    #[error("Hook error: {0}")]
    Hook(#[from] win_hook::Error),

    /// Errors from synthesizing input.
    #[error("Input error: {0}")]
    Synth(#[from] keysynth::Error),

    /// Errors from querying windows.
    #[error("Window error: {0}")]
    Window(#[from] winops::Error),

    /// A wait inside an action was cut short by shutdown.
    #[error("Action interrupted by shutdown")]
    Interrupted,

    /// The action pool was saturated and refused the job.
    #[error("Action pool saturated")]
    Rejected,

    /// The action pool has been shut down.
    #[error("Action pool is shut down")]
    ShutDown,

    /// A rule was declared without any key condition.
    #[error("Rule has no key condition and would match every key")]
    UnconstrainedKey,

    /// Invalid title pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration could not be read or is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// Failure reported by a user action.
    #[error("{0}")]
    Action(String),

    /// A worker thread could not be started.
    #[error("Failed to spawn worker: {0}")]
    Spawn(#[from] io::Error),
}

impl Error {
    /// Build an action failure from any message.
    pub fn action(msg: impl Into<String>) -> Self {
        Self::Action(msg.into())
    }
}
