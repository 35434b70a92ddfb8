//! Synthesizes key presses into the system input stream.
//!
//! A [`Synthesizer`] turns keys into scan-code based [`Stroke`]s and posts
//! them through a [`Poster`]. On Windows that is `SendInput`; events arrive
//! with the OS injected bit set and our marker in `dwExtraInfo`, so a keyboard
//! hook sees them like any other input but can tell where they came from.
//! Nothing here suppresses that feedback; callers that must not react to
//! their own output filter on the injected flag.
//!
//! A batch the OS only partly accepts never leaves a key down: any key the
//! accepted prefix pressed without releasing is released again before the
//! error is reported.
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]
use std::sync::Arc;

use tracing::{debug, trace, warn};
use win_keycode::{Key, Modifiers};

mod error;
mod stroke;
#[cfg(windows)]
mod sys;

pub use error::{Error, Result};
pub use stroke::{Stroke, StrokeFlags};

/// Backend that delivers strokes to the OS.
pub trait Poster: Send + Sync {
    /// Submit `strokes` as one batch; returns how many were inserted.
    fn post(&self, strokes: &[Stroke]) -> Result<usize>;
}

#[cfg(not(windows))]
struct UnsupportedPoster;

#[cfg(not(windows))]
impl Poster for UnsupportedPoster {
    fn post(&self, _strokes: &[Stroke]) -> Result<usize> {
        Err(Error::Unsupported)
    }
}

/// Posts synthesized key strokes.
#[derive(Clone)]
pub struct Synthesizer {
    poster: Arc<dyn Poster>,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer {
    /// Create a synthesizer posting to the system input stream.
    pub fn new() -> Self {
        #[cfg(windows)]
        let poster: Arc<dyn Poster> = Arc::new(sys::SendInputPoster);
        #[cfg(not(windows))]
        let poster: Arc<dyn Poster> = Arc::new(UnsupportedPoster);
        Self { poster }
    }

    /// Create a synthesizer over a custom poster.
    pub fn with_poster(poster: Arc<dyn Poster>) -> Self {
        Self { poster }
    }

    /// Press `key` without releasing it.
    pub fn key_down(&self, key: Key) -> Result<()> {
        self.send(&[Stroke::down(key)])
    }

    /// Release `key`.
    pub fn key_up(&self, key: Key) -> Result<()> {
        self.send(&[Stroke::up(key)])
    }

    /// Press and release `key` as a single batch.
    pub fn press_and_release(&self, key: Key) -> Result<()> {
        self.send(&[Stroke::down(key), Stroke::up(key)])
    }

    /// Press `key` with `mods` held: modifiers down, key down/up, modifiers
    /// up in reverse order.
    pub fn chord(&self, mods: Modifiers, key: Key) -> Result<()> {
        let mod_keys: Vec<Key> = mods.iter_modifiers().map(Key::from).collect();
        let mut strokes: Vec<Stroke> = mod_keys.iter().copied().map(Stroke::down).collect();
        strokes.push(Stroke::down(key));
        strokes.push(Stroke::up(key));
        strokes.extend(mod_keys.iter().rev().copied().map(Stroke::up));
        self.send(&strokes)
    }

    /// Post a batch of strokes, releasing anything stranded by a partial send.
    pub fn send(&self, strokes: &[Stroke]) -> Result<()> {
        if strokes.is_empty() {
            return Ok(());
        }
        let sent = self.poster.post(strokes)?;
        if sent >= strokes.len() {
            trace!(count = strokes.len(), "strokes_posted");
            return Ok(());
        }
        warn!(sent, expected = strokes.len(), "partial_send");
        self.release_stranded(&strokes[..sent])?;
        Err(Error::SendFailed {
            sent,
            expected: strokes.len(),
        })
    }

    fn release_stranded(&self, sent: &[Stroke]) -> Result<()> {
        let mut held: Vec<Key> = Vec::new();
        for s in sent {
            if s.down {
                if !held.contains(&s.key) {
                    held.push(s.key);
                }
            } else {
                held.retain(|k| *k != s.key);
            }
        }
        for key in held.into_iter().rev() {
            match self.poster.post(&[Stroke::up(key)]) {
                Ok(1) => debug!(?key, "released_stranded_key"),
                _ => {
                    warn!(?key, "stranded_key_release_failed");
                    return Err(Error::StuckKey(key));
                }
            }
        }
        Ok(())
    }
}

/// Poster that records strokes instead of sending them.
///
/// Optionally scripted to accept only part of upcoming batches, to exercise
/// partial-send recovery.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct RecordingPoster {
    strokes: parking_lot::Mutex<Vec<Stroke>>,
    caps: parking_lot::Mutex<std::collections::VecDeque<usize>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingPoster {
    /// Create an empty recorder that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the next posts to accept at most these many strokes each.
    pub fn script(&self, caps: impl IntoIterator<Item = usize>) {
        self.caps.lock().extend(caps);
    }

    /// Every stroke accepted so far.
    pub fn strokes(&self) -> Vec<Stroke> {
        self.strokes.lock().clone()
    }

    /// Forget recorded strokes.
    pub fn clear(&self) {
        self.strokes.lock().clear();
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Poster for RecordingPoster {
    fn post(&self, strokes: &[Stroke]) -> Result<usize> {
        let cap = self.caps.lock().pop_front().unwrap_or(usize::MAX);
        let n = strokes.len().min(cap);
        self.strokes.lock().extend_from_slice(&strokes[..n]);
        Ok(n)
    }
}
