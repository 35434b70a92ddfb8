//! What a running action can see and do.
use std::{sync::Arc, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use keysynth::Synthesizer;
use win_hook::KeyEvent;
use win_keycode::{Key, Modifiers};
use winops::{Rgb, WindowQuery, WindowSnapshot};

use crate::{Error, Result};

/// Handle passed to every action.
///
/// Carries the event that triggered the rule plus access to input synthesis,
/// window queries and interruptible waiting. Cheap to clone.
#[derive(Clone)]
pub struct ActionCtx {
    event: KeyEvent,
    synth: Synthesizer,
    windows: Arc<dyn WindowQuery>,
    /// Disconnected when the engine shuts down.
    cancel: Receiver<()>,
}

impl ActionCtx {
    pub(crate) fn new(
        event: KeyEvent,
        synth: Synthesizer,
        windows: Arc<dyn WindowQuery>,
        cancel: Receiver<()>,
    ) -> Self {
        Self {
            event,
            synth,
            windows,
            cancel,
        }
    }

    /// The event that matched the rule.
    pub fn event(&self) -> &KeyEvent {
        &self.event
    }

    /// Press and release `key`.
    pub fn press(&self, key: Key) -> Result<()> {
        Ok(self.synth.press_and_release(key)?)
    }

    /// Press `key` with `mods` held.
    pub fn chord(&self, mods: Modifiers, key: Key) -> Result<()> {
        Ok(self.synth.chord(mods, key)?)
    }

    /// Press `key` and leave it down.
    pub fn key_down(&self, key: Key) -> Result<()> {
        Ok(self.synth.key_down(key)?)
    }

    /// Release `key`.
    pub fn key_up(&self, key: Key) -> Result<()> {
        Ok(self.synth.key_up(key)?)
    }

    /// Sleep for `d`, returning [`Error::Interrupted`] as soon as the engine
    /// shuts down.
    pub fn delay(&self, d: Duration) -> Result<()> {
        match self.cancel.recv_timeout(d) {
            Err(RecvTimeoutError::Timeout) => Ok(()),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Err(Error::Interrupted),
        }
    }

    /// True once the engine has begun shutting down.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cancel.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The focused window right now.
    pub fn window(&self) -> WindowSnapshot {
        self.windows.current_window()
    }

    /// Colour at `(x, y)` in the focused window.
    pub fn color_at(&self, x: i32, y: i32) -> Result<Rgb> {
        let w = self.windows.current_window();
        Ok(self.windows.color_at(&w, x, y)?)
    }

    /// The synthesizer, for batches the helpers above do not cover.
    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synth
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use crossbeam_channel::bounded;
    use keysynth::{RecordingPoster, Stroke};
    use winops::MockWindowQuery;

    use super::*;

    fn ctx(cancel: Receiver<()>) -> (ActionCtx, Arc<RecordingPoster>, MockWindowQuery) {
        let poster = Arc::new(RecordingPoster::new());
        let windows = MockWindowQuery::with_title("editor");
        let c = ActionCtx::new(
            KeyEvent::down(Key::F1),
            Synthesizer::with_poster(poster.clone()),
            Arc::new(windows.clone()),
            cancel,
        );
        (c, poster, windows)
    }

    #[test]
    fn delay_runs_to_completion() {
        let (_tx, rx) = bounded::<()>(0);
        let (c, _, _) = ctx(rx);
        let start = Instant::now();
        c.delay(Duration::from_millis(20)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(!c.is_cancelled());
    }

    #[test]
    fn delay_is_interrupted_by_cancel() {
        let (tx, rx) = bounded::<()>(0);
        let (c, _, _) = ctx(rx);
        drop(tx);
        let start = Instant::now();
        assert!(matches!(
            c.delay(Duration::from_secs(10)),
            Err(Error::Interrupted)
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(c.is_cancelled());
    }

    #[test]
    fn press_goes_through_synthesizer() {
        let (_tx, rx) = bounded::<()>(0);
        let (c, poster, _) = ctx(rx);
        c.press(Key::Space).unwrap();
        assert_eq!(
            poster.strokes(),
            vec![Stroke::down(Key::Space), Stroke::up(Key::Space)]
        );
        assert_eq!(c.event().key, Key::F1);
    }

    #[test]
    fn window_and_pixels_are_read_fresh() {
        let (_tx, rx) = bounded::<()>(0);
        let (c, _, windows) = ctx(rx);
        assert_eq!(c.window().title, "editor");
        windows.set_title("game");
        assert_eq!(c.window().title, "game");
        windows.set_color(3, 4, Rgb::new(9, 8, 7));
        assert_eq!(c.color_at(3, 4).unwrap(), Rgb::new(9, 8, 7));
        assert!(matches!(c.color_at(0, 0), Err(Error::Window(_))));
    }
}
