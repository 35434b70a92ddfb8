//! Foreground window queries.
//!
//! [`WindowQuery`] is the seam the macro engine reads through: which window
//! has focus right now, and what colour a pixel of it shows. [`SystemWindows`]
//! answers from the OS; the mock behind `test-utils` answers from memory.
#![warn(missing_docs)]
use std::fmt;

mod error;
#[cfg(windows)]
mod sys;

pub use error::{Error, Result};

/// Point-in-time view of the focused window.
///
/// A default snapshot (empty title, zero handle) means nothing has focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WindowSnapshot {
    /// Window title text.
    pub title: String,
    /// Native window handle, or 0.
    pub handle: isize,
}

impl WindowSnapshot {
    /// Snapshot with a title and handle.
    pub fn new(title: impl Into<String>, handle: isize) -> Self {
        Self {
            title: title.into(),
            handle,
        }
    }

    /// True if no window had focus when the snapshot was taken.
    pub fn is_empty(&self) -> bool {
        self.handle == 0
    }
}

/// An RGB colour sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Decode a GDI `COLORREF` (`0x00BBGGRR`).
    pub const fn from_colorref(c: u32) -> Self {
        Self {
            r: (c & 0xFF) as u8,
            g: ((c >> 8) & 0xFF) as u8,
            b: ((c >> 16) & 0xFF) as u8,
        }
    }

    /// Pack as `0xRRGGBB`.
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

/// Source of window snapshots and pixel reads.
pub trait WindowQuery: Send + Sync {
    /// The window that has focus right now. Never cached.
    fn current_window(&self) -> WindowSnapshot;

    /// Colour of the pixel at client coordinates `(x, y)` of `window`.
    fn color_at(&self, window: &WindowSnapshot, x: i32, y: i32) -> Result<Rgb>;
}

/// Queries the real desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWindows;

impl WindowQuery for SystemWindows {
    #[cfg(windows)]
    fn current_window(&self) -> WindowSnapshot {
        sys::foreground()
    }

    #[cfg(not(windows))]
    fn current_window(&self) -> WindowSnapshot {
        WindowSnapshot::default()
    }

    #[cfg(windows)]
    fn color_at(&self, window: &WindowSnapshot, x: i32, y: i32) -> Result<Rgb> {
        sys::pixel(window, x, y)
    }

    #[cfg(not(windows))]
    fn color_at(&self, _window: &WindowSnapshot, _x: i32, _y: i32) -> Result<Rgb> {
        Err(Error::Unsupported)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use parking_lot::Mutex;

    use super::*;

    /// In-memory window source for tests (enabled with `test-utils`).
    #[derive(Clone, Default)]
    pub struct MockWindowQuery {
        window: Arc<Mutex<WindowSnapshot>>,
        colors: Arc<Mutex<HashMap<(i32, i32), Rgb>>>,
        queries: Arc<AtomicUsize>,
    }

    impl MockWindowQuery {
        /// A mock reporting an untitled focused window.
        pub fn new() -> Self {
            let m = Self::default();
            m.set_window(WindowSnapshot::new("", 1));
            m
        }

        /// A mock whose focused window has `title`.
        pub fn with_title(title: &str) -> Self {
            let m = Self::default();
            m.set_title(title);
            m
        }

        /// Change the focused window's title.
        pub fn set_title(&self, title: &str) {
            *self.window.lock() = WindowSnapshot::new(title, 1);
        }

        /// Replace the focused window.
        pub fn set_window(&self, w: WindowSnapshot) {
            *self.window.lock() = w;
        }

        /// Paint one pixel.
        pub fn set_color(&self, x: i32, y: i32, c: Rgb) {
            self.colors.lock().insert((x, y), c);
        }

        /// How many times `current_window` has been called.
        pub fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    impl WindowQuery for MockWindowQuery {
        fn current_window(&self) -> WindowSnapshot {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.window.lock().clone()
        }

        fn color_at(&self, window: &WindowSnapshot, x: i32, y: i32) -> Result<Rgb> {
            if window.is_empty() {
                return Err(Error::NoWindow);
            }
            self.colors
                .lock()
                .get(&(x, y))
                .copied()
                .ok_or(Error::PixelRead { x, y })
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockWindowQuery;
