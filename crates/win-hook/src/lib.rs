//! Windows low-level keyboard hook.
//!
//! A [`Hook`] installs one system-wide `WH_KEYBOARD_LL` callback on a
//! dedicated pump thread and feeds every mapped key event to a [`KeySink`].
//! The sink answers synchronously whether the event is consumed; anything it
//! needs to do beyond that belongs on another thread.
//!
//! Only one hook may be installed per process. Dropping the [`Hook`] (or
//! calling [`Hook::uninstall`]) removes the native hook and stops the pump.
//!
//! The OS-independent part of the callback lives in [`policy`] and is what the
//! tests exercise.
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use tracing::{info, warn};

mod error;
mod event;
mod modifiers;
pub mod policy;
#[cfg(windows)]
mod sys;

pub use error::{Error, Result};
pub use event::{KeyEvent, KeySink, Transition};
pub use modifiers::ModifierTracker;

/// Set while a hook is installed anywhere in the process.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Shared state between the [`Hook`] owner and its pump thread.
struct Control {
    /// Cleared first on uninstall so the callback stops dispatching at once.
    active: Arc<AtomicBool>,
    thread_id: Mutex<Option<u32>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Control {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            thread_id: Mutex::new(None),
            join: Mutex::new(None),
        }
    }

    fn shutdown(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(thread_id) = self.thread_id.lock().take() {
            stop_pump(thread_id);
        }
        let handle = self.join.lock().take();
        if let Some(h) = handle {
            // Uninstall from inside the sink runs on the pump thread itself.
            if h.thread().id() != thread::current().id() && h.join().is_err() {
                warn!("hook_pump_panicked");
            }
        }
        INSTALLED.store(false, Ordering::SeqCst);
        info!("keyboard_hook_uninstalled");
    }
}

/// Handle to the installed keyboard hook.
pub struct Hook {
    ctrl: Arc<Control>,
}

impl Hook {
    /// Install the process-wide keyboard hook, delivering events to `sink`.
    ///
    /// Blocks until the pump thread reports that the native hook is in place,
    /// so installation failures surface here rather than later. Also registers
    /// a console exit handler that removes the hook on Ctrl+C / close.
    pub fn install(sink: Arc<dyn KeySink>) -> Result<Self> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyInstalled);
        }
        let ctrl = Arc::new(Control::new());
        match start(&ctrl, sink) {
            Ok(()) => {
                info!("keyboard_hook_installed");
                Ok(Self { ctrl })
            }
            Err(e) => {
                ctrl.active.store(false, Ordering::SeqCst);
                INSTALLED.store(false, Ordering::SeqCst);
                warn!(error = %e, "keyboard_hook_unavailable");
                Err(e)
            }
        }
    }

    /// Stop dispatching, remove the native hook and stop the pump thread.
    ///
    /// Idempotent.
    pub fn uninstall(&self) {
        self.ctrl.shutdown();
    }

    /// True until [`Hook::uninstall`] runs.
    pub fn is_active(&self) -> bool {
        self.ctrl.active.load(Ordering::Acquire)
    }
}

impl Drop for Hook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// True if a hook is currently installed in this process.
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

#[cfg(windows)]
fn start(ctrl: &Arc<Control>, sink: Arc<dyn KeySink>) -> Result<()> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
    ctrl.active.store(true, Ordering::Release);
    let active = ctrl.active.clone();
    let handle = thread::Builder::new()
        .name("keyboard-hook".into())
        .spawn(move || sys::run_pump(sink, active, ready_tx))
        .map_err(|e| Error::PumpThread(e.to_string()))?;
    match ready_rx.recv() {
        Ok(Ok(thread_id)) => {
            *ctrl.thread_id.lock() = Some(thread_id);
            *ctrl.join.lock() = Some(handle);
            sys::register_exit_handler(thread_id);
            Ok(())
        }
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(Error::PumpThread("pump exited before reporting".into()))
        }
    }
}

#[cfg(not(windows))]
fn start(_ctrl: &Arc<Control>, _sink: Arc<dyn KeySink>) -> Result<()> {
    Err(Error::Unsupported)
}

#[cfg(windows)]
fn stop_pump(thread_id: u32) {
    sys::deregister_exit_handler();
    sys::stop_pump(thread_id);
}

#[cfg(not(windows))]
fn stop_pump(_thread_id: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn install_failure_surfaces_and_releases_slot() {
        let sink: Arc<dyn KeySink> = Arc::new(|_: &KeyEvent| false);
        let err = Hook::install(sink.clone()).err();
        assert_eq!(err, Some(Error::Unsupported));
        assert!(!is_installed());
        // A failed install leaves the process free to try again.
        assert_eq!(Hook::install(sink).err(), Some(Error::Unsupported));
    }

    #[test]
    fn shutdown_without_start_is_noop() {
        let ctrl = Control::new();
        ctrl.shutdown();
        ctrl.shutdown();
        assert!(!ctrl.active.load(Ordering::SeqCst));
    }
}
