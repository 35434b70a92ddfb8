//! Win32 `WH_KEYBOARD_LL` integration.
//!
//! The hook procedure is a bare `extern "system"` function with no user data
//! pointer. Windows calls it on the thread that installed the hook, from
//! inside that thread's `GetMessageW`, so the per-hook state lives in a
//! thread-local on the pump thread. Nothing here is process-global except the
//! console exit handler target.
//!
//! Returning a non-zero `LRESULT` without calling `CallNextHookEx` swallows
//! the event. Windows silently removes hooks whose callback exceeds
//! `LowLevelHooksTimeout`, so the callback never blocks and never unwinds.

use std::{
    cell::RefCell,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, warn};
use windows::Win32::{
    Foundation::{BOOL, FALSE, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
    System::{
        Console::SetConsoleCtrlHandler,
        LibraryLoader::GetModuleHandleW,
        Threading::{GetCurrentThread, GetCurrentThreadId, SetThreadPriority, THREAD_PRIORITY_HIGHEST},
    },
    UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, HHOOK, KBDLLHOOKSTRUCT, MSG,
        PostThreadMessageW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx,
        WH_KEYBOARD_LL, WM_QUIT,
    },
};

use crate::{
    Error, KeySink, ModifierTracker,
    policy::{self, RawEvent, Verdict},
};

/// State the hook procedure needs, owned by the pump thread.
struct PumpCtx {
    sink: Arc<dyn KeySink>,
    mods: ModifierTracker,
    active: Arc<AtomicBool>,
}

thread_local! {
    static CTX: RefCell<Option<PumpCtx>> = const { RefCell::new(None) };
}

/// Pump thread id the console handler should stop, if a hook is live.
static EXIT_TARGET: Mutex<Option<u32>> = Mutex::new(None);
/// True while the pump thread holds an installed hook.
static PUMP_RUNNING: AtomicBool = AtomicBool::new(false);

const EXIT_WAIT: Duration = Duration::from_millis(500);

/// Install the hook on the current thread and run its message loop.
///
/// Reports the pump thread id (or the install error) on `ready` before
/// entering the loop. Returns once `WM_QUIT` is received.
pub(crate) fn run_pump(
    sink: Arc<dyn KeySink>,
    active: Arc<AtomicBool>,
    ready: Sender<crate::Result<u32>>,
) {
    let thread_id = unsafe { GetCurrentThreadId() };
    if let Err(e) = unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_HIGHEST) } {
        debug!(error = %e, "pump_priority_not_raised");
    }

    CTX.with(|c| {
        *c.borrow_mut() = Some(PumpCtx {
            sink,
            mods: ModifierTracker::new(),
            active,
        });
    });

    let module = match unsafe { GetModuleHandleW(None) } {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "module_handle_failed");
            let _ = ready.send(Err(Error::InstallFailed(e.to_string())));
            return;
        }
    };

    debug!("installing_keyboard_hook");
    let hook = match unsafe {
        SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE(module.0), 0)
    } {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, "keyboard_hook_install_failed");
            let _ = ready.send(Err(Error::InstallFailed(e.to_string())));
            return;
        }
    };
    PUMP_RUNNING.store(true, Ordering::SeqCst);

    let _ = ready.send(Ok(thread_id));
    debug!(thread_id, "hook_pump_started");

    let mut msg = MSG::default();
    loop {
        let r = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        match r.0 {
            0 => break,
            -1 => {
                warn!("get_message_failed");
                break;
            }
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }

    unhook(hook);
    CTX.with(|c| c.borrow_mut().take());
    PUMP_RUNNING.store(false, Ordering::SeqCst);
    debug!("hook_pump_exited");
}

fn unhook(hook: HHOOK) {
    if let Err(e) = unsafe { UnhookWindowsHookEx(hook) } {
        warn!(error = %e, "unhook_failed");
    }
}

/// Ask a pump thread to leave its message loop.
pub(crate) fn stop_pump(thread_id: u32) {
    if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
        debug!(thread_id, error = %e, "post_quit_failed");
    }
}

/// Make console close/Ctrl+C stop the pump so the hook is removed before exit.
pub(crate) fn register_exit_handler(thread_id: u32) {
    *EXIT_TARGET.lock() = Some(thread_id);
    if let Err(e) = unsafe { SetConsoleCtrlHandler(Some(console_ctrl), BOOL::from(true)) } {
        debug!(error = %e, "console_ctrl_handler_unavailable");
    }
}

pub(crate) fn deregister_exit_handler() {
    *EXIT_TARGET.lock() = None;
    let _ = unsafe { SetConsoleCtrlHandler(Some(console_ctrl), BOOL::from(false)) };
}

unsafe extern "system" fn console_ctrl(_ctrl_type: u32) -> BOOL {
    let target = EXIT_TARGET.lock().take();
    if let Some(thread_id) = target {
        stop_pump(thread_id);
        let deadline = Instant::now() + EXIT_WAIT;
        while PUMP_RUNNING.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }
    // Fall through to the default handler, which terminates the process.
    FALSE
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= policy::HC_ACTION && lparam.0 != 0 {
        let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
        let raw = RawEvent {
            code,
            message: wparam.0 as u32,
            vk: info.vkCode,
            scan: info.scanCode,
            flags: info.flags.0,
            time: info.time,
            extra: info.dwExtraInfo,
        };
        if route_on_pump(&raw) == Verdict::Consume {
            return LRESULT(1);
        }
    }
    unsafe { CallNextHookEx(HHOOK::default(), code, wparam, lparam) }
}

fn route_on_pump(raw: &RawEvent) -> Verdict {
    let routed = panic::catch_unwind(AssertUnwindSafe(|| {
        CTX.with(|c| {
            // A re-entrant call (the sink pumping messages) forwards untouched.
            let Ok(mut guard) = c.try_borrow_mut() else {
                return Verdict::Forward;
            };
            match guard.as_mut() {
                Some(ctx) if ctx.active.load(Ordering::Acquire) => {
                    policy::route(raw, &mut ctx.mods, ctx.sink.as_ref())
                }
                _ => Verdict::Forward,
            }
        })
    }));
    routed.unwrap_or_else(|_| {
        warn!(vk = raw.vk, "hook_sink_panicked");
        Verdict::Forward
    })
}
