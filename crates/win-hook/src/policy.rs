//! Routing decision for a single raw hook callback.
//!
//! This is everything the OS callback does apart from FFI: check the hook
//! code, classify the message, look up the key, update modifier state, hand
//! the event to the sink and turn its answer into forward/consume. It is kept
//! free of platform types so it can be exercised anywhere.

use tracing::trace;
use win_keycode::Key;

use crate::{KeyEvent, KeySink, ModifierTracker, Transition};

/// `HC_ACTION`: the only hook code that carries an event to inspect.
pub const HC_ACTION: i32 = 0;
/// `WM_KEYDOWN`
pub const WM_KEYDOWN: u32 = 0x0100;
/// `WM_KEYUP`
pub const WM_KEYUP: u32 = 0x0101;
/// `WM_SYSKEYDOWN`: key-down while Alt is held, or F10.
pub const WM_SYSKEYDOWN: u32 = 0x0104;
/// `WM_SYSKEYUP`
pub const WM_SYSKEYUP: u32 = 0x0105;

/// The fields of one low-level keyboard callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawEvent {
    /// Hook code (`nCode`).
    pub code: i32,
    /// Window message (`wParam`).
    pub message: u32,
    /// `KBDLLHOOKSTRUCT::vkCode`
    pub vk: u32,
    /// `KBDLLHOOKSTRUCT::scanCode`
    pub scan: u32,
    /// `KBDLLHOOKSTRUCT::flags`
    pub flags: u32,
    /// `KBDLLHOOKSTRUCT::time`
    pub time: u32,
    /// `KBDLLHOOKSTRUCT::dwExtraInfo`
    pub extra: usize,
}

/// What the callback should do with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Pass to the next hook with the original parameters.
    Forward,
    /// Swallow the event.
    Consume,
}

/// Classify a keyboard window message.
pub fn transition_for(message: u32) -> Option<Transition> {
    match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(Transition::Down),
        WM_KEYUP | WM_SYSKEYUP => Some(Transition::Up),
        _ => None,
    }
}

/// Decide how to handle one raw callback.
pub fn route(raw: &RawEvent, mods: &mut ModifierTracker, sink: &dyn KeySink) -> Verdict {
    if raw.code < HC_ACTION {
        return Verdict::Forward;
    }
    let injected = eventtag::is_injected(raw.flags);
    let self_injected = injected && eventtag::is_self_tagged(raw.extra);
    let Some(key) = Key::from_code(raw.vk) else {
        trace!(vk = raw.vk, injected, "unmapped_key_forwarded");
        return Verdict::Forward;
    };
    let Some(transition) = transition_for(raw.message) else {
        trace!(message = raw.message, "non_key_message_forwarded");
        return Verdict::Forward;
    };
    let modifiers = mods.observe(key, transition);
    let event = KeyEvent {
        key,
        transition,
        modifiers,
        injected,
        self_injected,
        scan_code: raw.scan,
        time: raw.time,
    };
    trace!(
        vk = raw.vk,
        scan = raw.scan,
        ?key,
        ?transition,
        ?modifiers,
        injected,
        self_injected,
        "hook_event"
    );
    if sink.on_key(&event) {
        trace!(?key, "consuming_event");
        Verdict::Consume
    } else {
        Verdict::Forward
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use proptest::prelude::*;
    use win_keycode::Modifiers;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<KeyEvent>>,
        consume: bool,
        calls: AtomicUsize,
    }

    impl KeySink for Recorder {
        fn on_key(&self, event: &KeyEvent) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().push(*event);
            self.consume
        }
    }

    fn raw(message: u32, key: Key) -> RawEvent {
        RawEvent {
            code: HC_ACTION,
            message,
            vk: u32::from(key.virtual_code()),
            scan: u32::from(key.scan_code()),
            ..RawEvent::default()
        }
    }

    #[test]
    fn negative_code_is_not_inspected() {
        let sink = Recorder::default();
        let mut mods = ModifierTracker::new();
        let mut ev = raw(WM_KEYDOWN, Key::A);
        ev.code = -1;
        assert_eq!(route(&ev, &mut mods, &sink), Verdict::Forward);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unmapped_vk_is_forwarded_untouched() {
        let sink = Recorder {
            consume: true,
            ..Recorder::default()
        };
        let mut mods = ModifierTracker::new();
        let mut ev = raw(WM_KEYDOWN, Key::A);
        ev.vk = 0xFF;
        assert_eq!(route(&ev, &mut mods, &sink), Verdict::Forward);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sys_variants_map_to_down_and_up() {
        let sink = Recorder::default();
        let mut mods = ModifierTracker::new();
        route(&raw(WM_SYSKEYDOWN, Key::F4), &mut mods, &sink);
        route(&raw(WM_SYSKEYUP, Key::F4), &mut mods, &sink);
        let seen = sink.seen.lock();
        assert_eq!(seen[0].transition, Transition::Down);
        assert_eq!(seen[1].transition, Transition::Up);
    }

    #[test]
    fn other_messages_pass_through() {
        let sink = Recorder::default();
        let mut mods = ModifierTracker::new();
        assert_eq!(
            route(&raw(0x0102, Key::A), &mut mods, &sink),
            Verdict::Forward
        );
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn consume_follows_sink_answer() {
        let mut mods = ModifierTracker::new();
        let yes = Recorder {
            consume: true,
            ..Recorder::default()
        };
        assert_eq!(
            route(&raw(WM_KEYDOWN, Key::A), &mut mods, &yes),
            Verdict::Consume
        );
        let no = Recorder::default();
        assert_eq!(
            route(&raw(WM_KEYDOWN, Key::A), &mut mods, &no),
            Verdict::Forward
        );
    }

    #[test]
    fn injected_and_self_tagged_flags() {
        let sink = Recorder::default();
        let mut mods = ModifierTracker::new();

        let mut foreign = raw(WM_KEYDOWN, Key::B);
        foreign.flags = eventtag::INJECTED_FLAG;
        route(&foreign, &mut mods, &sink);

        let mut ours = raw(WM_KEYDOWN, Key::B);
        ours.flags = eventtag::INJECTED_FLAG;
        ours.extra = eventtag::MACRO_TAG;
        route(&ours, &mut mods, &sink);

        // The tag alone, without the OS injected bit, does not count.
        let mut spoofed = raw(WM_KEYDOWN, Key::B);
        spoofed.extra = eventtag::MACRO_TAG;
        route(&spoofed, &mut mods, &sink);

        let seen = sink.seen.lock();
        assert!(seen[0].injected && !seen[0].self_injected);
        assert!(seen[1].injected && seen[1].self_injected);
        assert!(!seen[2].injected && !seen[2].self_injected);
    }

    #[test]
    fn modifiers_are_attached() {
        let sink = Recorder::default();
        let mut mods = ModifierTracker::new();
        route(&raw(WM_KEYDOWN, Key::LeftControl), &mut mods, &sink);
        route(&raw(WM_KEYDOWN, Key::A), &mut mods, &sink);
        route(&raw(WM_KEYUP, Key::LeftControl), &mut mods, &sink);
        route(&raw(WM_KEYDOWN, Key::A), &mut mods, &sink);
        let seen = sink.seen.lock();
        assert_eq!(seen[1].modifiers, Modifiers::CONTROL);
        assert_eq!(seen[3].modifiers, Modifiers::empty());
    }

    proptest! {
        #[test]
        fn out_of_table_codes_never_reach_sink(vk in 256u32..u32::MAX, msg in 0u32..0x200) {
            let sink = Recorder { consume: true, ..Recorder::default() };
            let mut mods = ModifierTracker::new();
            let ev = RawEvent { code: HC_ACTION, message: msg, vk, ..RawEvent::default() };
            prop_assert_eq!(route(&ev, &mut mods, &sink), Verdict::Forward);
            prop_assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
        }
    }
}
