//! Matching events against rules on the hook thread.
use std::sync::Arc;

use keysynth::Synthesizer;
use tracing::trace;
use win_hook::{KeyEvent, KeySink};
use winops::{WindowQuery, WindowSnapshot};

use crate::{ActionCtx, Executor, rule::Registry};

/// Evaluates rules for each event and hands matches to the executor.
///
/// Runs synchronously inside the hook callback, so it only tests predicates
/// and submits work; it never runs an action itself.
pub struct Dispatcher {
    registry: Arc<Registry>,
    windows: Arc<dyn WindowQuery>,
    executor: Executor,
    synth: Synthesizer,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`.
    pub fn new(
        registry: Arc<Registry>,
        windows: Arc<dyn WindowQuery>,
        executor: Executor,
        synth: Synthesizer,
    ) -> Self {
        Self {
            registry,
            windows,
            executor,
            synth,
        }
    }

    /// Match `event` against the press or release list; returns true if any
    /// matching rule consumes it.
    ///
    /// Every matching rule is submitted, in declaration order, even after one
    /// has already decided to consume. The focused window is read at most once
    /// and only if some rule actually conditions on it.
    pub fn dispatch(&self, event: &KeyEvent) -> bool {
        let rules = self.registry.list(event.transition).snapshot();
        if rules.is_empty() {
            return false;
        }
        let mut window: Option<WindowSnapshot> = None;
        let mut consumed = false;
        for rule in rules.iter() {
            if !rule.window_is_any() {
                let w = window.get_or_insert_with(|| self.windows.current_window());
                if !rule.window_allows(w) {
                    continue;
                }
            }
            if !rule.keys_match(event) {
                continue;
            }
            trace!(rule = %rule.label, %event, consume = rule.consumable, "rule_matched");
            let action = rule.action.clone();
            let ctx = ActionCtx::new(
                *event,
                self.synth.clone(),
                self.windows.clone(),
                self.executor.cancel_signal(),
            );
            // A refused action still leaves the event matched.
            if let Err(e) = self.executor.submit(rule.label.clone(), move || action(&ctx)) {
                trace!(rule = %rule.label, error = %e, "submit_refused");
            }
            consumed |= rule.consumable;
        }
        consumed
    }
}

impl KeySink for Dispatcher {
    fn on_key(&self, event: &KeyEvent) -> bool {
        self.dispatch(event)
    }
}
