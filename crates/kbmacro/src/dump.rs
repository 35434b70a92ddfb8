//! `kbmacro dump`: log every key the hook sees.
use std::sync::Arc;

use crossbeam_channel::Sender;
use macro_engine::{Key, KeyEvent, Macro, MacroScope, Predicate, Transition};
use tracing::{debug, info, warn};

/// Logs each key event, without consuming it, until `quit` is pressed.
pub struct DumpMacro {
    quit: Key,
    done: Sender<()>,
}

impl DumpMacro {
    /// Dump until `quit` is pressed, then signal `done`.
    pub fn new(quit: Key, done: Sender<()>) -> Self {
        Self { quit, done }
    }
}

impl Macro for DumpMacro {
    fn declare(self: Arc<Self>, m: &mut MacroScope) {
        for transition in [Transition::Down, Transition::Up] {
            let every = Predicate::new(|_: &KeyEvent| true);
            match m.when_matching(transition, every) {
                Ok(rule) => rule.named("dump").to(|ctx| {
                    let e = ctx.event();
                    info!(
                        event = %e,
                        vk = e.key.virtual_code(),
                        scan = e.scan_code,
                        injected = e.injected,
                        ours = e.self_injected,
                        time = e.time,
                        "key"
                    );
                    Ok(())
                }),
                Err(e) => warn!(error = %e, "dump_rule_refused"),
            }
        }
        let quit = self.quit;
        m.when_press(quit).consume().named("quit").run(move || {
            info!(key = %quit.to_spec(), "quit_key_pressed");
            if self.done.try_send(()).is_err() {
                debug!("quit_already_signalled");
            }
        });
    }

    fn name(&self) -> &str {
        "dump"
    }
}
