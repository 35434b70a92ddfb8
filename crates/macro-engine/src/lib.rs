//! Keyboard macro engine.
//!
//! Rules are declared through a small builder DSL ([`MacroScope`]), kept in a
//! press/release [`Registry`], and matched on the hook thread by the
//! [`Dispatcher`]. Matched actions run on a bounded [`Executor`] so nothing a
//! macro does can stall system input.
//!
//! [`MacroService`] ties these together with the keyboard hook:
//!
//! ```ignore
//! #[derive(Default)]
//! struct Quick;
//!
//! impl Macro for Quick {
//!     fn declare(self: Arc<Self>, m: &mut MacroScope) {
//!         m.when(Key::F12).consume().press().to(|ctx| ctx.press(Key::Q));
//!     }
//! }
//!
//! let service = MacroService::new(Config::default())?;
//! service.activate::<Quick>();
//! service.start()?;
//! ```
mod config;
mod context;
mod dispatch;
mod dsl;
mod error;
mod executor;
pub mod predicate;
mod rule;
mod service;

pub use config::{Config, ExecutorConfig};
pub use context::ActionCtx;
pub use dispatch::Dispatcher;
pub use dsl::{Bound, MacroScope, RuleBuilder, Unbound};
pub use error::{Error, Result};
pub use executor::{Executor, ExecutorStats};
pub use predicate::{KeyCondition, Predicate, WindowCondition};
pub use rule::{Action, Registry, Rule, RuleList};
pub use service::{Macro, MacroService};
pub use win_hook::{KeyEvent, Transition};
pub use win_keycode::{Key, Modifier, Modifiers};
pub use winops::{Rgb, WindowSnapshot};
