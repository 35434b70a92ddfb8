//! Declaration surface for macros.
//!
//! ```ignore
//! fn declare(self: Arc<Self>, m: &mut MacroScope) {
//!     m.require_title("League of Legends (TM) Client", |m| {
//!         m.when(Key::F12).consume().press().to(|ctx| ctx.press(Key::Q));
//!         m.when_press(Key::S).with_ctrl().run(|| tracing::info!("saved"));
//!     });
//! }
//! ```
//!
//! Each rule captures the window condition in force where it is declared, so
//! `require` blocks narrow exactly the rules written inside them.
use std::sync::Arc;

use tracing::debug;
use win_hook::Transition;
use win_keycode::{Key, Modifier, Modifiers};

use crate::{
    ActionCtx, Error, Result,
    predicate::{self, KeyCondition, Predicate, WindowCondition},
    rule::{Registry, Rule},
};

/// Declaration context handed to [`crate::Macro::declare`].
pub struct MacroScope {
    registry: Arc<Registry>,
    name: Arc<str>,
    /// Window condition applied to rules declared from here on.
    window: WindowCondition,
    require_key: bool,
    declared: usize,
}

impl MacroScope {
    pub(crate) fn new(registry: Arc<Registry>, name: &str, require_key: bool) -> Self {
        Self {
            registry,
            name: name.into(),
            window: Predicate::ANY,
            require_key,
            declared: 0,
        }
    }

    /// Name of the macro being declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules registered through this scope so far.
    pub fn declared(&self) -> usize {
        self.declared
    }

    /// The window condition new rules will capture.
    pub fn window_condition(&self) -> &WindowCondition {
        &self.window
    }

    /// Start a rule on key-down of `key`.
    pub fn when_press(&mut self, key: Key) -> RuleBuilder<'_, Bound> {
        self.when(key).press()
    }

    /// Start a rule on key-up of `key`.
    pub fn when_release(&mut self, key: Key) -> RuleBuilder<'_, Bound> {
        self.when(key).release()
    }

    /// Start a rule on `key`; pick the direction with `press`/`release`.
    pub fn when(&mut self, key: Key) -> RuleBuilder<'_, Unbound> {
        RuleBuilder::start(self, predicate::key_is(key), key.to_spec(), Unbound)
    }

    /// Start a rule on an arbitrary key condition.
    ///
    /// Fails with [`Error::UnconstrainedKey`] when `keys` is `Any` and the
    /// engine is configured to require a key.
    pub fn when_matching(
        &mut self,
        transition: Transition,
        keys: KeyCondition,
    ) -> Result<RuleBuilder<'_, Bound>> {
        if keys.is_any() && self.require_key {
            return Err(Error::UnconstrainedKey);
        }
        Ok(RuleBuilder::start(
            self,
            keys,
            "custom".to_string(),
            Bound(transition),
        ))
    }

    /// Declare the rules in `block` under the extra window `condition`.
    pub fn require(&mut self, condition: WindowCondition, block: impl FnOnce(&mut Self)) {
        let outer = self.window.clone();
        self.window = outer.clone().and(condition);
        block(self);
        self.window = outer;
    }

    /// Declare the rules in `block` for windows whose title contains `title`.
    pub fn require_title(&mut self, title: &str, block: impl FnOnce(&mut Self)) {
        self.require(predicate::title_contains(title), block);
    }

    /// Narrow every rule declared from here on by `condition`.
    pub fn require_always(&mut self, condition: WindowCondition) {
        self.window = self.window.clone().and(condition);
    }

    /// Narrow every later rule to windows whose title contains `title`.
    pub fn require_title_always(&mut self, title: &str) {
        self.require_always(predicate::title_contains(title));
    }

    fn register(&mut self, transition: Transition, rule: Rule) {
        debug!(
            rule = %rule.label,
            consume = rule.consumable,
            windowed = !rule.window_is_any(),
            "rule_registered"
        );
        self.registry.add(transition, rule);
        self.declared += 1;
    }
}

/// Builder state: direction not yet chosen.
#[derive(Debug)]
pub struct Unbound;

/// Builder state: direction chosen, ready for an action.
#[derive(Debug)]
pub struct Bound(Transition);

/// A rule under construction.
///
/// Nothing is registered until [`RuleBuilder::to`] or [`RuleBuilder::run`]
/// binds the action; both take the builder by value, so a rule gets exactly
/// one action.
#[must_use = "a rule is registered only once `to` or `run` binds an action"]
pub struct RuleBuilder<'s, S> {
    scope: &'s mut MacroScope,
    window: WindowCondition,
    keys: KeyCondition,
    consumable: bool,
    desc: String,
    mods: Modifiers,
    label: Option<String>,
    state: S,
}

impl<'s, S> RuleBuilder<'s, S> {
    fn start(scope: &'s mut MacroScope, keys: KeyCondition, desc: String, state: S) -> Self {
        let window = scope.window.clone();
        Self {
            scope,
            window,
            keys,
            consumable: false,
            desc,
            mods: Modifiers::empty(),
            label: None,
            state,
        }
    }

    fn with_state<T>(self, state: T) -> RuleBuilder<'s, T> {
        RuleBuilder {
            scope: self.scope,
            window: self.window,
            keys: self.keys,
            consumable: self.consumable,
            desc: self.desc,
            mods: self.mods,
            label: self.label,
            state,
        }
    }

    /// Require modifier `m` to be held.
    pub fn with_modifier(mut self, m: Modifier) -> Self {
        self.keys = self.keys.and(predicate::has_modifier(m));
        self.mods |= Modifiers::from(m);
        self
    }

    /// Require Control.
    pub fn with_ctrl(self) -> Self {
        self.with_modifier(Modifier::Control)
    }

    /// Require Alt.
    pub fn with_alt(self) -> Self {
        self.with_modifier(Modifier::Alt)
    }

    /// Require Shift.
    pub fn with_shift(self) -> Self {
        self.with_modifier(Modifier::Shift)
    }

    /// Require a Windows key.
    pub fn with_win(self) -> Self {
        self.with_modifier(Modifier::Win)
    }

    /// Add an arbitrary condition on the event.
    pub fn also(mut self, keys: KeyCondition) -> Self {
        self.keys = self.keys.and(keys);
        self
    }

    /// Ignore injected events.
    pub fn physical(mut self) -> Self {
        self.keys = self.keys.and(predicate::physical());
        self
    }

    /// Stop matched events from reaching other applications.
    pub fn consume(mut self) -> Self {
        self.consumable = true;
        self
    }

    /// Name the rule in logs.
    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<'s> RuleBuilder<'s, Unbound> {
    /// Fire on key-down.
    pub fn press(self) -> RuleBuilder<'s, Bound> {
        self.with_state(Bound(Transition::Down))
    }

    /// Fire on key-up.
    pub fn release(self) -> RuleBuilder<'s, Bound> {
        self.with_state(Bound(Transition::Up))
    }
}

impl RuleBuilder<'_, Bound> {
    /// Bind an action that receives the [`ActionCtx`] and register the rule.
    pub fn to<F>(self, action: F)
    where
        F: Fn(&ActionCtx) -> Result<()> + Send + Sync + 'static,
    {
        let transition = self.state.0;
        let label = self.label.unwrap_or_else(|| {
            let dir = match transition {
                Transition::Down => "press",
                Transition::Up => "release",
            };
            if self.mods.is_empty() {
                format!("{}:{}:{}", self.scope.name, dir, self.desc)
            } else {
                format!(
                    "{}:{}:{}+{}",
                    self.scope.name,
                    dir,
                    self.mods.to_spec(),
                    self.desc
                )
            }
        });
        let rule = Rule::new(
            label,
            self.window,
            self.keys,
            self.consumable,
            Arc::new(action),
        );
        self.scope.register(transition, rule);
    }

    /// Bind a plain closure and register the rule.
    pub fn run<F>(self, action: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.to(move |_| {
            action();
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use winops::WindowSnapshot;

    use super::*;

    fn scope(require_key: bool) -> (MacroScope, Arc<Registry>) {
        let reg = Arc::new(Registry::new());
        (MacroScope::new(reg.clone(), "test", require_key), reg)
    }

    #[test]
    fn nothing_registered_until_bound() {
        let (mut m, reg) = scope(true);
        drop(m.when(Key::A).consume());
        assert!(reg.is_empty());
        m.when_press(Key::A).run(|| {});
        assert_eq!(reg.list(Transition::Down).len(), 1);
        assert_eq!(m.declared(), 1);
    }

    #[test]
    fn press_and_release_pick_lists() {
        let (mut m, reg) = scope(true);
        m.when(Key::A).press().run(|| {});
        m.when(Key::A).release().run(|| {});
        m.when_release(Key::B).run(|| {});
        assert_eq!(reg.list(Transition::Down).len(), 1);
        assert_eq!(reg.list(Transition::Up).len(), 2);
    }

    #[test]
    fn labels_describe_the_binding() {
        let (mut m, reg) = scope(true);
        m.when(Key::S).with_ctrl().with_shift().press().run(|| {});
        m.when_release(Key::F1).named("help").run(|| {});
        let press = reg.list(Transition::Down).snapshot();
        let release = reg.list(Transition::Up).snapshot();
        assert_eq!(press[0].label(), "test:press:ctrl+shift+s");
        assert_eq!(release[0].label(), "help");
    }

    #[test]
    fn require_scopes_only_its_block() {
        let (mut m, reg) = scope(true);
        m.require_title("Game", |m| {
            m.when_press(Key::Q).run(|| {});
            m.require_title("Lobby", |m| m.when_press(Key::W).run(|| {}));
        });
        m.when_press(Key::E).run(|| {});
        let rules = reg.list(Transition::Down).snapshot();
        let game = WindowSnapshot::new("Game", 1);
        let lobby = WindowSnapshot::new("Game Lobby", 1);
        let other = WindowSnapshot::new("Editor", 1);
        assert!(rules[0].window_allows(&game) && !rules[0].window_allows(&other));
        assert!(!rules[1].window_allows(&game) && rules[1].window_allows(&lobby));
        assert!(rules[2].window_is_any());
        assert!(m.window_condition().is_any());
    }

    #[test]
    fn require_always_narrows_later_rules() {
        let (mut m, reg) = scope(true);
        m.when_press(Key::A).run(|| {});
        m.require_title_always("Game");
        m.when_press(Key::B).run(|| {});
        let rules = reg.list(Transition::Down).snapshot();
        assert!(rules[0].window_is_any());
        assert!(!rules[1].window_is_any());
    }

    #[test]
    fn unconstrained_key_is_refused_when_required() {
        let (mut m, reg) = scope(true);
        assert!(matches!(
            m.when_matching(Transition::Down, Predicate::ANY),
            Err(Error::UnconstrainedKey)
        ));
        let (mut lax, lax_reg) = scope(false);
        lax.when_matching(Transition::Down, Predicate::ANY)
            .unwrap()
            .run(|| {});
        assert!(reg.is_empty());
        assert_eq!(lax_reg.len(), 1);
    }
}
