//! Rules and the press/release registry.
use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use win_hook::{KeyEvent, Transition};
use winops::WindowSnapshot;

use crate::{
    ActionCtx, Result,
    predicate::{KeyCondition, WindowCondition},
};

/// A bound action.
pub type Action = Arc<dyn Fn(&ActionCtx) -> Result<()> + Send + Sync>;

/// A declared binding of window condition, key condition, consume flag and action.
pub struct Rule {
    pub(crate) label: Arc<str>,
    pub(crate) window: WindowCondition,
    pub(crate) keys: KeyCondition,
    pub(crate) consumable: bool,
    pub(crate) action: Action,
}

impl Rule {
    /// Build a rule directly.
    pub fn new(
        label: impl Into<Arc<str>>,
        window: WindowCondition,
        keys: KeyCondition,
        consumable: bool,
        action: Action,
    ) -> Self {
        Self {
            label: label.into(),
            window,
            keys,
            consumable,
            action,
        }
    }

    /// Name used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True if the rule blocks events it matches.
    pub fn is_consumable(&self) -> bool {
        self.consumable
    }

    /// True if the window condition holds for `window`.
    pub fn window_allows(&self, window: &WindowSnapshot) -> bool {
        self.window.test(window)
    }

    /// True if the key condition holds for `event`.
    pub fn keys_match(&self, event: &KeyEvent) -> bool {
        self.keys.test(event)
    }

    /// True if the rule places no condition on the window.
    pub fn window_is_any(&self) -> bool {
        self.window.is_any()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("window", &self.window)
            .field("keys", &self.keys)
            .field("consumable", &self.consumable)
            .finish_non_exhaustive()
    }
}

/// Ordered rules, appended while readers iterate.
///
/// Readers take a snapshot of the current list; an append publishes a new
/// list and never disturbs a snapshot already taken.
#[derive(Default)]
pub struct RuleList {
    rules: RwLock<Arc<Vec<Arc<Rule>>>>,
}

impl RuleList {
    /// Current rules in declaration order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Rule>>> {
        self.rules.read().clone()
    }

    /// Append a rule.
    pub fn push(&self, rule: Rule) {
        let mut guard = self.rules.write();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(Arc::new(rule));
        *guard = Arc::new(next);
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// True if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self) {
        *self.rules.write() = Arc::new(Vec::new());
    }
}

/// Press and release rule lists.
#[derive(Default)]
pub struct Registry {
    press: RuleList,
    release: RuleList,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The list consulted for `transition`.
    pub fn list(&self, transition: Transition) -> &RuleList {
        match transition {
            Transition::Down => &self.press,
            Transition::Up => &self.release,
        }
    }

    /// Append `rule` to the list for `transition`.
    pub fn add(&self, transition: Transition, rule: Rule) {
        self.list(transition).push(rule);
    }

    /// Total rules across both lists.
    pub fn len(&self) -> usize {
        self.press.len() + self.release.len()
    }

    /// True if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every rule. Only used at teardown.
    pub(crate) fn clear(&self) {
        self.press.clear();
        self.release.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Predicate, key_is};
    use win_keycode::Key;

    fn rule(label: &str) -> Rule {
        Rule::new(
            label,
            Predicate::ANY,
            key_is(Key::A),
            false,
            Arc::new(|_: &ActionCtx| Ok(())),
        )
    }

    #[test]
    fn snapshot_is_stable_across_append() {
        let list = RuleList::default();
        list.push(rule("one"));
        let before = list.snapshot();
        list.push(rule("two"));
        assert_eq!(before.len(), 1);
        let after = list.snapshot();
        let labels: Vec<&str> = after.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["one", "two"]);
    }

    #[test]
    fn registry_routes_by_transition() {
        let reg = Registry::new();
        reg.add(Transition::Down, rule("p"));
        reg.add(Transition::Up, rule("r1"));
        reg.add(Transition::Up, rule("r2"));
        assert_eq!(reg.list(Transition::Down).len(), 1);
        assert_eq!(reg.list(Transition::Up).len(), 2);
        assert_eq!(reg.len(), 3);
        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let list = Arc::new(RuleList::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let list = list.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        list.push(rule(&format!("{i}-{j}")));
                        let _ = list.snapshot().len();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(list.len(), 200);
    }
}
