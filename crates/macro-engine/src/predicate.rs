//! Composable boolean conditions.
//!
//! A [`Predicate`] is a tree of leaf tests joined by `and`/`or`. `Any` is the
//! identity for both joins: combining with it returns the other operand
//! unchanged, so an unconstrained condition never costs an evaluation.
//! Evaluation short-circuits left to right.
use std::{fmt, sync::Arc};

use regex::Regex;
use win_hook::KeyEvent;
use win_keycode::{Key, Modifier};
use winops::WindowSnapshot;

use crate::Result;

/// Test function stored in a leaf.
type Test<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A boolean condition over `T`.
pub enum Predicate<T> {
    /// Matches everything; identity for `and` and `or`.
    Any,
    /// A single test.
    Leaf(Test<T>),
    /// Both sides must hold; the right side is skipped when the left fails.
    And(Arc<Self>, Arc<Self>),
    /// Either side must hold; the right side is skipped when the left holds.
    Or(Arc<Self>, Arc<Self>),
}

/// Condition on the focused window.
pub type WindowCondition = Predicate<WindowSnapshot>;
/// Condition on a key event.
pub type KeyCondition = Predicate<KeyEvent>;

impl<T> Predicate<T> {
    /// The identity predicate.
    pub const ANY: Self = Self::Any;

    /// Wrap a test function.
    pub fn new(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self::Leaf(Arc::new(f))
    }

    /// True for the identity predicate.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Evaluate against `subject`.
    pub fn test(&self, subject: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Leaf(f) => f(subject),
            Self::And(a, b) => a.test(subject) && b.test(subject),
            Self::Or(a, b) => a.test(subject) || b.test(subject),
        }
    }

    /// Conjunction. `Any` on either side yields the other side.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self.is_any(), other.is_any()) {
            (true, _) => other,
            (_, true) => self,
            _ => Self::And(Arc::new(self), Arc::new(other)),
        }
    }

    /// Disjunction. `Any` on either side yields the other side.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self.is_any(), other.is_any()) {
            (true, _) => other,
            (_, true) => self,
            _ => Self::Or(Arc::new(self), Arc::new(other)),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Any => Self::Any,
            Self::Leaf(f) => Self::Leaf(f.clone()),
            Self::And(a, b) => Self::And(a.clone(), b.clone()),
            Self::Or(a, b) => Self::Or(a.clone(), b.clone()),
        }
    }
}

impl<T> Default for Predicate<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Leaf(_) => write!(f, "Leaf"),
            Self::And(a, b) => write!(f, "And({:?}, {:?})", a, b),
            Self::Or(a, b) => write!(f, "Or({:?}, {:?})", a, b),
        }
    }
}

/// Focused window title contains `needle`.
pub fn title_contains(needle: impl Into<String>) -> WindowCondition {
    let needle = needle.into();
    Predicate::new(move |w: &WindowSnapshot| w.title.contains(&needle))
}

/// Focused window title equals `title` exactly.
pub fn title_is(title: impl Into<String>) -> WindowCondition {
    let title = title.into();
    Predicate::new(move |w: &WindowSnapshot| w.title == title)
}

/// Focused window title matches the regular expression `pattern`.
pub fn title_matches(pattern: &str) -> Result<WindowCondition> {
    let re = Regex::new(pattern)?;
    Ok(Predicate::new(move |w: &WindowSnapshot| re.is_match(&w.title)))
}

/// True if `event` is for `want`. Side-less modifier keys match either side.
fn key_matches(want: Key, got: Key) -> bool {
    match want {
        Key::Shift | Key::Control | Key::Alt => {
            got == want || Modifier::of_key(got) == Modifier::of_key(want)
        }
        _ => got == want,
    }
}

/// Event is for `key`.
pub fn key_is(key: Key) -> KeyCondition {
    Predicate::new(move |e: &KeyEvent| key_matches(key, e.key))
}

/// Event happened with modifier `m` held.
pub fn has_modifier(m: Modifier) -> KeyCondition {
    Predicate::new(move |e: &KeyEvent| e.has(m))
}

/// Event came from hardware, not input injection.
pub fn physical() -> KeyCondition {
    Predicate::new(|e: &KeyEvent| !e.injected)
}
