//! In-progress resolution tracking.
//!
//! Every handle carries a [`CallStack`] of the keys it is currently
//! producing. The stack is what detects cycles, and a trimmed snapshot of
//! it is handed to delegates as a [`DependencyChain`] so a factory can see
//! who asked for it.

use std::fmt;

use parking_lot::Mutex;

use graft_support::rendering::render_chain;

use crate::key::TypeKey;

/// The per-handle stack of keys currently being produced.
///
/// Pushes hand back an RAII [`Frame`]; the frame restores the stack on
/// drop, so early returns and error paths unwind it without bookkeeping.
#[derive(Default)]
pub(crate) struct CallStack {
    frames: Mutex<Vec<TypeKey>>,
}

impl CallStack {
    pub(crate) fn new() -> Self {
        CallStack::default()
    }

    pub(crate) fn contains(&self, key: &TypeKey) -> bool {
        self.frames.lock().contains(key)
    }

    /// Pushes `key` and returns the guard that pops it.
    pub(crate) fn enter(&self, key: TypeKey) -> Frame<'_> {
        let mut frames = self.frames.lock();
        let depth = frames.len();
        frames.push(key);
        Frame { stack: self, depth }
    }

    pub(crate) fn snapshot(&self) -> Vec<TypeKey> {
        self.frames.lock().clone()
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.lock().len()
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallStack").field(&self.snapshot()).finish()
    }
}

/// Open frame on a [`CallStack`]. Dropping it restores the stack to the
/// depth recorded when the frame was opened.
pub(crate) struct Frame<'a> {
    stack: &'a CallStack,
    depth: usize,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.frames.lock().truncate(self.depth);
    }
}

/// A read-only view of who is currently asking for what.
///
/// The innermost frame (the entry being produced right now) is omitted, so
/// from inside a delegate the last element is the direct requester. Index
/// 0 is the root request; negative indices step back from the end.
///
/// # Examples
/// ```
/// use graft_container::chain::DependencyChain;
///
/// let chain = DependencyChain::new(vec![
///     "app::kernel".into(),
///     "app::mailer".into(),
///     "app::transport".into(),
/// ]);
/// assert_eq!(chain.by_index(0).map(|k| k.as_str()), Some("app::kernel"));
/// assert_eq!(chain.by_index(-1).map(|k| k.as_str()), Some("app::transport"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyChain {
    keys: Vec<TypeKey>,
}

impl DependencyChain {
    pub fn new(keys: Vec<TypeKey>) -> Self {
        DependencyChain { keys }
    }

    /// Builds the delegate-visible view from a raw stack snapshot,
    /// dropping the innermost frame.
    pub(crate) fn from_stack(mut keys: Vec<TypeKey>) -> Self {
        keys.pop();
        DependencyChain { keys }
    }

    pub fn keys(&self) -> &[TypeKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The entry at `index`; negative values count back from the end.
    pub fn by_index(&self, index: isize) -> Option<&TypeKey> {
        let resolved = if index < 0 {
            index.checked_add(self.keys.len() as isize)?
        } else {
            index
        };
        usize::try_from(resolved).ok().and_then(|i| self.keys.get(i))
    }

    /// The direct requester, when there is one.
    pub fn requester(&self) -> Option<&TypeKey> {
        self.keys.last()
    }

    /// Whether `name` (normalized) appears anywhere in the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&TypeKey::new(name))
    }
}

impl fmt::Display for DependencyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_chain(&self.keys.iter().map(TypeKey::as_str).collect::<Vec<_>>()))
    }
}

impl From<Vec<&str>> for DependencyChain {
    fn from(names: Vec<&str>) -> Self {
        DependencyChain::new(names.into_iter().map(TypeKey::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_pop_on_drop() {
        let stack = CallStack::new();
        {
            let _outer = stack.enter(TypeKey::new("a"));
            assert_eq!(stack.depth(), 1);
            {
                let _inner = stack.enter(TypeKey::new("b"));
                assert_eq!(stack.depth(), 2);
                assert!(stack.contains(&TypeKey::new("a")));
                assert!(stack.contains(&TypeKey::new("b")));
            }
            assert_eq!(stack.depth(), 1);
            assert!(!stack.contains(&TypeKey::new("b")));
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn snapshot_preserves_order() {
        let stack = CallStack::new();
        let _a = stack.enter(TypeKey::new("first"));
        let _b = stack.enter(TypeKey::new("second"));
        assert_eq!(
            stack.snapshot(),
            vec![TypeKey::new("first"), TypeKey::new("second")]
        );
    }

    #[test]
    fn chain_drops_innermost_frame() {
        let chain = DependencyChain::from_stack(vec![
            TypeKey::new("root"),
            TypeKey::new("middle"),
            TypeKey::new("current"),
        ]);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.requester().map(TypeKey::as_str), Some("middle"));
        assert!(!chain.contains("current"));
    }

    #[test]
    fn negative_indexing_steps_back_from_end() {
        let chain = DependencyChain::from(vec!["a", "b", "c", "d"]);
        assert_eq!(chain.by_index(-1).map(TypeKey::as_str), Some("d"));
        assert_eq!(chain.by_index(-2).map(TypeKey::as_str), Some("c"));
        assert_eq!(chain.by_index(-4).map(TypeKey::as_str), Some("a"));
        assert_eq!(chain.by_index(-5), None);
        assert_eq!(chain.by_index(2).map(TypeKey::as_str), Some("c"));
        assert_eq!(chain.by_index(9), None);
    }

    #[test]
    fn renders_with_arrows() {
        let chain = DependencyChain::from(vec!["x", "y"]);
        assert_eq!(format!("{chain}"), "x → y");
    }
}
