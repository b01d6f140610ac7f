//! Registration tables.
//!
//! Seven maps, all keyed by normalized [`TypeKey`] except the global
//! parameter definitions, which are keyed by the verbatim parameter name.
//! Each table sits behind its own lock; accessors take the lock, act, and
//! release before any resolution or user callback can run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bitflags::bitflags;
use parking_lot::RwLock;
use tracing::debug;

use crate::args::Args;
use crate::callable::Callable;
use crate::key::TypeKey;
use crate::value::Value;

bitflags! {
    /// Selects which tables [`inspect`](crate::injector::Injector::inspect)
    /// reports. An empty filter selects everything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InspectFilter: u8 {
        const BINDINGS  = 1;
        const DELEGATES = 1 << 1;
        const PREPARES  = 1 << 2;
        const ALIASES   = 1 << 3;
        const SHARES    = 1 << 4;
    }
}

/// A point-in-time snapshot of the inspectable tables.
///
/// Shares report pending entries as `None` values.
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    pub bindings: BTreeMap<TypeKey, Args>,
    pub delegates: BTreeMap<TypeKey, Callable>,
    pub prepares: BTreeMap<TypeKey, Callable>,
    pub aliases: BTreeMap<TypeKey, String>,
    pub shares: BTreeMap<TypeKey, Option<Value>>,
}

impl Inspection {
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
            && self.delegates.is_empty()
            && self.prepares.is_empty()
            && self.aliases.is_empty()
            && self.shares.is_empty()
    }
}

/// The injector's mutable registration state.
#[derive(Default)]
pub(crate) struct Registries {
    aliases: RwLock<HashMap<TypeKey, String>>,
    shares: RwLock<HashMap<TypeKey, Option<Value>>>,
    delegates: RwLock<HashMap<TypeKey, Callable>>,
    prepares: RwLock<HashMap<TypeKey, Callable>>,
    proxies: RwLock<HashMap<TypeKey, Callable>>,
    definitions: RwLock<HashMap<TypeKey, Args>>,
    params: RwLock<HashMap<String, Value>>,
}

impl Registries {
    pub(crate) fn new() -> Self {
        Registries::default()
    }

    // ─── aliases ───

    pub(crate) fn alias_target(&self, key: &TypeKey) -> Option<String> {
        self.aliases.read().get(key).cloned()
    }

    pub(crate) fn has_alias(&self, key: &TypeKey) -> bool {
        self.aliases.read().contains_key(key)
    }

    pub(crate) fn set_alias(&self, key: TypeKey, target: String) {
        debug!(from = %key, to = %target, "Registered alias");
        self.aliases.write().insert(key, target);
    }

    // ─── shares ───

    /// The share slot: `None` when the key is not shared, `Some(None)`
    /// when marked pending, `Some(Some(_))` when built.
    pub(crate) fn share_slot(&self, key: &TypeKey) -> Option<Option<Value>> {
        self.shares.read().get(key).cloned()
    }

    pub(crate) fn shared_value(&self, key: &TypeKey) -> Option<Value> {
        self.shares.read().get(key).cloned().flatten()
    }

    pub(crate) fn has_share(&self, key: &TypeKey) -> bool {
        self.shares.read().contains_key(key)
    }

    /// Marks `key` shared without building it. Idempotent; an already
    /// built instance stays.
    pub(crate) fn mark_share_pending(&self, key: &TypeKey) {
        debug!(key = %key, "Marked share pending");
        self.shares.write().entry(key.clone()).or_insert(None);
    }

    /// Fills the slot only while it is still pending.
    pub(crate) fn store_if_pending(&self, key: &TypeKey, value: &Value) {
        let mut shares = self.shares.write();
        if let Some(slot) = shares.get_mut(key) {
            if slot.is_none() {
                debug!(key = %key, "Stored shared instance");
                *slot = Some(value.clone());
            }
        }
    }

    /// Stores a built instance outright.
    pub(crate) fn store_shared(&self, key: &TypeKey, value: Value) {
        debug!(key = %key, "Stored shared instance");
        self.shares.write().insert(key.clone(), Some(value));
    }

    /// Moves a pending mark from `from` to `to`, for alias registration
    /// over a share-marked key. A built instance under `to` is kept.
    pub(crate) fn migrate_pending_share(&self, from: &TypeKey, to: &TypeKey) {
        let mut shares = self.shares.write();
        if matches!(shares.get(from), Some(None)) {
            debug!(from = %from, to = %to, "Migrated pending share");
            shares.remove(from);
            shares.entry(to.clone()).or_insert(None);
        }
    }

    // ─── delegates, prepares, proxies ───

    pub(crate) fn delegate_for(&self, key: &TypeKey) -> Option<Callable> {
        self.delegates.read().get(key).cloned()
    }

    pub(crate) fn has_delegate(&self, key: &TypeKey) -> bool {
        self.delegates.read().contains_key(key)
    }

    pub(crate) fn set_delegate(&self, key: TypeKey, callable: Callable) {
        debug!(key = %key, callable = %callable.render(), "Registered delegate");
        self.delegates.write().insert(key, callable);
    }

    pub(crate) fn prepare_for(&self, key: &TypeKey) -> Option<Callable> {
        self.prepares.read().get(key).cloned()
    }

    pub(crate) fn set_prepare(&self, key: TypeKey, callable: Callable) {
        debug!(key = %key, callable = %callable.render(), "Registered preparer");
        self.prepares.write().insert(key, callable);
    }

    pub(crate) fn proxy_for(&self, key: &TypeKey) -> Option<Callable> {
        self.proxies.read().get(key).cloned()
    }

    pub(crate) fn has_proxy(&self, key: &TypeKey) -> bool {
        self.proxies.read().contains_key(key)
    }

    pub(crate) fn set_proxy(&self, key: TypeKey, callable: Callable) {
        debug!(key = %key, callable = %callable.render(), "Registered proxy");
        self.proxies.write().insert(key, callable);
    }

    // ─── argument definitions ───

    pub(crate) fn definition_for(&self, key: &TypeKey) -> Option<Args> {
        self.definitions.read().get(key).cloned()
    }

    pub(crate) fn set_definition(&self, key: TypeKey, args: Args) {
        debug!(key = %key, entries = args.len(), "Registered definition");
        self.definitions.write().insert(key, args);
    }

    pub(crate) fn param_for(&self, name: &str) -> Option<Value> {
        self.params.read().get(name).cloned()
    }

    pub(crate) fn set_param(&self, name: String, value: Value) {
        debug!(param = %name, "Registered parameter definition");
        self.params.write().insert(name, value);
    }

    // ─── inspection ───

    /// Snapshots the inspectable tables, filtered by key and mask.
    pub(crate) fn inspect(&self, name: Option<&TypeKey>, filter: InspectFilter) -> Inspection {
        let filter = if filter.is_empty() { InspectFilter::all() } else { filter };
        let wanted = |key: &TypeKey| name.is_none_or(|n| n == key);
        let mut report = Inspection::default();

        if filter.contains(InspectFilter::BINDINGS) {
            report.bindings = self
                .definitions
                .read()
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        if filter.contains(InspectFilter::DELEGATES) {
            report.delegates = self
                .delegates
                .read()
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        if filter.contains(InspectFilter::PREPARES) {
            report.prepares = self
                .prepares
                .read()
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        if filter.contains(InspectFilter::ALIASES) {
            report.aliases = self
                .aliases
                .read()
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        if filter.contains(InspectFilter::SHARES) {
            report.shares = self
                .shares
                .read()
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        report
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registries")
            .field("aliases", &self.aliases.read().len())
            .field("shares", &self.shares.read().len())
            .field("delegates", &self.delegates.read().len())
            .field("prepares", &self.prepares.read().len())
            .field("proxies", &self.proxies.read().len())
            .field("definitions", &self.definitions.read().len())
            .field("params", &self.params.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> TypeKey {
        TypeKey::new(name)
    }

    #[test]
    fn share_slot_distinguishes_pending_from_built() {
        let regs = Registries::new();
        assert!(regs.share_slot(&key("a")).is_none());

        regs.mark_share_pending(&key("a"));
        assert!(matches!(regs.share_slot(&key("a")), Some(None)));
        assert!(regs.shared_value(&key("a")).is_none());

        regs.store_if_pending(&key("a"), &Value::from("built"));
        assert!(regs.shared_value(&key("a")).is_some());
    }

    #[test]
    fn store_if_pending_never_clobbers_built() {
        let regs = Registries::new();
        regs.mark_share_pending(&key("a"));
        regs.store_if_pending(&key("a"), &Value::from("first"));
        regs.store_if_pending(&key("a"), &Value::from("second"));

        let held = regs.shared_value(&key("a")).unwrap();
        assert_eq!(held.downcast_ref::<String>().map(String::as_str), Some("first"));
    }

    #[test]
    fn marking_pending_keeps_existing_instance() {
        let regs = Registries::new();
        regs.store_shared(&key("a"), Value::from("kept"));
        regs.mark_share_pending(&key("a"));
        assert!(regs.shared_value(&key("a")).is_some());
    }

    #[test]
    fn pending_share_migrates_between_keys() {
        let regs = Registries::new();
        regs.mark_share_pending(&key("iface"));
        regs.migrate_pending_share(&key("iface"), &key("impl"));

        assert!(regs.share_slot(&key("iface")).is_none());
        assert!(matches!(regs.share_slot(&key("impl")), Some(None)));
    }

    #[test]
    fn built_share_does_not_migrate() {
        let regs = Registries::new();
        regs.store_shared(&key("iface"), Value::from("held"));
        regs.migrate_pending_share(&key("iface"), &key("impl"));

        assert!(regs.shared_value(&key("iface")).is_some());
        assert!(regs.share_slot(&key("impl")).is_none());
    }

    #[test]
    fn inspect_empty_filter_selects_everything() {
        let regs = Registries::new();
        regs.set_alias(key("iface"), "Impl".to_string());
        regs.mark_share_pending(&key("impl"));
        regs.set_delegate(key("widget"), Callable::name("make_widget"));

        let report = regs.inspect(None, InspectFilter::empty());
        assert_eq!(report.aliases.len(), 1);
        assert_eq!(report.shares.len(), 1);
        assert_eq!(report.delegates.len(), 1);
        assert!(matches!(report.shares.get(&key("impl")), Some(None)));
    }

    #[test]
    fn inspect_filters_by_mask_and_name() {
        let regs = Registries::new();
        regs.set_alias(key("iface"), "Impl".to_string());
        regs.set_alias(key("other"), "Elsewhere".to_string());
        regs.set_delegate(key("iface"), Callable::name("make_impl"));

        let report = regs.inspect(Some(&key("iface")), InspectFilter::ALIASES);
        assert_eq!(report.aliases.len(), 1);
        assert!(report.delegates.is_empty());

        let report = regs.inspect(None, InspectFilter::ALIASES);
        assert_eq!(report.aliases.len(), 2);
    }
}
