//! Reflection caching.
//!
//! Schema lookups are cheap but hot; resolution touches the reflector for
//! every un-shared make. [`CachingReflector`] decorates any [`Reflector`]
//! with a [`ReflectionCache`], and two cache implementations are provided:
//! a per-injector map and a two-tier variant backed by a process-wide map
//! with expiring entries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::error::ReflectionError;
use crate::key::TypeKey;
use crate::reflect::{Reflector, StandardReflector};
use crate::schema::{
    ConstructorSpec, FunctionSchema, MethodSchema, ParamSpec, SchemaRegistry, TypeInfo,
};
use crate::value::Value;

pub const CACHE_KEY_CLASSES: &str = "injector.refls.classes.";
pub const CACHE_KEY_CTORS: &str = "injector.refls.ctors.";
pub const CACHE_KEY_CTOR_PARAMS: &str = "injector.refls.ctor-params.";
pub const CACHE_KEY_FUNCS: &str = "injector.refls.funcs.";
pub const CACHE_KEY_METHODS: &str = "injector.refls.methods.";

/// One cached reflector product.
///
/// `Constructor(None)` and `Params(None)` are real entries: "this type has
/// no constructor" is a cacheable answer, distinct from a cache miss.
#[derive(Clone)]
pub enum CacheEntry {
    Class(Arc<TypeInfo>),
    Constructor(Option<Arc<ConstructorSpec>>),
    Params(Option<Arc<[ParamSpec]>>),
    Function(Arc<FunctionSchema>),
    Method(Arc<MethodSchema>),
}

/// Storage behind a [`CachingReflector`].
pub trait ReflectionCache: Send + Sync {
    fn fetch(&self, key: &str) -> Option<CacheEntry>;
    fn store(&self, key: String, entry: CacheEntry);
}

/// Per-injector in-memory cache.
#[derive(Default)]
pub struct ArrayReflectionCache {
    entries: DashMap<String, CacheEntry>,
}

impl ArrayReflectionCache {
    pub fn new() -> Self {
        ArrayReflectionCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReflectionCache for ArrayReflectionCache {
    fn fetch(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    fn store(&self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }
}

// Shared across every SharedReflectionCache in the process.
static SHARED_TIER: Lazy<DashMap<String, (CacheEntry, Instant)>> = Lazy::new(DashMap::new);

const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(5);

/// Two-tier cache: a per-injector map read first, over a process-wide
/// shared map whose entries expire.
///
/// Stores write through to both tiers; shared-tier hits are promoted into
/// the local tier. Expiry applies to the shared tier only.
pub struct SharedReflectionCache {
    local: ArrayReflectionCache,
    time_to_live: Duration,
}

impl SharedReflectionCache {
    pub fn new() -> Self {
        SharedReflectionCache {
            local: ArrayReflectionCache::new(),
            time_to_live: DEFAULT_TIME_TO_LIVE,
        }
    }

    /// Sets the shared-tier expiry applied to future stores.
    /// Non-positive values are ignored.
    pub fn set_time_to_live(&mut self, seconds: i64) {
        if seconds > 0 {
            self.time_to_live = Duration::from_secs(seconds as u64);
        }
    }

    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }
}

impl Default for SharedReflectionCache {
    fn default() -> Self {
        SharedReflectionCache::new()
    }
}

impl ReflectionCache for SharedReflectionCache {
    fn fetch(&self, key: &str) -> Option<CacheEntry> {
        if let Some(hit) = self.local.fetch(key) {
            return Some(hit);
        }

        let (entry, expires_at) = SHARED_TIER.get(key).map(|r| r.value().clone())?;
        if Instant::now() >= expires_at {
            // Only evict if still expired, in case another handle re-stored.
            SHARED_TIER.remove_if(key, |_, (_, at)| Instant::now() >= *at);
            return None;
        }

        self.local.store(key.to_owned(), entry.clone());
        Some(entry)
    }

    fn store(&self, key: String, entry: CacheEntry) {
        self.local.store(key.clone(), entry.clone());
        SHARED_TIER.insert(key, (entry, Instant::now() + self.time_to_live));
    }
}

/// Decorates a reflector with a cache.
///
/// Cache keys are namespaced per lookup category so one name can hold a
/// class record, a constructor, and a parameter list side by side.
/// Lookup failures are never cached.
pub struct CachingReflector<R = StandardReflector, C = ArrayReflectionCache> {
    reflector: R,
    cache: C,
}

impl<R: Reflector, C: ReflectionCache> CachingReflector<R, C> {
    pub fn new(reflector: R, cache: C) -> Self {
        CachingReflector { reflector, cache }
    }
}

impl CachingReflector {
    /// The default stack: a [`StandardReflector`] over the registry,
    /// cached per injector.
    pub fn standard(registry: Arc<SchemaRegistry>) -> Self {
        CachingReflector::new(StandardReflector::new(registry), ArrayReflectionCache::new())
    }
}

impl<R: Reflector, C: ReflectionCache> Reflector for CachingReflector<R, C> {
    fn class(&self, name: &str) -> Result<Arc<TypeInfo>, ReflectionError> {
        let cache_key = format!("{CACHE_KEY_CLASSES}{}", TypeKey::new(name));
        if let Some(CacheEntry::Class(info)) = self.cache.fetch(&cache_key) {
            trace!(key = %cache_key, "reflection cache hit");
            return Ok(info);
        }
        let info = self.reflector.class(name)?;
        self.cache.store(cache_key, CacheEntry::Class(info.clone()));
        Ok(info)
    }

    fn constructor(&self, name: &str) -> Result<Option<Arc<ConstructorSpec>>, ReflectionError> {
        let cache_key = format!("{CACHE_KEY_CTORS}{}", TypeKey::new(name));
        if let Some(CacheEntry::Constructor(ctor)) = self.cache.fetch(&cache_key) {
            trace!(key = %cache_key, "reflection cache hit");
            return Ok(ctor);
        }
        let ctor = self.reflector.constructor(name)?;
        self.cache.store(cache_key, CacheEntry::Constructor(ctor.clone()));
        Ok(ctor)
    }

    fn constructor_params(
        &self,
        name: &str,
    ) -> Result<Option<Arc<[ParamSpec]>>, ReflectionError> {
        let cache_key = format!("{CACHE_KEY_CTOR_PARAMS}{}", TypeKey::new(name));
        if let Some(CacheEntry::Params(params)) = self.cache.fetch(&cache_key) {
            trace!(key = %cache_key, "reflection cache hit");
            return Ok(params);
        }
        let params = self.reflector.constructor_params(name)?;
        self.cache.store(cache_key, CacheEntry::Params(params.clone()));
        Ok(params)
    }

    fn function(&self, name: &str) -> Result<Arc<FunctionSchema>, ReflectionError> {
        let cache_key = format!("{CACHE_KEY_FUNCS}{}", name.to_lowercase());
        if let Some(CacheEntry::Function(function)) = self.cache.fetch(&cache_key) {
            trace!(key = %cache_key, "reflection cache hit");
            return Ok(function);
        }
        let function = self.reflector.function(name)?;
        self.cache.store(cache_key, CacheEntry::Function(function.clone()));
        Ok(function)
    }

    fn method(
        &self,
        type_name: &str,
        method: &str,
    ) -> Result<Arc<MethodSchema>, ReflectionError> {
        let cache_key = format!(
            "{CACHE_KEY_METHODS}{}.{}",
            TypeKey::new(type_name),
            method.to_lowercase()
        );
        if let Some(CacheEntry::Method(schema)) = self.cache.fetch(&cache_key) {
            trace!(key = %cache_key, "reflection cache hit");
            return Ok(schema);
        }
        let schema = self.reflector.method(type_name, method)?;
        self.cache.store(cache_key, CacheEntry::Method(schema.clone()));
        Ok(schema)
    }

    fn method_of(
        &self,
        instance: &Value,
        method: &str,
    ) -> Result<Arc<MethodSchema>, ReflectionError> {
        // Keyed by runtime instance, not by name; not worth caching.
        self.reflector.method_of(instance, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSchema;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Gadget;

    fn registry() -> Arc<SchemaRegistry> {
        let registry = SchemaRegistry::new();
        registry
            .register_type(
                TypeSchema::concrete::<Gadget>("tests::Gadget")
                    .factory(|_| Ok(Value::of(Gadget))),
            )
            .unwrap();
        Arc::new(registry)
    }

    struct CountingReflector {
        inner: StandardReflector,
        class_calls: AtomicUsize,
    }

    impl Reflector for CountingReflector {
        fn class(&self, name: &str) -> Result<Arc<TypeInfo>, ReflectionError> {
            self.class_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.class(name)
        }
        fn constructor(
            &self,
            name: &str,
        ) -> Result<Option<Arc<ConstructorSpec>>, ReflectionError> {
            self.inner.constructor(name)
        }
        fn constructor_params(
            &self,
            name: &str,
        ) -> Result<Option<Arc<[ParamSpec]>>, ReflectionError> {
            self.inner.constructor_params(name)
        }
        fn function(&self, name: &str) -> Result<Arc<FunctionSchema>, ReflectionError> {
            self.inner.function(name)
        }
        fn method(
            &self,
            type_name: &str,
            method: &str,
        ) -> Result<Arc<MethodSchema>, ReflectionError> {
            self.inner.method(type_name, method)
        }
        fn method_of(
            &self,
            instance: &Value,
            method: &str,
        ) -> Result<Arc<MethodSchema>, ReflectionError> {
            self.inner.method_of(instance, method)
        }
    }

    #[test]
    fn array_cache_round_trips_entries() {
        let cache = ArrayReflectionCache::new();
        assert!(cache.fetch("injector.refls.funcs.f").is_none());

        let schema = Arc::new(FunctionSchema::new("f", vec![], |_, _| Ok(Value::null())));
        cache.store("injector.refls.funcs.f".into(), CacheEntry::Function(schema));

        assert!(matches!(
            cache.fetch("injector.refls.funcs.f"),
            Some(CacheEntry::Function(_))
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn caching_reflector_hits_after_first_lookup() {
        let counting = CountingReflector {
            inner: StandardReflector::new(registry()),
            class_calls: AtomicUsize::new(0),
        };
        let caching = CachingReflector::new(counting, ArrayReflectionCache::new());

        caching.class("tests::Gadget").unwrap();
        // Same key modulo normalization, so the second read is a hit.
        caching.class("TESTS::GADGET").unwrap();

        assert_eq!(caching.reflector.class_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn caching_reflector_does_not_cache_misses() {
        let caching = CachingReflector::standard(registry());
        assert!(caching.class("tests::Nope").is_err());
        assert!(caching.class("tests::Nope").is_err());
        assert!(caching.class("tests::Gadget").is_ok());
    }

    #[test]
    fn absent_constructor_is_a_cacheable_answer() {
        let registry = SchemaRegistry::new();
        registry
            .register_type(TypeSchema::interface("tests::Port"))
            .unwrap();
        let caching = CachingReflector::standard(Arc::new(registry));

        assert!(caching.constructor("tests::Port").unwrap().is_none());
        // Second read comes from the cache and must still be None.
        assert!(caching.constructor("tests::Port").unwrap().is_none());
    }

    #[test]
    fn shared_cache_is_visible_across_instances() {
        let writer = SharedReflectionCache::new();
        let schema = Arc::new(FunctionSchema::new("shared_fn", vec![], |_, _| {
            Ok(Value::null())
        }));
        writer.store(
            "injector.refls.funcs.cross-instance".into(),
            CacheEntry::Function(schema),
        );

        let reader = SharedReflectionCache::new();
        assert!(matches!(
            reader.fetch("injector.refls.funcs.cross-instance"),
            Some(CacheEntry::Function(_))
        ));
    }

    #[test]
    fn shared_cache_ignores_non_positive_ttl() {
        let mut cache = SharedReflectionCache::new();
        assert_eq!(cache.time_to_live(), Duration::from_secs(5));

        cache.set_time_to_live(0);
        assert_eq!(cache.time_to_live(), Duration::from_secs(5));
        cache.set_time_to_live(-3);
        assert_eq!(cache.time_to_live(), Duration::from_secs(5));
        cache.set_time_to_live(120);
        assert_eq!(cache.time_to_live(), Duration::from_secs(120));
    }

    #[test]
    fn shared_cache_expires_stale_entries() {
        let schema = Arc::new(FunctionSchema::new("stale_fn", vec![], |_, _| {
            Ok(Value::null())
        }));
        SHARED_TIER.insert(
            "injector.refls.funcs.already-stale".into(),
            (
                CacheEntry::Function(schema),
                Instant::now() - Duration::from_millis(1),
            ),
        );

        let cache = SharedReflectionCache::new();
        assert!(cache.fetch("injector.refls.funcs.already-stale").is_none());
        assert!(!SHARED_TIER.contains_key("injector.refls.funcs.already-stale"));
    }
}
