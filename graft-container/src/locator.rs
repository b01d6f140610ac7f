//! A get/has façade over the injector.
//!
//! [`ServiceLocator`] answers two questions: "could this id resolve?"
//! and "give me the instance", with failures carried as [`LocatorError`]
//! instead of the injector's own taxonomy. Consumers that only look
//! things up can depend on this surface and stay away from the
//! registration API.

use dashmap::DashMap;
use tracing::trace;

use crate::injector::Injector;
use crate::key::TypeKey;
use crate::registry::InspectFilter;
use crate::schema::TypeKind;
use crate::value::Value;

/// A failure while looking up or retrieving an entry.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    /// The id is not known to the underlying injector.
    #[error("No entry was found for \"{id}\"\n  Hint: Register a schema, alias, or delegate for it first")]
    NotFound { id: String },

    /// The id is known, but resolving it failed.
    #[error("Failed to retrieve \"{id}\": {source}")]
    Retrieval {
        id: String,
        source: crate::error::InjectorError,
    },
}

/// A lookup façade over an injector.
///
/// `has` treats an id as available when any registration table mentions
/// it, or when its schema describes a concrete type with a public
/// constructor. Positive answers are memoized; negative answers are
/// re-checked, since a later registration can turn them positive.
pub struct ServiceLocator {
    injector: Injector,
    available: DashMap<TypeKey, ()>,
}

impl ServiceLocator {
    pub fn new(injector: Injector) -> Self {
        ServiceLocator {
            injector,
            available: DashMap::new(),
        }
    }

    /// The injector this locator reads from.
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Whether `id` could be retrieved.
    pub fn has(&self, id: &str) -> bool {
        let key = TypeKey::new(id);
        if self.available.contains_key(&key) {
            return true;
        }

        if self.is_available(id, &key) {
            trace!(key = %key, "Memoized locator availability");
            self.available.insert(key, ());
            return true;
        }
        false
    }

    /// Retrieves the instance behind `id`.
    ///
    /// # Errors
    /// Unknown ids fail with [`LocatorError::NotFound`]; resolution
    /// failures are wrapped as [`LocatorError::Retrieval`] naming the id.
    pub fn get(&self, id: &str) -> Result<Value, LocatorError> {
        if !self.has(id) {
            return Err(LocatorError::NotFound { id: id.to_string() });
        }
        self.injector.make(id).map_err(|source| LocatorError::Retrieval {
            id: id.to_string(),
            source,
        })
    }

    fn is_available(&self, id: &str, key: &TypeKey) -> bool {
        if !self
            .injector
            .inspect(Some(id), InspectFilter::empty())
            .is_empty()
        {
            return true;
        }

        match self.injector.schemas().get(key) {
            Some(info) => {
                info.kind() == TypeKind::Concrete
                    && info.constructor().is_some_and(|ctor| ctor.is_public())
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("memoized", &self.available.len())
            .finish()
    }
}
