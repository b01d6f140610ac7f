//! Lookup keys for the injector's registries.
//!
//! [`TypeKey`] is the canonical form of a type name. Every registry, the
//! in-progress resolution stack, and alias resolution all operate on the
//! canonical form, so `"App\\Logger"`, `"app\\logger"` and `"::app::logger"`
//! style spellings of the same name collide on one entry.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// The canonical form of a registered name.
///
/// Canonicalization lowercases the name and strips leading separator
/// characters (`\` and `:`). Interior separators are preserved, so
/// `"app::logger"` and `"app::cache"` stay distinct.
///
/// # Examples
/// ```
/// use graft_container::key::TypeKey;
///
/// let key = TypeKey::new("::App::Logger");
/// assert_eq!(key.as_str(), "app::logger");
/// assert_eq!(key, TypeKey::new("app::logger"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Canonicalizes `name` into a key.
    pub fn new(name: impl AsRef<str>) -> Self {
        let trimmed = name
            .as_ref()
            .trim_start_matches(|c| c == '\\' || c == ':');
        TypeKey(Arc::from(trimmed.to_lowercase().as_str()))
    }

    /// Returns the canonical text of this key.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for TypeKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        TypeKey::new(name)
    }
}

impl From<&TypeKey> for TypeKey {
    fn from(key: &TypeKey) -> Self {
        key.clone()
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for TypeKey {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for TypeKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases() {
        assert_eq!(TypeKey::new("App::Logger").as_str(), "app::logger");
    }

    #[test]
    fn strips_leading_separators() {
        assert_eq!(TypeKey::new("\\App\\Logger").as_str(), "app\\logger");
        assert_eq!(TypeKey::new("::app::logger").as_str(), "app::logger");
    }

    #[test]
    fn preserves_interior_separators() {
        assert_ne!(TypeKey::new("app::logger"), TypeKey::new("app::cache"));
    }

    #[test]
    fn spelling_variants_collide() {
        assert_eq!(TypeKey::new("APP::LOGGER"), TypeKey::new("::app::Logger"));
    }

    #[test]
    fn key_in_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(TypeKey::new("App::Logger"), 1);
        assert_eq!(map.get(&TypeKey::new("app::logger")), Some(&1));
        // Borrow<str> allows str lookups against canonical text.
        assert_eq!(map.get("app::logger"), Some(&1));
        assert_eq!(map.get("app::cache"), None);
    }

    #[test]
    fn display_is_canonical_text() {
        assert_eq!(TypeKey::new("Foo").to_string(), "foo");
    }
}
