//! Type-erased values moved through the injector.
//!
//! Everything the injector produces or consumes (made instances, raw
//! argument overrides, parameter defaults, delegate results) travels as a
//! [`Value`]: a shared, type-erased payload that remembers the Rust type
//! name it was built from and can represent an explicit null.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased value with an explicit null state.
///
/// Cloning a `Value` clones the handle, not the payload, so a shared
/// instance handed to many consumers stays one allocation. Identity can be
/// checked with [`Value::ptr_eq`].
///
/// # Examples
/// ```
/// use graft_container::value::Value;
///
/// let v = Value::of(42_i32);
/// assert_eq!(v.get::<i32>(), Some(42));
/// assert!(!v.is_null());
/// assert_eq!(v.type_name(), "i32");
///
/// let n = Value::null();
/// assert!(n.is_null());
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl Value {
    /// Wraps a concrete value.
    pub fn of<T: Send + Sync + 'static>(value: T) -> Self {
        Value {
            inner: Some(Arc::new(value)),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wraps an already-shared value without another allocation.
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Value {
            inner: Some(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Stores an owned string. Avoids the `&str` vs `String` mismatch
    /// when the value is later read back with [`Value::get`].
    pub fn string(value: impl Into<String>) -> Self {
        Value::of(value.into())
    }

    /// The explicit null value.
    pub fn null() -> Self {
        Value { inner: None, type_name: "null" }
    }

    /// Whether this value is the explicit null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// The Rust type name captured at construction, `"null"` for null.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the payload as `T`, if it is one.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_deref().and_then(|any| any.downcast_ref())
    }

    /// Clones the payload out as `T`, if it is one.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Shares the payload as `Arc<T>`, if it is one.
    pub fn downcast_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let any = self.inner.clone()?;
        any.downcast::<T>().ok()
    }

    /// The raw erased payload, if non-null.
    pub fn as_any(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.inner.as_deref()
    }

    /// The Rust [`std::any::TypeId`] of the payload, if non-null.
    pub fn payload_type_id(&self) -> Option<std::any::TypeId> {
        self.inner.as_deref().map(|any| any.type_id())
    }

    /// Whether `self` and `other` share the same allocation.
    ///
    /// Two nulls are not considered identical.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::of(s)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Value(null)")
        } else {
            write!(f, "Value({})", self.type_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars() {
        let v = Value::of(7_u64);
        assert_eq!(v.get::<u64>(), Some(7));
        assert_eq!(v.get::<i32>(), None);
    }

    #[test]
    fn null_is_null() {
        let v = Value::null();
        assert!(v.is_null());
        assert_eq!(v.type_name(), "null");
        assert_eq!(v.get::<i32>(), None);
    }

    #[test]
    fn string_sugar_stores_owned_string() {
        let v = Value::from("hello");
        assert_eq!(v.get::<String>(), Some("hello".to_string()));
    }

    #[test]
    fn clones_share_the_allocation() {
        struct Widget;
        let v = Value::of(Widget);
        let w = v.clone();
        assert!(v.ptr_eq(&w));
    }

    #[test]
    fn distinct_values_are_not_identical() {
        let a = Value::of(1_i32);
        let b = Value::of(1_i32);
        assert!(!a.ptr_eq(&b));
        assert!(!Value::null().ptr_eq(&Value::null()));
    }

    #[test]
    fn downcast_arc_shares() {
        struct Widget {
            size: u8,
        }
        let v = Value::of(Widget { size: 3 });
        let arc = v.downcast_arc::<Widget>().unwrap();
        assert_eq!(arc.size, 3);
        // Still available through the original handle.
        assert!(v.downcast_ref::<Widget>().is_some());
    }

    #[test]
    fn from_arc_preserves_identity() {
        let shared = Arc::new(5_i32);
        let v = Value::from_arc(shared.clone());
        assert!(Arc::ptr_eq(&v.downcast_arc::<i32>().unwrap(), &shared));
    }

    #[test]
    fn debug_shows_type() {
        assert_eq!(format!("{:?}", Value::of(1_i8)), "Value(i8)");
        assert_eq!(format!("{:?}", Value::null()), "Value(null)");
    }
}
