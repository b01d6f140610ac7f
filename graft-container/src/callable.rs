//! Invocation targets.
//!
//! A [`Callable`] is whatever callers hand to `execute`, `delegate`,
//! `prepare`, or `proxy`: a name, a closure, an instance, or a pair. The
//! injector normalizes it into an executable; this module owns the shapes
//! themselves, their rendering for error messages, and name parsing.

use std::fmt;
use std::sync::Arc;

use graft_support::rendering::{clip, shorten_type_name};

use crate::schema::{FunctionSchema, ParamSpec};
use crate::value::Value;

/// Rendered callable descriptions are cut to this many characters before
/// being quoted in an error.
pub const RENDER_LIMIT: usize = 250;

/// The method name that makes a registered type usable as a callable.
///
/// A type name given where a callable is expected resolves to this method
/// on a freshly made instance of the type.
pub const INVOKE_METHOD: &str = "invoke";

/// An invocation target, before normalization.
///
/// String names cover three forms: a registered function, an invokable
/// type (one declaring an `invoke` method), and `Type::method` with the
/// relative `Type::parent::method` variant.
#[derive(Clone)]
pub enum Callable {
    /// A name to resolve: function, invokable type, or `Type::method`.
    Name(String),
    /// A closure with declared parameters.
    Closure(Arc<FunctionSchema>),
    /// An instance whose runtime type declares an `invoke` method.
    Instance(Value),
    /// A `[type, method]` pair.
    ClassMethod(String, String),
    /// An `[instance, method]` pair.
    InstanceMethod(Value, String),
}

impl Callable {
    pub fn name(name: impl Into<String>) -> Self {
        Callable::Name(name.into())
    }

    /// Wraps a closure body with its declared parameters.
    pub fn closure<F>(params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(&crate::args::ResolvedArgs, &crate::injector::Injector)
                -> crate::error::Result<Value>
            + Send
            + Sync
            + 'static,
    {
        Callable::Closure(Arc::new(FunctionSchema::closure(params, body)))
    }

    pub fn instance(value: Value) -> Self {
        Callable::Instance(value)
    }

    pub fn class_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Callable::ClassMethod(type_name.into(), method.into())
    }

    pub fn instance_method(receiver: Value, method: impl Into<String>) -> Self {
        Callable::InstanceMethod(receiver, method.into())
    }

    /// A short human description, clipped to [`RENDER_LIMIT`] characters.
    pub fn render(&self) -> String {
        let rendered = match self {
            Callable::Name(name) => name.clone(),
            Callable::Closure(schema) => schema.name().to_string(),
            Callable::Instance(value) => {
                format!("instance of {}", shorten_type_name(value.type_name()))
            }
            Callable::ClassMethod(type_name, method) => format!("{type_name}::{method}"),
            Callable::InstanceMethod(receiver, method) => {
                format!(
                    "instance of {}::{method}",
                    shorten_type_name(receiver.type_name())
                )
            }
        };
        clip(&rendered, RENDER_LIMIT)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.render())
    }
}

impl From<&str> for Callable {
    fn from(name: &str) -> Self {
        Callable::Name(name.to_string())
    }
}

impl From<String> for Callable {
    fn from(name: String) -> Self {
        Callable::Name(name)
    }
}

impl From<FunctionSchema> for Callable {
    fn from(schema: FunctionSchema) -> Self {
        Callable::Closure(Arc::new(schema))
    }
}

/// A `Type::method` name split into its parts.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SplitName<'a> {
    pub type_name: &'a str,
    pub method: &'a str,
    /// True for the relative `Type::parent::method` form.
    pub via_parent: bool,
}

/// Splits a `Type::method` name.
///
/// Registered type names may themselves contain `::`, so the method is
/// taken after the last separator, with the `parent::` marker recognized
/// just before it.
pub(crate) fn split_type_method(name: &str) -> Option<SplitName<'_>> {
    let (mut type_name, method) = name.rsplit_once("::")?;
    if type_name.is_empty() || method.is_empty() {
        return None;
    }

    let mut via_parent = false;
    if let Some(prefix) =
        strip_suffix_ignore_case(type_name, "parent").and_then(|p| p.strip_suffix("::"))
    {
        if !prefix.is_empty() {
            type_name = prefix;
            via_parent = true;
        }
    }

    Some(SplitName { type_name, method, via_parent })
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Splits an embedded `parent::` marker off a pair's method component, so
/// `["Type", "parent::method"]` resolves like `"Type::parent::method"`.
pub(crate) fn split_parent_marker(method: &str) -> (&str, bool) {
    match method.split_once("::") {
        Some((marker, rest)) if marker.eq_ignore_ascii_case("parent") && !rest.is_empty() => {
            (rest, true)
        }
        _ => (method, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_type_method() {
        let split = split_type_method("app::Mailer::send").unwrap();
        assert_eq!(split.type_name, "app::Mailer");
        assert_eq!(split.method, "send");
        assert!(!split.via_parent);
    }

    #[test]
    fn splits_parent_relative_form() {
        let split = split_type_method("app::Mailer::parent::send").unwrap();
        assert_eq!(split.type_name, "app::Mailer");
        assert_eq!(split.method, "send");
        assert!(split.via_parent);

        let upper = split_type_method("Mailer::Parent::send").unwrap();
        assert_eq!(upper.type_name, "Mailer");
        assert!(upper.via_parent);
    }

    #[test]
    fn rejects_names_without_separator() {
        assert_eq!(split_type_method("make_mailer"), None);
        assert_eq!(split_type_method("::send"), None);
        assert_eq!(split_type_method("Mailer::"), None);
    }

    #[test]
    fn splits_parent_marker_in_pair_methods() {
        assert_eq!(split_parent_marker("parent::send"), ("send", true));
        assert_eq!(split_parent_marker("Parent::send"), ("send", true));
        assert_eq!(split_parent_marker("send"), ("send", false));
        assert_eq!(split_parent_marker("parenting::send"), ("parenting::send", false));
    }

    #[test]
    fn renders_each_shape() {
        assert_eq!(Callable::name("app::Mailer::send").render(), "app::Mailer::send");
        assert_eq!(
            Callable::class_method("app::Mailer", "send").render(),
            "app::Mailer::send"
        );
        assert_eq!(
            Callable::closure(vec![], |_, _| Ok(Value::null())).render(),
            "{closure}"
        );

        struct Mailer;
        let rendered = Callable::instance_method(Value::of(Mailer), "send").render();
        assert!(rendered.contains("Mailer::send"), "{rendered}");
    }

    #[test]
    fn render_clips_pathological_names() {
        let long = "x".repeat(4_000);
        assert_eq!(Callable::name(long).render().chars().count(), RENDER_LIMIT);
    }
}
