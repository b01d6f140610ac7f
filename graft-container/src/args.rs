//! Argument overrides and resolved argument lists.
//!
//! [`Args`] is the instruction set a caller (or a stored definition)
//! attaches to a resolution: positional values injected as-is plus named
//! per-parameter instructions, each carrying its own tag instead of the
//! sigil-prefixed string keys some containers use. [`ResolvedArgs`] is the
//! other end: the ordered, fully-provisioned list a factory or executable
//! body reads its inputs from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::{ArgumentMismatch, InjectorError, Result};
use crate::value::Value;

/// A single named-parameter instruction.
#[derive(Clone)]
pub enum Arg {
    /// Inject the value as-is, explicit null included.
    Raw(Value),
    /// Resolve the named type through the injector.
    Make(String),
    /// Invoke the callable with `(parameter name, injector)` to produce
    /// the value.
    Delegate(Callable),
    /// Make the named type with its own override set.
    Nested(String, Args),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Raw(v) => write!(f, "Raw({v:?})"),
            Arg::Make(name) => write!(f, "Make({name})"),
            Arg::Delegate(c) => write!(f, "Delegate({})", c.render()),
            Arg::Nested(name, args) => write!(f, "Nested({name}, {args:?})"),
        }
    }
}

/// Argument overrides for one resolution or one stored definition.
///
/// Positional entries always win over named entries for the same
/// parameter; within the named map at most one instruction can exist per
/// parameter name.
///
/// # Examples
/// ```
/// use graft_container::args::Args;
/// use graft_container::value::Value;
///
/// let args = Args::new()
///     .at(0, Value::of(10_i32))
///     .raw("label", Value::from("draft"))
///     .make("store", "app::store");
/// assert!(!args.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Args {
    positional: BTreeMap<usize, Value>,
    named: BTreeMap<String, Arg>,
}

impl Args {
    /// An empty override set.
    pub fn new() -> Self {
        Args::default()
    }

    /// Sets the positional value at `index`, injected as-is.
    pub fn at(mut self, index: usize, value: Value) -> Self {
        self.positional.insert(index, value);
        self
    }

    /// Injects `value` as-is for the parameter named `name`.
    pub fn raw(mut self, name: impl Into<String>, value: Value) -> Self {
        self.named.insert(name.into(), Arg::Raw(value));
        self
    }

    /// Resolves `type_name` through the injector for the parameter named
    /// `name`.
    pub fn make(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.named.insert(name.into(), Arg::Make(type_name.into()));
        self
    }

    /// Invokes `callable` with `(name, injector)` for the parameter named
    /// `name`.
    pub fn delegate(mut self, name: impl Into<String>, callable: Callable) -> Self {
        self.named.insert(name.into(), Arg::Delegate(callable));
        self
    }

    /// Makes `type_name` with its own `args` for the parameter named
    /// `name`.
    pub fn nested(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        args: Args,
    ) -> Self {
        self.named
            .insert(name.into(), Arg::Nested(type_name.into(), args));
        self
    }

    /// The positional value at `index`, if set.
    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positional.get(&index)
    }

    /// The instruction for the parameter named `name`, if set.
    pub fn named(&self, name: &str) -> Option<&Arg> {
        self.named.get(name)
    }

    /// Whether no instruction is present at all.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Total number of instructions.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Merges `overrides` on top of `self`, entry by entry.
    ///
    /// Used at resolution time to combine a stored definition with the
    /// call-site override set; the call-site entry wins wherever both
    /// address the same position or name.
    pub fn merged_with(&self, overrides: &Args) -> Args {
        let mut merged = self.clone();
        for (index, value) in &overrides.positional {
            merged.positional.insert(*index, value.clone());
        }
        for (name, arg) in &overrides.named {
            merged.named.insert(name.clone(), arg.clone());
        }
        merged
    }

    /// Named instructions in name order.
    pub fn named_entries(&self) -> impl Iterator<Item = (&str, &Arg)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Positional instructions in index order.
    pub fn positional_entries(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.positional.iter().map(|(k, v)| (*k, v))
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("positional", &self.positional)
            .field("named", &self.named)
            .finish()
    }
}

// ─── resolved argument lists ───

/// The ordered argument values provisioned for one invocation.
///
/// Handed to constructor factories, function bodies, and method bodies.
/// The typed accessors report shape mismatches as a
/// [`InjectorError::MakeFailure`] naming the owning function, so a factory
/// can simply `?` its reads.
pub struct ResolvedArgs {
    owner: Arc<str>,
    values: Vec<Value>,
}

impl ResolvedArgs {
    /// Builds a list for `owner` (the function the values are destined
    /// for, used in error messages).
    pub fn new(owner: impl AsRef<str>, values: Vec<Value>) -> Self {
        ResolvedArgs { owner: Arc::from(owner.as_ref()), values }
    }

    /// The owning function's display name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value at `index`, if present.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// All values in order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Clones the value at `index` out as `T`.
    pub fn get<T: Clone + 'static>(&self, index: usize) -> Result<T> {
        let value = self.require(index, std::any::type_name::<T>())?;
        value
            .get::<T>()
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<T>(), value))
    }

    /// Clones the value at `index` out as `T`, mapping null to `None`.
    pub fn opt<T: Clone + 'static>(&self, index: usize) -> Result<Option<T>> {
        if self.is_null_at(index) {
            return Ok(None);
        }
        self.get(index).map(Some)
    }

    /// Shares the value at `index` as `Arc<T>`.
    pub fn instance<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.require(index, std::any::type_name::<T>())?;
        value
            .downcast_arc::<T>()
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<T>(), value))
    }

    /// Shares the value at `index` as `Arc<T>`, mapping null to `None`.
    pub fn opt_instance<T: Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>> {
        if self.is_null_at(index) {
            return Ok(None);
        }
        self.instance(index).map(Some)
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.value(index).is_none_or(Value::is_null)
    }

    fn require(&self, index: usize, expected: &'static str) -> Result<&Value> {
        match self.value(index) {
            Some(v) if !v.is_null() => Ok(v),
            Some(_) => Err(self.failure(index, expected, "null".to_string())),
            None => Err(self.failure(index, expected, "missing".to_string())),
        }
    }

    fn mismatch(&self, index: usize, expected: &'static str, value: &Value) -> InjectorError {
        self.failure(index, expected, value.type_name().to_string())
    }

    fn failure(&self, index: usize, expected: &'static str, actual: String) -> InjectorError {
        InjectorError::make_failure(
            self.owner.to_string(),
            ArgumentMismatch { index, expected, actual },
        )
    }
}

impl fmt::Debug for ResolvedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedArgs")
            .field("owner", &self.owner)
            .field("values", &self.values)
            .finish()
    }
}
