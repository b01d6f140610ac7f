//! Normalized invocation targets.
//!
//! The injector turns every [`Callable`](crate::callable::Callable) shape
//! into an [`Executable`]: a function or method schema, the receiver when
//! one applies, and the display name errors use. An executable can be
//! invoked directly with explicit values, bypassing provisioning.

use std::fmt;
use std::sync::Arc;

use crate::args::ResolvedArgs;
use crate::error::Result;
use crate::injector::Injector;
use crate::schema::{FunctionSchema, MethodSchema, ParamSpec};
use crate::value::Value;

#[derive(Clone)]
enum Target {
    Function(Arc<FunctionSchema>),
    Method(Arc<MethodSchema>),
}

/// A callable resolved to something directly invocable.
#[derive(Clone)]
pub struct Executable {
    target: Target,
    receiver: Option<Value>,
    display: String,
}

impl Executable {
    pub(crate) fn from_function(schema: Arc<FunctionSchema>) -> Self {
        let display = schema.name().to_string();
        Executable { target: Target::Function(schema), receiver: None, display }
    }

    /// A method target. `receiver` stays `None` for static methods.
    pub(crate) fn from_method(
        schema: Arc<MethodSchema>,
        receiver: Option<Value>,
        display: String,
    ) -> Self {
        Executable { target: Target::Method(schema), receiver, display }
    }

    /// Declared parameters of the underlying target.
    pub fn params(&self) -> &Arc<[ParamSpec]> {
        match &self.target {
            Target::Function(function) => function.params(),
            Target::Method(method) => method.params(),
        }
    }

    /// The receiver the target will be invoked on, when one applies.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    /// Whether the target is a method rather than a function or closure.
    pub fn is_method(&self) -> bool {
        matches!(self.target, Target::Method(_))
    }

    /// The display form used when this executable is named in errors.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Invokes the target with explicit, already-resolved values.
    ///
    /// The result is returned verbatim; null is a legal outcome here.
    pub fn invoke(&self, injector: &Injector, values: Vec<Value>) -> Result<Value> {
        let args = ResolvedArgs::new(&self.display, values);
        match &self.target {
            Target::Function(function) => function.call(&args, injector),
            Target::Method(method) => method.call(self.receiver.as_ref(), &args, injector),
        }
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("display", &self.display)
            .field("is_method", &self.is_method())
            .field("has_receiver", &self.receiver.is_some())
            .field("params", &self.params().len())
            .finish()
    }
}
