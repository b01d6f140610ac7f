//! Reflection over registered schemas.
//!
//! [`Reflector`] is the seam between the resolution core and the schema
//! registry. The core only ever asks a reflector for type records,
//! constructors, functions, and methods; swapping the reflector (for the
//! caching decorator, or a custom one) never touches resolution logic.
//!
//! Reflectors fail with [`ReflectionError`]; the core wraps those into
//! its own error taxonomy at the call site.

use std::sync::Arc;

use graft_support::rendering::suggest_similar;

use crate::error::{ReflectionError, UnknownTypeError};
use crate::key::TypeKey;
use crate::schema::{
    ConstructorSpec, FunctionSchema, MethodSchema, ParamSpec, SchemaRegistry, TypeInfo,
};
use crate::value::Value;

/// The lookups the resolution core consumes.
pub trait Reflector: Send + Sync {
    /// The full record for a registered type.
    fn class(&self, name: &str) -> Result<Arc<TypeInfo>, ReflectionError>;

    /// The constructor of a type, `None` when none is declared.
    fn constructor(&self, name: &str) -> Result<Option<Arc<ConstructorSpec>>, ReflectionError>;

    /// Constructor parameters, `None` when the type has no constructor.
    fn constructor_params(
        &self,
        name: &str,
    ) -> Result<Option<Arc<[ParamSpec]>>, ReflectionError>;

    /// The resolvable type behind a parameter, if it declares one.
    fn param_type_hint(&self, param: &ParamSpec) -> Option<TypeKey> {
        param.hint_key()
    }

    /// A registered free function, case-insensitively.
    fn function(&self, name: &str) -> Result<Arc<FunctionSchema>, ReflectionError>;

    /// A method on a named type, walking the declared parent chain.
    fn method(&self, type_name: &str, method: &str) -> Result<Arc<MethodSchema>, ReflectionError>;

    /// A method resolved against an instance's runtime type.
    fn method_of(&self, instance: &Value, method: &str)
        -> Result<Arc<MethodSchema>, ReflectionError>;
}

/// Reads the schema registry directly, with no caching.
pub struct StandardReflector {
    registry: Arc<SchemaRegistry>,
}

impl StandardReflector {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        StandardReflector { registry }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    fn unknown_type(&self, name: &str) -> ReflectionError {
        let keys = self.registry.keys();
        let available: Vec<&str> = keys.iter().map(TypeKey::as_str).collect();
        ReflectionError::UnknownType(UnknownTypeError {
            name: name.to_string(),
            suggestions: suggest_similar(name, &available, 3),
        })
    }
}

impl Reflector for StandardReflector {
    fn class(&self, name: &str) -> Result<Arc<TypeInfo>, ReflectionError> {
        self.registry
            .get(&TypeKey::new(name))
            .ok_or_else(|| self.unknown_type(name))
    }

    fn constructor(&self, name: &str) -> Result<Option<Arc<ConstructorSpec>>, ReflectionError> {
        Ok(self.class(name)?.constructor().cloned())
    }

    fn constructor_params(
        &self,
        name: &str,
    ) -> Result<Option<Arc<[ParamSpec]>>, ReflectionError> {
        Ok(self.constructor(name)?.map(|ctor| ctor.params().clone()))
    }

    fn function(&self, name: &str) -> Result<Arc<FunctionSchema>, ReflectionError> {
        self.registry
            .function(name)
            .ok_or_else(|| ReflectionError::UnknownFunction { name: name.to_string() })
    }

    fn method(
        &self,
        type_name: &str,
        method: &str,
    ) -> Result<Arc<MethodSchema>, ReflectionError> {
        let info = self.class(type_name)?;
        self.registry
            .method_on(info.key(), method)
            .ok_or_else(|| ReflectionError::UnknownMethod {
                type_name: info.name().to_string(),
                method: method.to_string(),
            })
    }

    fn method_of(
        &self,
        instance: &Value,
        method: &str,
    ) -> Result<Arc<MethodSchema>, ReflectionError> {
        let Some(key) = self.registry.key_of(instance) else {
            return Err(ReflectionError::UnknownType(UnknownTypeError {
                name: instance.type_name().to_string(),
                suggestions: Vec::new(),
            }));
        };
        let display = self
            .registry
            .get(&key)
            .map(|info| info.name().to_string())
            .unwrap_or_else(|| key.as_str().to_string());
        self.registry
            .method_on(&key, method)
            .ok_or_else(|| ReflectionError::UnknownMethod {
                type_name: display,
                method: method.to_string(),
            })
    }
}
