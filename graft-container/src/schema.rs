//! Registration-time type descriptors.
//!
//! The injector has no runtime reflection to lean on, so every type it can
//! construct registers a descriptor up front: the constructor's parameter
//! list and factory, the capabilities (interface-like tags) the type
//! fulfills, its parent, and any invocable methods. [`SchemaRegistry`] is
//! the live set of those descriptors; the reflector reads it, and the
//! `TypeId` mapping it keeps lets an erased instance be traced back to its
//! registered key.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::args::ResolvedArgs;
use crate::error::{ConfigError, Result};
use crate::injector::Injector;
use crate::key::TypeKey;
use crate::value::Value;

/// Builds an instance from a resolved argument list.
pub type FactoryFn = Arc<dyn Fn(&ResolvedArgs) -> Result<Value> + Send + Sync>;

/// Executes a function or method body.
///
/// The receiver is `Some` for instance methods and `None` for functions,
/// closures, and static methods.
pub type CallBody =
    Arc<dyn Fn(Option<&Value>, &ResolvedArgs, &Injector) -> Result<Value> + Send + Sync>;

/// What sort of thing a schema describes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeKind {
    /// Constructible, assuming a factory is registered.
    Concrete,
    /// A capability tag; only ever satisfied through an alias, delegate,
    /// or share.
    Interface,
    /// Declared but not directly constructible.
    Abstract,
}

impl TypeKind {
    /// The noun used in definition-required errors.
    pub fn word(self) -> &'static str {
        match self {
            TypeKind::Concrete => "type",
            TypeKind::Interface => "interface",
            TypeKind::Abstract => "abstract type",
        }
    }
}

// ─── parameters ───

/// One declared parameter of a constructor, function, or method.
///
/// # Examples
/// ```
/// use graft_container::schema::ParamSpec;
/// use graft_container::value::Value;
///
/// let dep = ParamSpec::hinted("logger", "app::logger");
/// let limit = ParamSpec::untyped("limit").with_default(Value::of(25_i64));
/// assert_eq!(dep.name(), "logger");
/// assert!(limit.default().is_some());
/// ```
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    type_hint: Option<String>,
    default: Option<Value>,
    optional: bool,
}

impl ParamSpec {
    /// A parameter whose type the injector can resolve.
    pub fn hinted(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            type_hint: Some(type_hint.into()),
            default: None,
            optional: false,
        }
    }

    /// A parameter with no resolvable type.
    pub fn untyped(name: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            type_hint: None,
            default: None,
            optional: false,
        }
    }

    /// Attaches a default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the parameter optional without a retrievable default; it
    /// provisions as null when nothing else supplies it.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared hint in its original casing.
    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    /// The declared hint as a lookup key.
    pub fn hint_key(&self) -> Option<TypeKey> {
        self.type_hint.as_deref().map(TypeKey::new)
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("type_hint", &self.type_hint)
            .field("default", &self.default)
            .field("optional", &self.optional)
            .finish()
    }
}

// ─── constructors, methods, functions ───

/// A registered constructor: visibility, parameters, factory.
#[derive(Clone)]
pub struct ConstructorSpec {
    public: bool,
    params: Arc<[ParamSpec]>,
    factory: FactoryFn,
}

impl ConstructorSpec {
    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn params(&self) -> &Arc<[ParamSpec]> {
        &self.params
    }

    /// Runs the factory against a resolved argument list.
    pub fn build(&self, args: &ResolvedArgs) -> Result<Value> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("public", &self.public)
            .field("params", &self.params)
            .finish()
    }
}

/// A registered method body.
pub struct MethodSchema {
    name: String,
    is_static: bool,
    params: Arc<[ParamSpec]>,
    body: CallBody,
}

impl MethodSchema {
    /// An instance method; its body receives the receiver.
    pub fn new<F>(name: impl Into<String>, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &ResolvedArgs, &Injector) -> Result<Value> + Send + Sync + 'static,
    {
        MethodSchema {
            name: name.into(),
            is_static: false,
            params: params.into(),
            body: Arc::new(body),
        }
    }

    /// A static method; no receiver is ever passed.
    pub fn new_static<F>(name: impl Into<String>, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(&ResolvedArgs, &Injector) -> Result<Value> + Send + Sync + 'static,
    {
        MethodSchema {
            name: name.into(),
            is_static: true,
            params: params.into(),
            body: Arc::new(move |_receiver, args, injector| body(args, injector)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn params(&self) -> &Arc<[ParamSpec]> {
        &self.params
    }

    /// Runs the body.
    pub fn call(
        &self,
        receiver: Option<&Value>,
        args: &ResolvedArgs,
        injector: &Injector,
    ) -> Result<Value> {
        (self.body)(receiver, args, injector)
    }
}

impl fmt::Debug for MethodSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSchema")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("params", &self.params)
            .finish()
    }
}

/// A registered free function.
pub struct FunctionSchema {
    name: String,
    params: Arc<[ParamSpec]>,
    body: CallBody,
}

impl FunctionSchema {
    pub fn new<F>(name: impl Into<String>, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(&ResolvedArgs, &Injector) -> Result<Value> + Send + Sync + 'static,
    {
        FunctionSchema {
            name: name.into(),
            params: params.into(),
            body: Arc::new(move |_receiver, args, injector| body(args, injector)),
        }
    }

    /// An anonymous function. Closure descriptors wrap these.
    pub fn closure<F>(params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(&ResolvedArgs, &Injector) -> Result<Value> + Send + Sync + 'static,
    {
        FunctionSchema::new("{closure}", params, body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Arc<[ParamSpec]> {
        &self.params
    }

    /// Runs the body.
    pub fn call(&self, args: &ResolvedArgs, injector: &Injector) -> Result<Value> {
        (self.body)(None, args, injector)
    }
}

impl fmt::Debug for FunctionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSchema")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

// ─── type declarations ───

/// A type declaration under construction.
///
/// Built fluently and handed to the injector (or a [`SchemaRegistry`])
/// once complete.
///
/// # Examples
/// ```no_run
/// use graft_container::schema::{MethodSchema, ParamSpec, TypeSchema};
/// use graft_container::value::Value;
///
/// struct Mailer { transport: String }
///
/// let schema = TypeSchema::concrete::<Mailer>("app::mailer")
///     .implements("app::notifier")
///     .param(ParamSpec::untyped("transport").with_default(Value::from("smtp")))
///     .factory(|args| {
///         Ok(Value::of(Mailer { transport: args.get(0)? }))
///     });
/// ```
pub struct TypeSchema {
    name: String,
    kind: TypeKind,
    type_id: Option<TypeId>,
    parent: Option<String>,
    capabilities: Vec<TypeKey>,
    ctor_public: bool,
    ctor_params: Vec<ParamSpec>,
    factory: Option<FactoryFn>,
    methods: Vec<MethodSchema>,
}

impl TypeSchema {
    /// Declares a constructible type backed by the Rust type `T`.
    ///
    /// Capturing `T` lets the injector map erased instances back to this
    /// key, which drives instance sharing, preparer dispatch, and method
    /// re-resolution on receivers.
    pub fn concrete<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        TypeSchema {
            name: name.into(),
            kind: TypeKind::Concrete,
            type_id: Some(TypeId::of::<T>()),
            parent: None,
            capabilities: Vec::new(),
            ctor_public: true,
            ctor_params: Vec::new(),
            factory: None,
            methods: Vec::new(),
        }
    }

    /// Declares a capability tag.
    pub fn interface(name: impl Into<String>) -> Self {
        TypeSchema {
            name: name.into(),
            kind: TypeKind::Interface,
            type_id: None,
            parent: None,
            capabilities: Vec::new(),
            ctor_public: true,
            ctor_params: Vec::new(),
            factory: None,
            methods: Vec::new(),
        }
    }

    /// Declares a type that exists in the hierarchy but cannot be built
    /// directly.
    pub fn abstract_type(name: impl Into<String>) -> Self {
        TypeSchema { kind: TypeKind::Abstract, ..TypeSchema::interface(name) }
    }

    /// Adds a capability this type fulfills.
    pub fn implements(mut self, capability: impl AsRef<str>) -> Self {
        self.capabilities.push(TypeKey::new(capability));
        self
    }

    /// Declares the parent type.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Appends a constructor parameter.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.ctor_params.push(param);
        self
    }

    /// Marks the constructor non-public; resolution will refuse to build
    /// the type directly.
    pub fn non_public(mut self) -> Self {
        self.ctor_public = false;
        self
    }

    /// Sets the constructor factory.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ResolvedArgs) -> Result<Value> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Adds an invocable method.
    pub fn method(mut self, method: MethodSchema) -> Self {
        self.methods.push(method);
        self
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// A registered type record, as the reflector hands it out.
pub struct TypeInfo {
    name: String,
    key: TypeKey,
    kind: TypeKind,
    type_id: Option<TypeId>,
    parent: Option<String>,
    capabilities: Vec<TypeKey>,
    constructor: Option<Arc<ConstructorSpec>>,
    methods: HashMap<String, Arc<MethodSchema>>,
}

impl TypeInfo {
    /// The display name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn parent_key(&self) -> Option<TypeKey> {
        self.parent.as_deref().map(TypeKey::new)
    }

    /// Declared capabilities, in declaration order.
    pub fn capabilities(&self) -> &[TypeKey] {
        &self.capabilities
    }

    pub fn constructor(&self) -> Option<&Arc<ConstructorSpec>> {
        self.constructor.as_ref()
    }

    /// Looks up a method declared directly on this type,
    /// case-insensitively.
    pub fn method(&self, name: &str) -> Option<&Arc<MethodSchema>> {
        self.methods.get(&name.to_lowercase())
    }

    /// The display form of the constructor, for error messages.
    pub fn constructor_display(&self) -> String {
        format!("{}::new", self.name)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("capabilities", &self.capabilities)
            .field("has_constructor", &self.constructor.is_some())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─── the live registry ───

/// The live set of registered type and function descriptors.
///
/// Shared by the injector and its reflector. Records are immutable once
/// registered; re-registering a key is rejected so cached lookups can
/// never go stale.
#[derive(Default)]
pub struct SchemaRegistry {
    types: RwLock<HashMap<TypeKey, Arc<TypeInfo>>>,
    functions: RwLock<HashMap<String, Arc<FunctionSchema>>>,
    runtime_keys: RwLock<HashMap<TypeId, TypeKey>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Registers a type declaration.
    pub fn register_type(&self, schema: TypeSchema) -> Result<()> {
        let key = TypeKey::new(&schema.name);
        let mut types = self.types.write();
        if types.contains_key(&key) {
            return Err(ConfigError::DuplicateSchema { name: schema.name }.into());
        }

        let constructor = match (schema.kind, schema.factory) {
            (TypeKind::Concrete, Some(factory)) => Some(Arc::new(ConstructorSpec {
                public: schema.ctor_public,
                params: schema.ctor_params.into(),
                factory,
            })),
            _ => None,
        };

        let mut capabilities = Vec::new();
        for capability in schema.capabilities {
            if !capabilities.contains(&capability) {
                capabilities.push(capability);
            }
        }

        let methods = schema
            .methods
            .into_iter()
            .map(|m| (m.name().to_lowercase(), Arc::new(m)))
            .collect();

        debug!(key = %key, kind = ?schema.kind, "Registered type schema");

        if let Some(type_id) = schema.type_id {
            // Reverse lookup used for share_instance and receiver method
            // re-resolution. Last registration wins if one Rust type backs
            // several keys.
            self.runtime_keys.write().insert(type_id, key.clone());
        }

        types.insert(
            key.clone(),
            Arc::new(TypeInfo {
                name: schema.name,
                key,
                kind: schema.kind,
                type_id: schema.type_id,
                parent: schema.parent,
                capabilities,
                constructor,
                methods,
            }),
        );
        Ok(())
    }

    /// Registers a free function.
    pub fn register_function(&self, schema: FunctionSchema) -> Result<()> {
        let key = schema.name().to_lowercase();
        let mut functions = self.functions.write();
        if functions.contains_key(&key) {
            return Err(ConfigError::DuplicateSchema { name: schema.name().to_string() }.into());
        }
        debug!(name = %key, "Registered function schema");
        functions.insert(key, Arc::new(schema));
        Ok(())
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<TypeInfo>> {
        self.types.read().get(key).cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.read().contains_key(key)
    }

    /// Looks up a function, case-insensitively.
    pub fn function(&self, name: &str) -> Option<Arc<FunctionSchema>> {
        self.functions.read().get(&name.to_lowercase()).cloned()
    }

    /// All registered type keys. Feeds did-you-mean suggestions.
    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<_> = self.types.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// The registered key for a Rust `TypeId`, if any.
    pub fn key_of_type_id(&self, type_id: TypeId) -> Option<TypeKey> {
        self.runtime_keys.read().get(&type_id).cloned()
    }

    /// The registered key for an erased instance's runtime type.
    pub fn key_of(&self, value: &Value) -> Option<TypeKey> {
        self.key_of_type_id(value.payload_type_id()?)
    }

    /// Finds a method on `key`, walking the declared parent chain.
    pub fn method_on(&self, key: &TypeKey, method: &str) -> Option<Arc<MethodSchema>> {
        let mut current = self.get(key)?;
        let mut seen = HashSet::new();
        loop {
            if let Some(found) = current.method(method) {
                return Some(found.clone());
            }
            if !seen.insert(current.key().clone()) {
                return None; // parent cycle, treat as not found
            }
            current = self.get(&current.parent_key()?)?;
        }
    }

    /// The full capability set of `key`: declared capabilities, their own
    /// declared capabilities, and everything inherited through parents,
    /// in first-seen order.
    pub fn capabilities_of(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![key.clone()];

        while let Some(next) = pending.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            let Some(info) = self.get(&next) else { continue };
            for capability in info.capabilities() {
                if !out.contains(capability) {
                    out.push(capability.clone());
                }
                pending.push(capability.clone());
            }
            if let Some(parent) = info.parent_key() {
                pending.push(parent);
            }
        }
        out
    }

    /// Whether `value`'s runtime type is `key` itself, one of its
    /// ancestors, or a type fulfilling `key` as a capability.
    pub fn instance_of(&self, value: &Value, key: &TypeKey) -> bool {
        let Some(runtime) = self.key_of(value) else {
            return false;
        };
        if &runtime == key {
            return true;
        }
        if self.capabilities_of(&runtime).contains(key) {
            return true;
        }
        // Ancestor walk.
        let mut current = self.get(&runtime);
        let mut seen = HashSet::new();
        while let Some(info) = current {
            if info.key() == key {
                return true;
            }
            if !seen.insert(info.key().clone()) {
                return false;
            }
            current = info.parent_key().and_then(|p| self.get(&p));
        }
        false
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.types.read().len())
            .field("functions", &self.functions.read().len())
            .finish()
    }
}
