//! The injector: recursive, name-keyed dependency resolution.
//!
//! An [`Injector`] owns a schema space, a reflector, and the registration
//! tables, and resolves string keys to instances by walking constructor
//! parameters. Instances can be aliased, shared, delegated, prepared, or
//! hidden behind lazy proxies; callables can be executed with the same
//! parameter provisioning the constructors get.
//!
//! All registration and resolution methods take `&self`; clones and
//! handles see the same registrations.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{trace, warn};

use graft_support::rendering::shorten_type_name;

use crate::args::{Arg, Args, ResolvedArgs};
use crate::cache::CachingReflector;
use crate::callable::{split_parent_marker, split_type_method, Callable, INVOKE_METHOD};
use crate::chain::{CallStack, DependencyChain};
use crate::config::InjectorConfig;
use crate::error::{
    ConfigError, CyclicDependencyError, InjectorError, InvalidCallableError, Result,
    UndefinedParamError,
};
use crate::executable::Executable;
use crate::key::TypeKey;
use crate::reflect::Reflector;
use crate::registry::{Inspection, InspectFilter, Registries};
use crate::schema::{FunctionSchema, ParamSpec, SchemaRegistry, TypeKind, TypeSchema};
use crate::value::Value;

/// The key under which [`Injector::share_self`] exposes the injector.
pub const INJECTOR_KEY: &str = "graft::Injector";

/// State shared by an injector, its clones, and its handles.
struct State {
    registries: Registries,
    schemas: Arc<SchemaRegistry>,
    reflector: Box<dyn Reflector>,
}

/// A recursive dependency injector keyed by registered type names.
///
/// # Examples
/// ```
/// use graft_container::injector::Injector;
/// use graft_container::schema::{ParamSpec, TypeSchema};
/// use graft_container::value::Value;
///
/// # fn main() -> graft_container::error::Result<()> {
/// struct Logger { level: String }
/// struct App { logger: std::sync::Arc<Logger> }
///
/// let injector = Injector::new();
/// injector.register_type(
///     TypeSchema::concrete::<Logger>("app::logger")
///         .param(ParamSpec::untyped("level").with_default(Value::from("info")))
///         .factory(|args| Ok(Value::of(Logger { level: args.get(0)? }))),
/// )?;
/// injector.register_type(
///     TypeSchema::concrete::<App>("app::kernel")
///         .param(ParamSpec::hinted("logger", "app::logger"))
///         .factory(|args| Ok(Value::of(App { logger: args.instance(0)? }))),
/// )?;
///
/// let app = injector.make("app::kernel")?;
/// assert_eq!(app.downcast_ref::<App>().unwrap().logger.level, "info");
/// # Ok(())
/// # }
/// ```
pub struct Injector {
    state: Arc<State>,
    stack: CallStack,
}

// ─── construction ───

impl Injector {
    /// An empty injector with a fresh schema space and a caching
    /// reflector over it.
    pub fn new() -> Self {
        Injector::with_reflector(CachingReflector::standard)
    }

    /// An empty injector using a custom reflector.
    ///
    /// The builder closure receives the injector's schema registry so the
    /// reflector can resolve against it.
    pub fn with_reflector<R, F>(build: F) -> Self
    where
        R: Reflector + 'static,
        F: FnOnce(Arc<SchemaRegistry>) -> R,
    {
        let schemas = Arc::new(SchemaRegistry::new());
        let reflector = Box::new(build(Arc::clone(&schemas)));
        Injector {
            state: Arc::new(State {
                registries: Registries::new(),
                schemas,
                reflector,
            }),
            stack: CallStack::new(),
        }
    }

    /// An injector with a configuration's mappings already registered.
    ///
    /// # Errors
    /// Fails if any mapping in the configuration is rejected; see
    /// [`Injector::register_mappings`].
    pub fn with_config(config: &InjectorConfig) -> Result<Self> {
        let injector = Injector::new();
        injector.register_mappings(config)?;
        Ok(injector)
    }
}

// ─── registration ───

impl Injector {
    /// Registers a type schema.
    ///
    /// # Errors
    /// Fails if a schema with the same key already exists.
    pub fn register_type(&self, schema: TypeSchema) -> Result<&Self> {
        self.state.schemas.register_type(schema)?;
        Ok(self)
    }

    /// Registers a free function schema.
    ///
    /// # Errors
    /// Fails if a function with the same name already exists.
    pub fn register_function(&self, schema: FunctionSchema) -> Result<&Self> {
        self.state.schemas.register_function(schema)?;
        Ok(self)
    }

    /// Stores constructor argument instructions for a type.
    ///
    /// Stored instructions merge under call-site arguments when the type
    /// is made; the call site wins per entry.
    pub fn define(&self, name: impl AsRef<str>, args: Args) -> &Self {
        let (_, key) = self.resolve_alias(name.as_ref());
        self.state.registries.set_definition(key, args);
        self
    }

    /// Sets a global fallback value for every untyped parameter with this
    /// name.
    pub fn define_param(&self, name: impl Into<String>, value: Value) -> &Self {
        self.state.registries.set_param(name.into(), value);
        self
    }

    /// Routes every request for `original` to `alias_to`.
    ///
    /// A pending share on the original moves to the target, so sharing
    /// before aliasing works in either order.
    ///
    /// # Errors
    /// Fails on empty names, or when the original already holds a built
    /// shared instance.
    pub fn alias(&self, original: impl AsRef<str>, alias_to: impl AsRef<str>) -> Result<&Self> {
        let original = original.as_ref();
        let alias_to = alias_to.as_ref();
        if original.is_empty() || alias_to.is_empty() {
            return Err(ConfigError::EmptyAlias.into());
        }

        let original_key = TypeKey::new(original);
        let target_key = TypeKey::new(alias_to);

        if let Some(held) = self.state.registries.shared_value(&original_key) {
            return Err(ConfigError::CannotAliasShared {
                original: original.to_string(),
                alias_to: alias_to.to_string(),
                share_type: held.type_name().to_string(),
            }
            .into());
        }

        self.state
            .registries
            .migrate_pending_share(&original_key, &target_key);
        self.state
            .registries
            .set_alias(original_key, alias_to.to_string());
        Ok(self)
    }

    /// Marks a type as shared: the first made instance is stored and
    /// returned for every later request.
    pub fn share(&self, name: impl AsRef<str>) -> &Self {
        let (_, key) = self.resolve_alias(name.as_ref());
        self.state.registries.mark_share_pending(&key);
        self
    }

    /// Stores an already-built instance as the shared value for its own
    /// registered type key.
    ///
    /// # Errors
    /// Fails when the instance's Rust type has no schema, or when its key
    /// has been aliased away.
    pub fn share_instance(&self, instance: Value) -> Result<&Self> {
        let Some(key) = self.state.schemas.key_of(&instance) else {
            return Err(ConfigError::UnknownInstanceType {
                type_name: instance.type_name(),
            }
            .into());
        };

        if let Some(target) = self.state.registries.alias_target(&key) {
            let type_name = match self.state.schemas.get(&key) {
                Some(info) => info.name().to_string(),
                None => key.as_str().to_string(),
            };
            return Err(ConfigError::CannotShareAliased {
                type_name,
                alias_to: target,
            }
            .into());
        }

        self.state.registries.store_shared(&key, instance);
        Ok(self)
    }

    /// Makes the injector itself resolvable under [`INJECTOR_KEY`].
    ///
    /// What gets stored is a weak [`InjectorHandle`], so the shared state
    /// never owns itself; consumers call [`InjectorHandle::acquire`].
    ///
    /// # Errors
    /// Fails only if registering the handle schema is rejected.
    pub fn share_self(&self) -> Result<&Self> {
        let key = TypeKey::new(INJECTOR_KEY);
        if !self.state.schemas.contains(&key) {
            self.state
                .schemas
                .register_type(TypeSchema::concrete::<InjectorHandle>(INJECTOR_KEY))?;
        }
        self.state
            .registries
            .store_shared(&key, Value::of(self.handle()));
        Ok(self)
    }

    /// Hands construction of a type over to a callable.
    ///
    /// The callable's own parameters are provisioned against the
    /// call-site arguments; stored definitions for the type do not apply.
    ///
    /// # Errors
    /// Fails when the callable does not describe anything invocable.
    pub fn delegate(&self, name: impl AsRef<str>, callable: impl Into<Callable>) -> Result<&Self> {
        let callable = callable.into();
        self.ensure_invocable(&callable)?;
        // Delegates key on the name as given; aliases do not apply.
        let key = TypeKey::new(name.as_ref());
        self.state.registries.set_delegate(key, callable);
        Ok(self)
    }

    /// Registers a callable to run on every made instance of a type or
    /// capability, receiving the instance as its only argument.
    ///
    /// A non-null result of the requested type replaces the instance.
    ///
    /// # Errors
    /// Fails when the callable does not describe anything invocable.
    pub fn prepare(&self, name: impl AsRef<str>, callable: impl Into<Callable>) -> Result<&Self> {
        let callable = callable.into();
        self.ensure_invocable(&callable)?;
        let (_, key) = self.resolve_alias(name.as_ref());
        self.state.registries.set_prepare(key, callable);
        Ok(self)
    }

    /// Wraps a type behind a proxy callable.
    ///
    /// On `make`, the callable receives the display name and a
    /// [`LazyBuilder`]; whatever it returns stands in for the instance,
    /// and the real construction runs only when the builder is forced.
    ///
    /// # Errors
    /// Fails when the callable does not describe anything invocable.
    pub fn proxy(&self, name: impl AsRef<str>, callable: impl Into<Callable>) -> Result<&Self> {
        let callable = callable.into();
        self.ensure_invocable(&callable)?;
        let (_, key) = self.resolve_alias(name.as_ref());
        self.state.registries.set_proxy(key, callable);
        Ok(self)
    }

    /// Applies every mapping in a configuration to this injector.
    ///
    /// # Errors
    /// Fails with [`ConfigError::InvalidMappings`] when a mapping cannot
    /// be applied, and with the registration error itself when a fanned-out
    /// call is rejected.
    pub fn register_mappings(&self, config: &InjectorConfig) -> Result<&Self> {
        config.apply_to(self)?;
        Ok(self)
    }
}

// ─── resolution ───

impl Injector {
    /// Resolves a name to an instance.
    ///
    /// # Errors
    /// See [`Injector::make_with`].
    pub fn make(&self, name: impl AsRef<str>) -> Result<Value> {
        self.make_with(name, &Args::new())
    }

    /// Resolves a name to an instance with call-site argument overrides.
    ///
    /// The name is alias-resolved once, checked against the in-progress
    /// chain, and then served from the share store, a delegate, a proxy,
    /// or constructor provisioning, in that order. Preparers run on the
    /// result before a pending share slot captures it.
    ///
    /// # Errors
    /// Cyclic requests, missing schemas, unprovisionable parameters, and
    /// factory failures all surface as [`InjectorError`] variants naming
    /// the type involved.
    pub fn make_with(&self, name: impl AsRef<str>, args: &Args) -> Result<Value> {
        let (display, key) = self.resolve_alias(name.as_ref());

        if self.stack.contains(&key) {
            let chain = self.stack.snapshot();
            warn!(key = %key, chain = ?chain, "Cyclic dependency detected");
            return Err(InjectorError::CyclicDependency(CyclicDependencyError {
                name: display,
                chain,
            }));
        }
        let _frame = self.stack.enter(key.clone());

        if let Some(shared) = self.state.registries.shared_value(&key) {
            trace!(key = %key, "Reusing shared instance");
            return Ok(shared);
        }

        let made = if let Some(delegate) = self.state.registries.delegate_for(&key) {
            trace!(key = %key, "Delegating construction");
            let executable = self.build_executable(delegate)?;
            let values =
                self.provision_params(executable.display(), executable.params(), args)?;
            let result = executable.invoke(self, values)?;
            self.apply_preparers(&display, &key, result)?
        } else if let Some(proxy) = self.state.registries.proxy_for(&key) {
            trace!(key = %key, "Deferring construction behind proxy");
            // Preparers run when the proxy forces its builder.
            self.make_via_proxy(&display, &key, &proxy, args)?
        } else {
            let built = self.provision_instance(&display, &key, args)?;
            self.apply_preparers(&display, &key, built)?
        };

        self.state.registries.store_if_pending(&key, &made);
        Ok(made)
    }

    /// The chain of types currently being provisioned, outermost first,
    /// without the innermost in-progress entry.
    ///
    /// Inside a delegate this means [`DependencyChain::requester`] names
    /// the type that needed the delegated one.
    pub fn dependency_chain(&self) -> DependencyChain {
        DependencyChain::from_stack(self.stack.snapshot())
    }

    /// A weak handle onto this injector's shared state.
    pub fn handle(&self) -> InjectorHandle {
        InjectorHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    /// A snapshot of registration tables, optionally filtered by name
    /// and table mask. An empty mask selects every table.
    pub fn inspect(&self, name: Option<&str>, filter: InspectFilter) -> Inspection {
        let key = name.map(TypeKey::new);
        self.state.registries.inspect(key.as_ref(), filter)
    }

    /// The schema registry backing this injector.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.state.schemas
    }
}

// ─── execution ───

impl Injector {
    /// Invokes a callable, provisioning any parameters the call-site
    /// arguments leave open.
    ///
    /// # Errors
    /// See [`Injector::execute_with`].
    pub fn execute(&self, callable: impl Into<Callable>) -> Result<Value> {
        self.execute_with(callable, &Args::new())
    }

    /// Invokes a callable with call-site argument overrides.
    ///
    /// The result is returned verbatim; unlike [`Injector::make_with`],
    /// null is a legal outcome.
    ///
    /// # Errors
    /// Fails when the callable cannot be normalized or when a parameter
    /// cannot be provisioned.
    pub fn execute_with(&self, callable: impl Into<Callable>, args: &Args) -> Result<Value> {
        let executable = self.build_executable(callable)?;
        let values = self.provision_params(executable.display(), executable.params(), args)?;
        executable.invoke(self, values)
    }

    /// Normalizes a callable descriptor into an [`Executable`].
    ///
    /// String forms resolve in order: registered function, invokable type
    /// (a made instance of a type with an `invoke` method), then
    /// `Type::method` with the method taken after the last `::` and the
    /// `parent::` marker recognized just before it.
    ///
    /// # Errors
    /// Unresolvable descriptors fail as [`InjectorError::InvalidCallable`];
    /// failures while making a method receiver propagate as themselves.
    pub fn build_executable(&self, callable: impl Into<Callable>) -> Result<Executable> {
        let callable = callable.into();
        let rendered = callable.render();

        match callable {
            Callable::Closure(schema) => Ok(Executable::from_function(schema)),
            Callable::Name(name) => self.executable_from_name(&name, &rendered),
            Callable::Instance(receiver) => self.invokable_executable(receiver, &rendered),
            Callable::InstanceMethod(receiver, method) => {
                let schema = self
                    .state
                    .reflector
                    .method_of(&receiver, &method)
                    .map_err(|_| invalid_callable(&rendered))?;
                let display = self.instance_method_display(&receiver, schema.name());
                if schema.is_static() {
                    Ok(Executable::from_method(schema, None, display))
                } else {
                    Ok(Executable::from_method(schema, Some(receiver), display))
                }
            }
            Callable::ClassMethod(type_name, method) => {
                let (method, via_parent) = split_parent_marker(&method);
                self.class_method_executable(&type_name, method, via_parent, &rendered)
            }
        }
    }

    fn executable_from_name(&self, name: &str, rendered: &str) -> Result<Executable> {
        if let Ok(function) = self.state.reflector.function(name) {
            return Ok(Executable::from_function(function));
        }

        // An invokable type name probes as given; `make` below still
        // resolves aliases.
        if self
            .state
            .schemas
            .method_on(&TypeKey::new(name), INVOKE_METHOD)
            .is_some()
        {
            let receiver = self.make(name)?;
            return self.invokable_executable(receiver, rendered);
        }

        if let Some(split) = split_type_method(name) {
            return self.class_method_executable(
                split.type_name,
                split.method,
                split.via_parent,
                rendered,
            );
        }

        Err(invalid_callable(rendered))
    }

    fn invokable_executable(&self, receiver: Value, rendered: &str) -> Result<Executable> {
        let schema = self
            .state
            .reflector
            .method_of(&receiver, INVOKE_METHOD)
            .map_err(|_| invalid_callable(rendered))?;
        let display = self.instance_method_display(&receiver, schema.name());
        if schema.is_static() {
            Ok(Executable::from_method(schema, None, display))
        } else {
            Ok(Executable::from_method(schema, Some(receiver), display))
        }
    }

    fn class_method_executable(
        &self,
        type_name: &str,
        method: &str,
        via_parent: bool,
        rendered: &str,
    ) -> Result<Executable> {
        let owner = if via_parent {
            let child = self
                .state
                .reflector
                .class(type_name)
                .map_err(|_| invalid_callable(rendered))?;
            match child.parent() {
                Some(parent) => parent.to_string(),
                None => return Err(invalid_callable(rendered)),
            }
        } else {
            type_name.to_string()
        };

        let (display, key) = self.resolve_alias(&owner);
        let schema = self
            .state
            .reflector
            .method(&display, method)
            .map_err(|_| invalid_callable(rendered))?;

        if schema.is_static() {
            let label = match self.state.schemas.get(&key) {
                Some(info) => format!("{}::{}", info.name(), schema.name()),
                None => format!("{display}::{}", schema.name()),
            };
            return Ok(Executable::from_method(schema, None, label));
        }

        let receiver = self.make(&display)?;
        // Re-resolve on the receiver's runtime type; an alias may have
        // produced a subtype with its own override.
        let schema = self
            .state
            .reflector
            .method_of(&receiver, method)
            .map_err(|_| invalid_callable(rendered))?;
        let label = self.instance_method_display(&receiver, schema.name());
        Ok(Executable::from_method(schema, Some(receiver), label))
    }

    fn instance_method_display(&self, receiver: &Value, method: &str) -> String {
        match self
            .state
            .schemas
            .key_of(receiver)
            .and_then(|key| self.state.schemas.get(&key))
        {
            Some(info) => format!("{}::{method}", info.name()),
            None => format!("{}::{method}", shorten_type_name(receiver.type_name())),
        }
    }
}

// ─── provisioning internals ───

impl Injector {
    /// One-hop alias resolution: returns the display name (the alias
    /// target as registered, or the name as given) and its key.
    fn resolve_alias(&self, name: &str) -> (String, TypeKey) {
        let key = TypeKey::new(name);
        match self.state.registries.alias_target(&key) {
            Some(target) => {
                let key = TypeKey::new(&target);
                (target, key)
            }
            None => (name.to_string(), key),
        }
    }

    fn provision_instance(&self, display: &str, key: &TypeKey, args: &Args) -> Result<Value> {
        let info = self
            .state
            .reflector
            .class(display)
            .map_err(|source| InjectorError::make_failure(display, source))?;

        if info.kind() != TypeKind::Concrete {
            return Err(InjectorError::NeedsDefinition {
                kind: info.kind().word(),
                name: display.to_string(),
            });
        }
        let Some(constructor) = info.constructor() else {
            return Err(InjectorError::NeedsDefinition {
                kind: info.kind().word(),
                name: display.to_string(),
            });
        };
        if !constructor.is_public() {
            return Err(InjectorError::NonPublicConstructor {
                name: display.to_string(),
            });
        }

        let definition = match self.state.registries.definition_for(key) {
            Some(stored) => stored.merged_with(args),
            None => args.clone(),
        };
        let owner = info.constructor_display();
        let values = self.provision_params(&owner, constructor.params(), &definition)?;
        constructor.build(&ResolvedArgs::new(&owner, values))
    }

    fn provision_params(
        &self,
        owner: &str,
        params: &[ParamSpec],
        args: &Args,
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(params.len());
        for (position, param) in params.iter().enumerate() {
            values.push(self.provision_param(owner, position, param, args)?);
        }
        Ok(values)
    }

    fn provision_param(
        &self,
        owner: &str,
        position: usize,
        param: &ParamSpec,
        args: &Args,
    ) -> Result<Value> {
        if let Some(value) = args.positional(position) {
            return Ok(value.clone());
        }
        if let Some(arg) = args.named(param.name()) {
            return self.provision_named(param, arg);
        }
        if let Some(hint) = self.state.reflector.param_type_hint(param) {
            return self.provision_hinted(param, &hint);
        }
        self.provision_untyped(owner, position, param)
    }

    fn provision_named(&self, param: &ParamSpec, arg: &Arg) -> Result<Value> {
        match arg {
            Arg::Raw(value) => Ok(value.clone()),
            Arg::Make(type_name) => self.make(type_name),
            Arg::Delegate(callable) => {
                let executable = self.build_executable(callable.clone())?;
                executable.invoke(self, vec![Value::from(param.name())])
            }
            Arg::Nested(type_name, nested) => self.make_with(type_name, nested),
        }
    }

    fn provision_hinted(&self, param: &ParamSpec, hint: &TypeKey) -> Result<Value> {
        if let Some(default) = param.default() {
            let registries = &self.state.registries;
            // A pending share already claims the hint, so the default
            // loses to every kind of binding.
            let bound = registries.has_alias(hint)
                || registries.has_delegate(hint)
                || registries.has_share(hint)
                || registries.has_proxy(hint);
            if !bound {
                return Ok(default.clone());
            }
        }
        self.make(hint.as_str())
    }

    fn provision_untyped(&self, owner: &str, position: usize, param: &ParamSpec) -> Result<Value> {
        if let Some(value) = self.state.registries.param_for(param.name()) {
            return Ok(value);
        }
        if let Some(default) = param.default() {
            return Ok(default.clone());
        }
        if param.is_optional() {
            return Ok(Value::null());
        }
        Err(InjectorError::UndefinedParam(UndefinedParamError {
            param: param.name().to_string(),
            position,
            function: owner.to_string(),
            chain: self.stack.snapshot(),
        }))
    }

    fn apply_preparers(&self, display: &str, key: &TypeKey, instance: Value) -> Result<Value> {
        let mut current = instance;
        let mut ran = Vec::new();

        // The exact-key preparer runs first and may replace a result that
        // is not an instance yet.
        if let Some(preparer) = self.state.registries.prepare_for(key) {
            ran.push(key.clone());
            current = self.run_preparer(key, &preparer, current)?;
        }

        if current.is_null() {
            return Err(InjectorError::MakingFailed {
                name: display.to_string(),
                actual: current.type_name().to_string(),
            });
        }

        if let Some(runtime) = self.state.schemas.key_of(&current) {
            for capability in self.state.schemas.capabilities_of(&runtime) {
                if ran.contains(&capability) {
                    continue;
                }
                if let Some(preparer) = self.state.registries.prepare_for(&capability) {
                    ran.push(capability);
                    current = self.run_preparer(key, &preparer, current)?;
                }
            }
        }

        Ok(current)
    }

    fn run_preparer(&self, requested: &TypeKey, preparer: &Callable, current: Value) -> Result<Value> {
        let executable = self.build_executable(preparer.clone())?;
        let result = executable.invoke(self, vec![current.clone()])?;
        if !result.is_null() && self.state.schemas.instance_of(&result, requested) {
            trace!(key = %requested, "Preparer replaced the instance");
            return Ok(result);
        }
        Ok(current)
    }

    fn make_via_proxy(
        &self,
        display: &str,
        key: &TypeKey,
        proxy: &Callable,
        args: &Args,
    ) -> Result<Value> {
        let executable = self.build_executable(proxy.clone())?;
        let builder = self.deferred_builder(display, key, args);
        let result = executable.invoke(self, vec![Value::from(display), Value::of(builder)])?;

        if result.is_null() {
            return Err(InjectorError::MakingFailed {
                name: display.to_string(),
                actual: result.type_name().to_string(),
            });
        }
        Ok(result)
    }

    fn deferred_builder(&self, display: &str, key: &TypeKey, args: &Args) -> LazyBuilder {
        let handle = self.handle();
        let target = display.to_string();
        let key = key.clone();
        let args = args.clone();

        LazyBuilder::new(display, move || {
            let Some(injector) = handle.acquire() else {
                return Err(InjectorError::make_failure(
                    &target,
                    "the owning injector was dropped before the proxy was forced",
                ));
            };
            let _frame = injector.stack.enter(key.clone());
            let built = injector.provision_instance(&target, &key, &args)?;
            injector.apply_preparers(&target, &key, built)
        })
    }

    fn ensure_invocable(&self, callable: &Callable) -> Result<()> {
        if self.is_invocable(callable) {
            return Ok(());
        }
        Err(ConfigError::NotInvocable {
            rendered: callable.render(),
        }
        .into())
    }

    fn is_invocable(&self, callable: &Callable) -> bool {
        match callable {
            Callable::Closure(_) => true,
            Callable::Instance(receiver) => self.value_has_method(receiver, INVOKE_METHOD),
            Callable::InstanceMethod(receiver, method) => self.value_has_method(receiver, method),
            Callable::ClassMethod(type_name, method) => {
                let (method, via_parent) = split_parent_marker(method);
                self.type_has_method(type_name, method, via_parent)
            }
            Callable::Name(name) => {
                self.state.schemas.function(name).is_some()
                    || self
                        .state
                        .schemas
                        .method_on(&TypeKey::new(name), INVOKE_METHOD)
                        .is_some()
                    || split_type_method(name).is_some_and(|split| {
                        self.type_has_method(split.type_name, split.method, split.via_parent)
                    })
            }
        }
    }

    fn value_has_method(&self, receiver: &Value, method: &str) -> bool {
        self.state
            .schemas
            .key_of(receiver)
            .is_some_and(|key| self.state.schemas.method_on(&key, method).is_some())
    }

    fn type_has_method(&self, type_name: &str, method: &str, via_parent: bool) -> bool {
        let owner = if via_parent {
            let Some(info) = self.state.schemas.get(&TypeKey::new(type_name)) else {
                return false;
            };
            match info.parent() {
                Some(parent) => parent.to_string(),
                None => return false,
            }
        } else {
            type_name.to_string()
        };
        let (_, key) = self.resolve_alias(&owner);
        self.state.schemas.method_on(&key, method).is_some()
    }
}

impl Clone for Injector {
    /// Clones share every registration with the original; the clone gets
    /// its own in-progress chain.
    fn clone(&self) -> Self {
        Injector {
            state: Arc::clone(&self.state),
            stack: CallStack::new(),
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Injector::new()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("registries", &self.state.registries)
            .field("schemas", &self.state.schemas)
            .field("stack", &self.stack)
            .finish()
    }
}

fn invalid_callable(rendered: &str) -> InjectorError {
    InjectorError::InvalidCallable(InvalidCallableError {
        rendered: rendered.to_string(),
    })
}

// ─── handles and lazy builders ───

/// A weak, clonable reference to an injector's shared state.
///
/// This is what [`Injector::share_self`] stores and what proxy builders
/// capture; it never keeps the injector alive on its own.
#[derive(Clone)]
pub struct InjectorHandle {
    state: Weak<State>,
}

impl InjectorHandle {
    /// Reacquires a working injector with a fresh in-progress chain, or
    /// `None` once every owning injector has been dropped.
    pub fn acquire(&self) -> Option<Injector> {
        let state = self.state.upgrade()?;
        Some(Injector {
            state,
            stack: CallStack::new(),
        })
    }
}

impl fmt::Debug for InjectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorHandle")
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

enum LazyState {
    Deferred(Box<dyn FnOnce() -> Result<Value> + Send>),
    Building,
    Built(Value),
    Failed,
}

/// The deferred construction a proxy callable receives.
///
/// Forcing it provisions the real instance and runs its preparers; the
/// result is kept, so forcing again returns the same instance.
pub struct LazyBuilder {
    target: String,
    state: Mutex<LazyState>,
}

impl LazyBuilder {
    fn new(target: impl Into<String>, build: impl FnOnce() -> Result<Value> + Send + 'static) -> Self {
        LazyBuilder {
            target: target.into(),
            state: Mutex::new(LazyState::Deferred(Box::new(build))),
        }
    }

    /// The display name of the type this builder provisions.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether the real instance has been built.
    pub fn is_built(&self) -> bool {
        matches!(&*self.state.lock(), LazyState::Built(_))
    }

    /// Builds the real instance on first use; later calls return the
    /// same instance.
    ///
    /// # Errors
    /// Provisioning failures surface once and latch: forcing again after
    /// a failure fails without retrying the build.
    pub fn force(&self) -> Result<Value> {
        let build = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, LazyState::Building) {
                LazyState::Deferred(build) => build,
                LazyState::Built(value) => {
                    *state = LazyState::Built(value.clone());
                    return Ok(value);
                }
                LazyState::Building => {
                    return Err(InjectorError::make_failure(
                        &self.target,
                        "the deferred builder was forced from inside its own build",
                    ));
                }
                LazyState::Failed => {
                    *state = LazyState::Failed;
                    return Err(InjectorError::make_failure(
                        &self.target,
                        "an earlier forced build already failed",
                    ));
                }
            }
        };

        // The build itself runs unlocked; it recurses into the injector.
        let result = build();
        *self.state.lock() = match &result {
            Ok(value) => LazyState::Built(value.clone()),
            Err(_) => LazyState::Failed,
        };
        result
    }
}

impl fmt::Debug for LazyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.lock() {
            LazyState::Deferred(_) => "deferred",
            LazyState::Building => "building",
            LazyState::Built(_) => "built",
            LazyState::Failed => "failed",
        };
        f.debug_struct("LazyBuilder")
            .field("target", &self.target)
            .field("state", &state)
            .finish()
    }
}
