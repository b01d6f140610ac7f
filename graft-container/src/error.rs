//! Error types for injector operations.
//!
//! Every failure names the type or parameter involved and, where a remedy
//! is known, carries a `Hint:` line describing it.

use crate::key::TypeKey;
use graft_support::rendering::render_chain;
use std::fmt;

/// Main error type for all injector operations.
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// A registration call was rejected.
    #[error("{}", .0)]
    Config(#[from] ConfigError),

    /// A type already being provisioned was requested again further down
    /// the same resolution.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// An uninstantiable type was requested with no alias, delegate, or
    /// share rule telling the injector what to build instead.
    #[error("Injection definition required for {kind} {name}\n  Hint: Alias it to a concrete type, register a delegate, or share an instance")]
    NeedsDefinition { kind: &'static str, name: String },

    /// The type's constructor is declared non-public.
    #[error("Cannot instantiate {name}: its constructor is not public\n  Hint: Share a pre-built instance with share_instance() instead")]
    NonPublicConstructor { name: String },

    /// A parameter could not be provisioned by any rule.
    #[error("{}", .0)]
    UndefinedParam(UndefinedParamError),

    /// Reflection or a registered factory failed while making a type.
    #[error("Could not make {name}: {source}")]
    MakeFailure {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A callable descriptor could not be normalized into an executable.
    #[error("{}", .0)]
    InvalidCallable(InvalidCallableError),

    /// A path that must produce an instance produced something else.
    #[error("Making {name} did not produce an instance; the result was of type '{actual}'")]
    MakingFailed { name: String, actual: String },
}

impl InjectorError {
    /// Wraps an underlying cause as a [`InjectorError::MakeFailure`].
    pub fn make_failure(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        InjectorError::MakeFailure { name: name.into(), source: source.into() }
    }
}

/// Errors raised by registration calls and config fan-out.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `alias` was given an empty original or alias name.
    #[error("Invalid alias: both the original and the alias must be non-empty")]
    EmptyAlias,

    /// The original already holds a built shared instance, so aliasing it
    /// away would silently orphan that instance.
    #[error("Cannot alias {original} to {alias_to} because it is currently shared as {share_type}\n  Hint: Alias first, then share")]
    CannotAliasShared {
        original: String,
        alias_to: String,
        share_type: String,
    },

    /// The instance's concrete type has been aliased to something else.
    #[error("Cannot share an instance of {type_name} because it is currently aliased to {alias_to}\n  Hint: Share an instance of the alias target instead")]
    CannotShareAliased { type_name: String, alias_to: String },

    /// The instance's Rust type has no schema, so no lookup key exists
    /// for it.
    #[error("Cannot share an instance of {type_name}: no schema is registered for that type\n  Hint: Call register_type() for it first")]
    UnknownInstanceType { type_name: &'static str },

    /// A delegate, preparer, or proxy descriptor does not describe
    /// anything invocable.
    #[error("Expected a valid callable\n  Received: {rendered}")]
    NotInvocable { rendered: String },

    /// A schema for this key already exists.
    #[error("A schema named {name} is already registered\n  Hint: Schemas are immutable once registered; pick a distinct name")]
    DuplicateSchema { name: String },

    /// Config fan-out failed partway through.
    #[error("Failed to set up injector mappings: {reason}")]
    InvalidMappings { reason: String },
}

/// Errors raised by schema lookups.
///
/// The core wraps these: as [`InjectorError::MakeFailure`] during instance
/// provisioning, as [`InjectorError::InvalidCallable`] while normalizing a
/// callable.
#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    /// No type schema under this name.
    #[error("{}", .0)]
    UnknownType(UnknownTypeError),

    /// No function schema under this name.
    #[error("No function named {name} is registered")]
    UnknownFunction { name: String },

    /// The type exists but declares no such method anywhere in its
    /// parent chain.
    #[error("{type_name} has no method named {method}")]
    UnknownMethod { type_name: String, method: String },
}

/// A requested type name with no schema, plus close registered names.
#[derive(Debug)]
pub struct UnknownTypeError {
    /// The name as requested.
    pub name: String,
    /// Registered keys close to the requested name.
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No type named {} is registered", self.name)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to call register_type() for {}?",
            self.name
        )
    }
}

/// A cycle in the in-progress resolution stack.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// The type whose resolution closed the cycle, in display casing.
    pub name: String,
    /// The in-progress chain at the moment of detection.
    pub chain: Vec<TypeKey>,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let closing = TypeKey::new(&self.name);
        write!(
            f,
            "Detected a cyclic dependency while provisioning {}:\n  ",
            self.name
        )?;
        write!(f, "{} → {closing}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: Break the loop with a proxy or a delegate that defers one side"
        )
    }
}

/// A parameter no provisioning rule could satisfy.
#[derive(Debug)]
pub struct UndefinedParamError {
    /// The declared parameter name.
    pub param: String,
    /// Zero-based position in the owning signature.
    pub position: usize,
    /// The owning function, e.g. `App::Logger::new`.
    pub function: String,
    /// The in-progress chain at the moment of failure.
    pub chain: Vec<TypeKey>,
}

impl fmt::Display for UndefinedParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No definition available to provision parameter `{}` at position {} in {}()",
            self.param, self.position, self.function
        )?;

        if !self.chain.is_empty() {
            write!(f, "\n  Chain: {}", render_chain(&self.chain))?;
        }

        write!(
            f,
            "\n  Hint: Give the parameter a type hint, a default, or a define_param() value"
        )
    }
}

/// A resolved argument list read back with the wrong shape.
///
/// Produced by the typed accessors on a resolved argument list and wrapped
/// as the source of a [`InjectorError::MakeFailure`] naming the owning
/// function.
#[derive(Debug, thiserror::Error)]
#[error("Argument {index} is {actual}, expected {expected}")]
pub struct ArgumentMismatch {
    /// Zero-based argument position.
    pub index: usize,
    /// The Rust type the reader asked for.
    pub expected: &'static str,
    /// What was actually there: a type name, `"null"`, or `"missing"`.
    pub actual: String,
}

/// A callable descriptor that could not be normalized.
#[derive(Debug)]
pub struct InvalidCallableError {
    /// The rendered descriptor, already clipped to a sane length.
    pub rendered: String,
}

impl fmt::Display for InvalidCallableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid callable: a function name, Type::method path, closure, or invokable instance is required",
        )?;
        write!(f, "\n  Received: {}", self.rendered)
    }
}

/// Convenient Result type for injector operations.
pub type Result<T> = std::result::Result<T, InjectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_error_shows_chain() {
        let err = InjectorError::CyclicDependency(CyclicDependencyError {
            name: "RecursiveA".to_string(),
            chain: vec![TypeKey::new("RecursiveA"), TypeKey::new("RecursiveB")],
        });

        let msg = format!("{err}");
        assert!(msg.contains("cyclic dependency"));
        assert!(msg.contains("recursivea → recursiveb → recursivea"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn unknown_type_lists_suggestions() {
        let err = UnknownTypeError {
            name: "app::loger".to_string(),
            suggestions: vec!["app::logger".to_string()],
        };

        let msg = format!("{err}");
        assert!(msg.contains("No type named app::loger"));
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("app::logger"));
    }

    #[test]
    fn undefined_param_names_position_and_owner() {
        let err = InjectorError::UndefinedParam(UndefinedParamError {
            param: "limit".to_string(),
            position: 1,
            function: "Paginator::new".to_string(),
            chain: vec![TypeKey::new("Paginator")],
        });

        let msg = format!("{err}");
        assert!(msg.contains("`limit`"));
        assert!(msg.contains("position 1"));
        assert!(msg.contains("Paginator::new()"));
        assert!(msg.contains("Chain: paginator"));
    }

    #[test]
    fn make_failure_carries_source() {
        let source = ReflectionError::UnknownFunction { name: "boot".into() };
        let err = InjectorError::make_failure("app::kernel", source);

        let msg = format!("{err}");
        assert!(msg.contains("Could not make app::kernel"));
        assert!(msg.contains("No function named boot"));
    }

    #[test]
    fn config_errors_name_both_sides() {
        let err = ConfigError::CannotShareAliased {
            type_name: "app::cache".to_string(),
            alias_to: "app::redis_cache".to_string(),
        };

        let msg = format!("{err}");
        assert!(msg.contains("app::cache"));
        assert!(msg.contains("app::redis_cache"));
    }
}
