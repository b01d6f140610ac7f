//! # Graft
//!
//! A recursive, name-keyed dependency injector.
//!
//! Types declare their constructors as schemas; the injector resolves a
//! registered name by provisioning each declared parameter, honoring
//! aliases, shared instances, delegated factories, preparers, and lazy
//! proxies along the way. Callables get the same parameter provisioning
//! through `execute`.
//!
//! This crate re-exports the container and support crates; depend on it
//! unless you need the internals directly.

pub use graft_container::*;
pub use graft_support::*;

/// The commonly used surface in one import.
pub mod prelude {
    pub use graft_container::args::{Arg, Args};
    pub use graft_container::callable::Callable;
    pub use graft_container::config::{ArgumentProvider, InjectorConfig};
    pub use graft_container::error::{InjectorError, Result};
    pub use graft_container::injector::{Injector, InjectorHandle, LazyBuilder};
    pub use graft_container::locator::ServiceLocator;
    pub use graft_container::provider::ServiceProvider;
    pub use graft_container::schema::{FunctionSchema, MethodSchema, ParamSpec, TypeSchema};
    pub use graft_container::value::Value;
}
