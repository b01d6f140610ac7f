//! Core injector implementation for Graft DI.

pub mod args;
pub mod cache;
pub mod callable;
pub mod chain;
pub mod config;
pub mod error;
pub mod executable;
pub mod injector;
pub mod key;
pub mod locator;
pub mod provider;
pub mod reflect;
pub mod registry;
pub mod schema;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use args::Args;
pub use callable::Callable;
pub use config::InjectorConfig;
pub use error::{InjectorError, Result};
pub use injector::Injector;
pub use key::TypeKey;
pub use value::Value;
