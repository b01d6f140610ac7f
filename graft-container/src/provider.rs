//! Service providers, modules of related registrations.
//!
//! A provider groups the registrations for one area of an application
//! (storage, logging, http) behind a single type. [`Injector::bootstrap`]
//! runs a set of them in two phases: every `register` first, then every
//! `boot`, so boot code can resolve types that a later provider
//! registers.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::injector::Injector;

/// A module of related injector registrations.
///
/// # Examples
/// ```
/// use graft_container::injector::Injector;
/// use graft_container::provider::ServiceProvider;
/// use graft_container::schema::TypeSchema;
/// use graft_container::value::Value;
///
/// struct Clock;
/// struct ClockProvider;
///
/// impl ServiceProvider for ClockProvider {
///     fn register(&self, injector: &Injector) -> graft_container::error::Result<()> {
///         injector.register_type(
///             TypeSchema::concrete::<Clock>("app::clock").factory(|_| Ok(Value::of(Clock))),
///         )?;
///         injector.share("app::clock");
///         Ok(())
///     }
/// }
///
/// # fn main() -> graft_container::error::Result<()> {
/// let injector = Injector::new();
/// injector.bootstrap(&[Box::new(ClockProvider)])?;
/// assert!(injector.make("app::clock").is_ok());
/// # Ok(())
/// # }
/// ```
pub trait ServiceProvider: Send + Sync {
    /// Adds this provider's registrations.
    ///
    /// Runs before any provider boots; resolving types another provider
    /// contributes belongs in [`ServiceProvider::boot`].
    fn register(&self, injector: &Injector) -> Result<()>;

    /// Runs once every provider has registered.
    fn boot(&self, injector: &Injector) -> Result<()> {
        let _ = injector;
        Ok(())
    }

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl Injector {
    /// Registers and boots a set of providers.
    ///
    /// Two phases: every provider's `register` runs first, in order, then
    /// every provider's `boot`, in the same order.
    ///
    /// # Errors
    /// The first failing provider stops the run; later providers in the
    /// failing phase never execute.
    #[instrument(skip_all)]
    pub fn bootstrap(&self, providers: &[Box<dyn ServiceProvider>]) -> Result<&Self> {
        for provider in providers {
            debug!(provider = provider.name(), "Registering provider");
            provider.register(self)?;
        }
        for provider in providers {
            debug!(provider = provider.name(), "Booting provider");
            provider.boot(self)?;
        }
        Ok(self)
    }
}
