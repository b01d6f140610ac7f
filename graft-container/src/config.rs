//! Declarative injector configuration.
//!
//! An [`InjectorConfig`] collects registrations as data (aliases, shares,
//! argument definitions, argument providers, delegations, preparations)
//! and fans them out onto an injector in one pass. Sections keep their
//! insertion order, and entries can be looked up with a dotted path such
//! as `"delegations.app::logger"`.

use tracing::{debug, instrument};

use crate::args::Args;
use crate::callable::Callable;
use crate::error::{ConfigError, InjectorError, Result};
use crate::injector::Injector;
use crate::key::TypeKey;
use crate::value::Value;

/// A provider block: callables that produce one named argument for a set
/// of aliases.
///
/// Each mapping's callable is executed with `(alias, interface)` when the
/// argument is provisioned for that alias.
#[derive(Clone, Debug, Default)]
pub struct ArgumentProvider {
    interface: Option<String>,
    mappings: Vec<(String, Callable)>,
}

impl ArgumentProvider {
    pub fn new() -> Self {
        ArgumentProvider::default()
    }

    /// The capability the produced values fulfill, passed through to the
    /// mapping callables.
    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    /// Adds a mapping: when `alias` needs the argument, `source`
    /// produces it.
    pub fn mapping(mut self, alias: impl Into<String>, source: impl Into<Callable>) -> Self {
        self.mappings.push((alias.into(), source.into()));
        self
    }

    /// The configured capability name, if any.
    pub fn interface_name(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// The configured mappings in insertion order.
    pub fn mappings(&self) -> &[(String, Callable)] {
        &self.mappings
    }
}

/// One entry of a configuration, as returned by [`InjectorConfig::get`].
#[derive(Debug)]
pub enum ConfigEntry<'a> {
    Alias(&'a str),
    Definition(&'a Args),
    Provider(&'a ArgumentProvider),
    Delegation(&'a Callable),
    Preparation(&'a Callable),
}

/// A builder-assembled set of injector registrations.
///
/// # Examples
/// ```
/// use graft_container::config::InjectorConfig;
/// use graft_container::injector::Injector;
///
/// # fn main() -> graft_container::error::Result<()> {
/// let config = InjectorConfig::new()
///     .alias("app::logger", "app::console_logger")
///     .shared_alias("app::db", "app::sqlite");
///
/// assert!(config.has("standard_aliases.app::logger"));
/// let injector = Injector::with_config(&config)?;
/// # let _ = injector;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InjectorConfig {
    standard_aliases: Vec<(String, String)>,
    shared_aliases: Vec<(String, String)>,
    argument_definitions: Vec<(String, Args)>,
    argument_providers: Vec<(String, ArgumentProvider)>,
    delegations: Vec<(String, Callable)>,
    preparations: Vec<(String, Callable)>,
}

impl InjectorConfig {
    pub fn new() -> Self {
        InjectorConfig::default()
    }

    /// Routes `original` to `alias_to`.
    pub fn alias(mut self, original: impl Into<String>, alias_to: impl Into<String>) -> Self {
        self.standard_aliases.push((original.into(), alias_to.into()));
        self
    }

    /// Routes `original` to `alias_to` and shares the result.
    pub fn shared_alias(mut self, original: impl Into<String>, alias_to: impl Into<String>) -> Self {
        self.shared_aliases.push((original.into(), alias_to.into()));
        self
    }

    /// Stores constructor argument instructions for a type.
    pub fn define(mut self, name: impl Into<String>, args: Args) -> Self {
        self.argument_definitions.push((name.into(), args));
        self
    }

    /// Adds a provider block for the parameter named `argument`.
    pub fn provide(mut self, argument: impl Into<String>, provider: ArgumentProvider) -> Self {
        self.argument_providers.push((argument.into(), provider));
        self
    }

    /// Hands construction of a type over to a callable.
    pub fn delegate(mut self, name: impl Into<String>, callable: impl Into<Callable>) -> Self {
        self.delegations.push((name.into(), callable.into()));
        self
    }

    /// Registers a preparation callable for a type or capability.
    pub fn prepare(mut self, name: impl Into<String>, callable: impl Into<Callable>) -> Self {
        self.preparations.push((name.into(), callable.into()));
        self
    }

    /// Looks an entry up by dotted path, `"section.name"`.
    ///
    /// Section names are the field names (`standard_aliases`,
    /// `shared_aliases`, `argument_definitions`, `argument_providers`,
    /// `delegations`, `preparations`). Type names compare
    /// case-insensitively; provider argument names compare exactly.
    pub fn get(&self, path: &str) -> Option<ConfigEntry<'_>> {
        let (section, name) = path.split_once('.')?;
        let key = TypeKey::new(name);
        let by_key = |candidate: &str| TypeKey::new(candidate) == key;

        match section {
            "standard_aliases" => self
                .standard_aliases
                .iter()
                .find(|(original, _)| by_key(original))
                .map(|(_, target)| ConfigEntry::Alias(target)),
            "shared_aliases" => self
                .shared_aliases
                .iter()
                .find(|(original, _)| by_key(original))
                .map(|(_, target)| ConfigEntry::Alias(target)),
            "argument_definitions" => self
                .argument_definitions
                .iter()
                .find(|(candidate, _)| by_key(candidate))
                .map(|(_, args)| ConfigEntry::Definition(args)),
            "argument_providers" => self
                .argument_providers
                .iter()
                .find(|(argument, _)| argument == name)
                .map(|(_, provider)| ConfigEntry::Provider(provider)),
            "delegations" => self
                .delegations
                .iter()
                .find(|(candidate, _)| by_key(candidate))
                .map(|(_, callable)| ConfigEntry::Delegation(callable)),
            "preparations" => self
                .preparations
                .iter()
                .find(|(candidate, _)| by_key(candidate))
                .map(|(_, callable)| ConfigEntry::Preparation(callable)),
            _ => None,
        }
    }

    /// Whether an entry exists at the dotted path.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Applies every section to the injector, in declaration order:
    /// aliases (shared ones first, explicit standard entries win), shares,
    /// accumulated argument definitions and providers, delegations,
    /// preparations.
    #[instrument(skip_all)]
    pub(crate) fn apply_to(&self, injector: &Injector) -> Result<()> {
        debug!(
            aliases = self.standard_aliases.len() + self.shared_aliases.len(),
            definitions = self.argument_definitions.len(),
            providers = self.argument_providers.len(),
            delegations = self.delegations.len(),
            preparations = self.preparations.len(),
            "Applying configuration"
        );

        for (original, target) in self.merged_aliases() {
            // A self-alias is a no-op, not an error.
            if TypeKey::new(original) == TypeKey::new(target) {
                continue;
            }
            injector.alias(original, target).map_err(setup_failure)?;
        }

        for (original, _) in &self.shared_aliases {
            injector.share(original);
        }

        let mut definitions: Vec<(String, Args)> = Vec::new();
        for (name, args) in &self.argument_definitions {
            accumulate(&mut definitions, name, args.clone());
        }
        for (argument, provider) in &self.argument_providers {
            if provider.mappings.is_empty() {
                return Err(ConfigError::InvalidMappings {
                    reason: format!("no provider mappings were given for argument \"{argument}\""),
                }
                .into());
            }
            for (alias, callable) in &provider.mappings {
                let produced = provider_source(alias, provider.interface.as_deref(), callable);
                accumulate(
                    &mut definitions,
                    alias,
                    Args::new().delegate(argument.clone(), produced),
                );
            }
        }
        for (name, args) in definitions {
            injector.define(name, args);
        }

        for (name, callable) in &self.delegations {
            injector.delegate(name, callable.clone()).map_err(setup_failure)?;
        }
        for (name, callable) in &self.preparations {
            injector.prepare(name, callable.clone()).map_err(setup_failure)?;
        }

        Ok(())
    }

    /// Shared aliases also map as standard ones; an explicit standard
    /// entry for the same original wins.
    fn merged_aliases(&self) -> Vec<(&str, &str)> {
        let mut merged: Vec<(&str, &str)> = Vec::new();
        for (original, target) in self.shared_aliases.iter().chain(&self.standard_aliases) {
            let key = TypeKey::new(original);
            match merged
                .iter_mut()
                .find(|(candidate, _)| TypeKey::new(candidate) == key)
            {
                Some(entry) => entry.1 = target.as_str(),
                None => merged.push((original.as_str(), target.as_str())),
            }
        }
        merged
    }
}

fn accumulate(definitions: &mut Vec<(String, Args)>, name: &str, extra: Args) {
    let key = TypeKey::new(name);
    match definitions
        .iter_mut()
        .find(|(candidate, _)| TypeKey::new(candidate) == key)
    {
        Some((_, existing)) => *existing = existing.merged_with(&extra),
        None => definitions.push((name.to_string(), extra)),
    }
}

/// Wraps a provider callable so that provisioning invokes it with
/// `(alias, interface)` instead of the parameter name.
fn provider_source(alias: &str, interface: Option<&str>, callable: &Callable) -> Callable {
    let target = callable.clone();
    let alias = alias.to_string();
    let interface = interface.map(str::to_string);

    Callable::closure(vec![], move |_, injector| {
        let executable = injector.build_executable(target.clone())?;
        let capability = interface.as_deref().map(Value::from).unwrap_or_else(Value::null);
        executable.invoke(injector, vec![Value::from(alias.as_str()), capability])
    })
}

fn setup_failure(source: InjectorError) -> InjectorError {
    ConfigError::InvalidMappings {
        reason: source.to_string(),
    }
    .into()
}
