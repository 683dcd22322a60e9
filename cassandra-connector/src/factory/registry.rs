use arc_swap::ArcSwap;
use fxhash::FxHashMap;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::*;

use crate::cluster::Session;
use crate::factory::{ConnectionFactory, DefaultConnectionFactory};
use crate::properties::CONNECTION_FACTORY;
use crate::{Error, PolicyConfig, Result};

/// Creates a new factory instance.
pub type FactoryConstructor = fn() -> Arc<dyn ConnectionFactory>;

fn default_factory() -> Arc<dyn ConnectionFactory> {
    Arc::new(DefaultConnectionFactory::new())
}

/// Maps factory names to their constructors. Registration is cheap to read and may happen at
/// any time, e.g. during process startup.
pub struct FactoryRegistry {
    factories: ArcSwap<FxHashMap<String, FactoryConstructor>>,
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        let registry = FactoryRegistry::empty();
        registry.register(DefaultConnectionFactory::NAME, default_factory);
        registry
    }
}

impl FactoryRegistry {
    /// Creates a registry with only the default factory registered.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn empty() -> Self {
        FactoryRegistry {
            factories: ArcSwap::from_pointee(Default::default()),
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static FactoryRegistry {
        static GLOBAL: OnceLock<FactoryRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FactoryRegistry::new)
    }

    /// Registers a factory constructor, replacing any previously registered under the same name.
    pub fn register<S: Into<String>>(&self, name: S, constructor: FactoryConstructor) {
        let name = name.into();
        debug!(%name, "Registering connection factory.");

        self.factories.rcu(|factories| {
            let mut factories: FxHashMap<_, _> = (**factories).clone();
            factories.insert(name.clone(), constructor);
            factories
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.load().contains_key(name)
    }

    /// Creates a factory registered under given name, or the default factory if no name is
    /// given.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn ConnectionFactory>> {
        let Some(name) = name else {
            debug!("Using default connection factory.");
            return Ok(default_factory());
        };

        debug!(%name, "Resolving connection factory.");

        let constructor = self
            .factories
            .load()
            .get(name)
            .copied()
            .ok_or_else(|| Error::Resolution(name.to_string()))?;

        Ok(constructor())
    }

    /// Resolves the factory selected in given properties and uses it to create a session.
    pub async fn session_from_properties(
        &self,
        properties: &HashMap<String, String>,
    ) -> Result<Session> {
        let name = properties
            .get(CONNECTION_FACTORY)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty());

        let factory = self.resolve(name)?;
        let config = PolicyConfig::from_properties(properties, factory.properties())?;
        factory.create_session(&config).await
    }
}

/// Resolves a factory using the global registry.
pub fn resolve_factory(name: Option<&str>) -> Result<Arc<dyn ConnectionFactory>> {
    FactoryRegistry::global().resolve(name)
}

/// Creates a session out of properties using the global registry.
pub async fn session_from_properties(properties: &HashMap<String, String>) -> Result<Session> {
    FactoryRegistry::global()
        .session_from_properties(properties)
        .await
}
