use crate::classmap::ClassMap;
use crate::config::WeaveConfig;
use crate::error::Result;
use crate::plugin::PluginRegistry;
use crate::resolver::{ClassPresence, MapResolver, NothingPresent, UnitSink};
use crate::weave::ClassWeaver;
use std::sync::Arc;
use tracing::{debug, info};

/// Owned bootstrap context for the weave lifecycle.
///
/// Bootstrapping discovers the plugin set, restores the class map from
/// cache (or runs a fresh weave pass), and freezes the result. Construct
/// exactly once at startup, before anything resolves class names; the map
/// never changes afterwards, so resolvers built from this context may be
/// shared across threads without synchronization.
pub struct PluginHost {
    config: WeaveConfig,
    registry: PluginRegistry,
    class_map: Arc<ClassMap>,
}

impl PluginHost {
    pub fn bootstrap(config: WeaveConfig) -> Result<Self> {
        Self::bootstrap_with(config, &NothingPresent)
    }

    /// Bootstraps with an explicit presence probe for hosts that already
    /// have some class names defined.
    pub fn bootstrap_with(config: WeaveConfig, presence: &dyn ClassPresence) -> Result<Self> {
        let registry = PluginRegistry::discover(&config)?;
        info!(plugins = registry.len(), "plugins discovered");

        let cached = if config.cache_enabled {
            ClassMap::load(&config.cache_file())?
        } else {
            None
        };
        let class_map = match cached {
            Some(map) => {
                debug!(classes = map.len(), "class map restored from cache");
                map
            }
            None => ClassWeaver::new(&config, presence).weave_all(&registry)?,
        };

        Ok(Self {
            config,
            registry,
            class_map: Arc::new(class_map),
        })
    }

    pub fn config(&self) -> &WeaveConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.class_map
    }

    /// Builds a resolver over the frozen class map. Install it into the
    /// host's resolution mechanism once, after bootstrap, before any code
    /// asks for a woven class.
    pub fn resolver(&self, sink: Box<dyn UnitSink>) -> MapResolver {
        MapResolver::new(Arc::clone(&self.class_map), sink)
    }
}
