//! Class-name resolution over a frozen class map.

use crate::classmap::ClassMap;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Probe for class names the host can already resolve through its normal
/// lookup. Targets reported as defined are excluded from synthesis.
pub trait ClassPresence {
    fn is_defined(&self, class_name: &str) -> bool;
}

/// Presence probe for hosts with no pre-existing class table; nothing is
/// ever reported as defined.
#[derive(Debug, Default, Clone, Copy)]
pub struct NothingPresent;

impl ClassPresence for NothingPresent {
    fn is_defined(&self, _class_name: &str) -> bool {
        false
    }
}

/// The host extension point: invoked when a class name misses in the
/// host's own resolution mechanism.
pub trait ClassResolver {
    /// Returns true when the class was (or already had been) loaded from a
    /// mapped unit; false lets the host's normal failure path proceed.
    fn resolve(&self, class_name: &str) -> bool;
}

/// Receives the source of a mapped unit. What "loading" means is
/// host-specific: hand the text to an interpreter, register it with an
/// autoloader bridge, stage it for a build step.
pub trait UnitSink: Send + Sync {
    fn load_unit(&self, class_name: &str, path: &Path, source: &str);
}

/// Resolver over a frozen class map.
///
/// Redefining a class is an error in most target runtimes, so each mapped
/// unit reaches the sink at most once; resolving the same name again is a
/// successful no-op.
pub struct MapResolver {
    map: Arc<ClassMap>,
    sink: Box<dyn UnitSink>,
    loaded: Mutex<HashSet<String>>,
}

impl MapResolver {
    pub fn new(map: Arc<ClassMap>, sink: Box<dyn UnitSink>) -> Self {
        Self {
            map,
            sink,
            loaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.map
    }
}

impl ClassResolver for MapResolver {
    fn resolve(&self, class_name: &str) -> bool {
        let Some(path) = self.map.get(class_name) else {
            return false;
        };
        let mut loaded = self.loaded.lock().expect("resolver lock poisoned");
        if loaded.contains(class_name) {
            debug!(class = %class_name, "unit already loaded");
            return true;
        }
        match fs::read_to_string(path) {
            Ok(source) => {
                self.sink.load_unit(class_name, path, &source);
                loaded.insert(class_name.to_string());
                true
            }
            Err(err) => {
                warn!("mapped unit {} is unreadable: {err}", path.display());
                false
            }
        }
    }
}
