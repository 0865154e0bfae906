//! classloom-core: the extension weaving engine.
//!
//! Independently developed plugins contribute tagged methods and constants
//! into each other's classes. At startup one weave pass synthesizes the
//! combined class bodies, persists them under the storage directory, and
//! records them in a class map; a pluggable resolver then serves the woven
//! unit whenever the class name is requested.

pub mod classmap;
pub mod collect;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod plugin;
pub mod resolver;
pub mod weave;

pub use classmap::ClassMap;
pub use collect::{ConstValue, ContributionSet};
pub use config::{ErrorMode, WeaveConfig};
pub use error::{ClassloomError, Result};
pub use host::PluginHost;
pub use plugin::{PluginRegistry, PluginUnit};
pub use resolver::{ClassPresence, ClassResolver, MapResolver, NothingPresent, UnitSink};
pub use weave::{ClassWeaver, SourceFile, SynthesizedUnit};
