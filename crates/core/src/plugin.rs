use crate::config::{ErrorMode, WeaveConfig};
use crate::error::{ClassloomError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A discovered plugin.
///
/// The id is assigned sequentially at discovery and stays stable for the
/// session; the name doubles as the registry key and must be unique.
#[derive(Debug, Clone)]
pub struct PluginUnit {
    pub id: u32,
    pub name: String,
    pub root: PathBuf,
}

/// The set of all plugins, in discovery order.
///
/// Overlay discovery is cross-plugin, so the full set must be known before
/// any single plugin is woven; iteration order here is the accumulation
/// order for contributions.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginUnit>,
}

impl PluginRegistry {
    /// Enumerates the depth-1 directories of the configured plugin
    /// directory, in name order, and checks each for its entry class file
    /// `<Dir>/<Dir><suffix>.php`. Violations are handled per the
    /// configured error mode.
    pub fn discover(config: &WeaveConfig) -> Result<Self> {
        let dir = &config.plugin_directory;
        if !dir.exists() {
            if config.auto_create_directory {
                fs::create_dir_all(dir)?;
            } else {
                return match config.error_mode {
                    ErrorMode::Abort => Err(ClassloomError::Config(format!(
                        "plugin directory {} does not exist",
                        dir.display()
                    ))),
                    ErrorMode::Log => {
                        warn!(
                            "plugin directory {} does not exist, nothing to discover",
                            dir.display()
                        );
                        Ok(Self::default())
                    }
                    ErrorMode::Silent => Ok(Self::default()),
                };
            }
        }

        let mut roots: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        roots.sort();

        let mut plugins: Vec<PluginUnit> = Vec::new();
        for root in roots {
            let name = match root.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            match check_entry_class(&root, &name, &config.plugin_class_suffix) {
                Ok(()) => {
                    let id = plugins.len() as u32 + 1;
                    debug!(plugin = %name, id, "registered plugin");
                    plugins.push(PluginUnit { id, name, root });
                }
                Err(reason) => match config.error_mode {
                    ErrorMode::Abort => return Err(ClassloomError::Plugin(reason)),
                    ErrorMode::Log => warn!("{reason}, skipping plugin"),
                    ErrorMode::Silent => {}
                },
            }
        }

        Ok(Self { plugins })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginUnit> {
        self.plugins.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PluginUnit> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn check_entry_class(root: &Path, name: &str, suffix: &str) -> std::result::Result<(), String> {
    let entry = root.join(format!("{name}{suffix}.php"));
    let source = match fs::read_to_string(&entry) {
        Ok(source) => source,
        Err(_) => {
            return Err(format!("plugin {name} needs a {name}{suffix} class"));
        }
    };
    if !classloom_php::declares_class(&source) {
        return Err(format!(
            "plugin {name} entry file {} does not declare a class",
            entry.display()
        ));
    }
    Ok(())
}
