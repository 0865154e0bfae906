//! The weave pass: candidate discovery, overlay collection, synthesis, and
//! class map registration.

use crate::classmap::ClassMap;
use crate::collect::{self, ContributionSet};
use crate::config::WeaveConfig;
use crate::error::Result;
use crate::plugin::{PluginRegistry, PluginUnit};
use crate::resolver::ClassPresence;
use classloom_php::{ClassShape, declares_class, method_statements};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A source file found in a plugin tree, recomputed each scan.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the owning plugin's root.
    pub relative: PathBuf,
    pub declares_class: bool,
}

/// The single derived artifact for a woven target class. Superseded on
/// re-weave, never observed half-written.
#[derive(Debug, Clone)]
pub struct SynthesizedUnit {
    pub class_name: String,
    pub source_text: String,
    pub cache_path: PathBuf,
}

/// Runs the weave: for every plugin's class files, gathers contributions
/// from sibling plugins' overlay files and synthesizes combined units.
pub struct ClassWeaver<'a> {
    config: &'a WeaveConfig,
    presence: &'a dyn ClassPresence,
}

impl<'a> ClassWeaver<'a> {
    pub fn new(config: &'a WeaveConfig, presence: &'a dyn ClassPresence) -> Self {
        Self { config, presence }
    }

    /// One full weave pass over every plugin.
    ///
    /// The resulting map is persisted when caching is enabled; a failed
    /// persist is fatal for the pass since a stale cache would silently
    /// break later runs. Every per-file failure degrades to a logged skip.
    pub fn weave_all(&self, registry: &PluginRegistry) -> Result<ClassMap> {
        let mut map = ClassMap::new();
        for plugin in registry.iter() {
            self.weave_plugin(plugin, registry, &mut map);
        }
        if self.config.cache_enabled {
            map.store(&self.config.cache_file())?;
        }
        info!(classes = map.len(), "weave pass complete");
        Ok(map)
    }

    /// Weaves one plugin's class files against the full registry.
    ///
    /// Public so embedders can re-weave a single plugin; note the registry
    /// must still hold every plugin, since overlays come from siblings.
    pub fn weave_plugin(&self, plugin: &PluginUnit, registry: &PluginRegistry, map: &mut ClassMap) {
        for file in self.scan_plugin(plugin) {
            if !file.declares_class {
                continue;
            }
            let class_name = self.class_name_for(plugin, &file.relative);
            if self.presence.is_defined(&class_name) {
                debug!(class = %class_name, "already resolvable, skipping");
                continue;
            }

            let mut contributions = ContributionSet::default();
            for overlay in self.overlays_for(plugin, &file.relative, registry) {
                match fs::read_to_string(&overlay) {
                    Ok(source) => contributions.merge(collect::collect(&source)),
                    Err(err) => warn!("unreadable overlay {}: {err}", overlay.display()),
                }
            }
            if contributions.is_empty() {
                continue;
            }

            let original = match fs::read_to_string(&file.path) {
                Ok(source) => source,
                Err(err) => {
                    warn!("unreadable class file {}: {err}", file.path.display());
                    continue;
                }
            };
            let Some(source_text) = synthesize(&original, &contributions) else {
                warn!(class = %class_name, "target does not parse into a weavable class, skipping");
                continue;
            };

            let unit = SynthesizedUnit {
                cache_path: self.storage_path_for(&class_name),
                class_name,
                source_text,
            };
            // Unit write and map insert are one coupled step: the entry is
            // only published once the file is fully on disk.
            if let Err(err) = write_unit(&unit.cache_path, &unit.source_text) {
                warn!(
                    "could not write synthesized unit {}: {err}",
                    unit.cache_path.display()
                );
                continue;
            }
            debug!(class = %unit.class_name, unit = %unit.cache_path.display(), "synthesized");
            map.insert(unit.class_name, unit.cache_path);
        }
    }

    /// All `.php` files under a plugin root, flagged by whether they
    /// declare a class. Walk order is name-sorted so passes are
    /// deterministic.
    fn scan_plugin(&self, plugin: &PluginUnit) -> Vec<SourceFile> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&plugin.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("php") {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&plugin.root) else {
                continue;
            };
            let declares = fs::read_to_string(path)
                .map(|source| declares_class(&source))
                .unwrap_or(false);
            files.push(SourceFile {
                path: path.to_path_buf(),
                relative: relative.to_path_buf(),
                declares_class: declares,
            });
        }
        files
    }

    /// Derives the fully-qualified class name from the file's place in the
    /// plugin tree: the plugin-directory prefix becomes the base namespace,
    /// path separators become `\`, and the extension is dropped.
    fn class_name_for(&self, plugin: &PluginUnit, relative: &Path) -> String {
        let mut name = self.config.plugin_namespace.clone();
        name.push('\\');
        name.push_str(&plugin.name);
        for component in relative.components() {
            name.push('\\');
            name.push_str(&component.as_os_str().to_string_lossy());
        }
        match name.strip_suffix(".php") {
            Some(stripped) => stripped.to_string(),
            None => name,
        }
    }

    /// Overlay files are found purely by relative-path equality: the same
    /// relative path under every *other* plugin's root, visited in
    /// discovery order.
    fn overlays_for(
        &self,
        plugin: &PluginUnit,
        relative: &Path,
        registry: &PluginRegistry,
    ) -> Vec<PathBuf> {
        registry
            .iter()
            .filter(|other| other.name != plugin.name)
            .map(|other| other.root.join(relative))
            .filter(|candidate| candidate.is_file())
            .collect()
    }

    /// Cache location for a synthesized unit: namespace components joined
    /// with underscores under the storage directory.
    fn storage_path_for(&self, class_name: &str) -> PathBuf {
        let flat = class_name.replace('\\', "_");
        self.config.storage_directory.join(format!("{flat}.php"))
    }
}

/// Builds the synthesized class text: the original body with appended
/// methods, statements inserted ahead of prepend targets' first top-level
/// `return`, and contributed constants after the last existing constant
/// (or the opening brace when there are none).
pub(crate) fn synthesize(original: &str, contributions: &ContributionSet) -> Option<String> {
    let shape = ClassShape::parse(original)?;
    let lines: Vec<&str> = original.lines().collect();

    let mut seen = HashSet::new();
    for method in &contributions.append {
        if !seen.insert(method.name.as_str()) {
            warn!(
                method = %method.name,
                "same-named method contributed more than once, both included"
            );
        }
    }

    // Insertion points computed against the original line numbering; the
    // output is assembled in one forward pass so nothing shifts underneath.
    let mut prepend_at: Vec<(usize, &str)> = Vec::new();
    for contribution in &contributions.prepend {
        let Some(member) = shape.member(&contribution.name) else {
            warn!(
                method = %contribution.name,
                "@beforeReturn target not present in class, dropped"
            );
            continue;
        };
        match method_statements(original, member)
            .iter()
            .find(|s| s.is_return)
        {
            Some(ret) => prepend_at.push((ret.span.start, contribution.body.as_str())),
            None => warn!(
                method = %contribution.name,
                "@beforeReturn target has no top-level return, dropped"
            ),
        }
    }

    let const_after = shape.last_const_line.unwrap_or(shape.open_brace_line);

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 16);
    for (idx, line) in lines.iter().enumerate().take(shape.close_brace_line - 1) {
        let line_no = idx + 1;
        for (at, body) in &prepend_at {
            if *at == line_no {
                out.extend(body.lines().map(String::from));
            }
        }
        out.push((*line).to_string());
        if line_no == const_after {
            for (name, value) in &contributions.constants {
                out.push(format!("    const {name} = {};", value.render()));
            }
        }
    }

    for method in &contributions.append {
        out.push(String::new());
        out.extend(method.text.lines().map(String::from));
    }
    out.push("}".to_string());

    let mut text = out.join("\n");
    text.push('\n');
    Some(text)
}

fn write_unit(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("php.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;

    const TARGET: &str = r#"<?php

namespace App\Plugins\Shop\Models;

class Cart
{
    public function total()
    {
        $sum = $this->subtotal();
        return $sum;
    }
}
"#;

    #[test]
    fn prepend_lands_before_the_return() {
        let overlay = "<?php\nclass Cart\n{\n    /** @beforeReturn */\n    public function total()\n    {\n        $sum += $this->shipping();\n        return 0;\n    }\n}\n";
        let woven = synthesize(TARGET, &collect(overlay)).unwrap();
        let shipping = woven.find("$this->shipping()").unwrap();
        let subtotal = woven.find("$this->subtotal()").unwrap();
        let ret = woven.find("return $sum;").unwrap();
        assert!(subtotal < shipping && shipping < ret);
    }

    #[test]
    fn constants_follow_the_opening_brace_when_none_exist() {
        let overlay =
            "<?php\nclass Cart\n{\n    const FLAG = true;\n    const ITEMS = [1, 2, 3];\n}\n";
        let woven = synthesize(TARGET, &collect(overlay)).unwrap();
        let lines: Vec<&str> = woven.lines().collect();
        assert_eq!(lines[5], "{");
        assert_eq!(lines[6], "    const FLAG = true;");
        assert_eq!(lines[7], "    const ITEMS = [1,2,3];");
    }

    #[test]
    fn appends_come_before_the_final_brace() {
        let overlay = "<?php\nclass Cart\n{\n    /** @add */\n    public function coupons()\n    {\n        return [];\n    }\n}\n";
        let woven = synthesize(TARGET, &collect(overlay)).unwrap();
        assert!(woven.trim_end().ends_with('}'));
        let body = woven.find("public function coupons()").unwrap();
        let original_close = woven.find("return $sum;").unwrap();
        assert!(body > original_close);
        assert!(declares_class(&woven));
        assert!(ClassShape::parse(&woven).is_some(), "woven unit stays balanced");
    }

    #[test]
    fn prepend_without_matching_target_changes_nothing_else() {
        let overlay = "<?php\nclass Cart\n{\n    /** @beforeReturn */\n    public function missing()\n    {\n        $x = 1;\n        return 0;\n    }\n}\n";
        let woven = synthesize(TARGET, &collect(overlay));
        // the set is non-empty, so synthesis happens, but the dropped
        // contribution leaves the body untouched
        let woven = woven.unwrap();
        assert!(!woven.contains("$x = 1;"));
        assert!(woven.contains("return $sum;"));
    }
}
