use classloom_core::{PluginHost, WeaveConfig};
use std::path::PathBuf;
use tracing::info;

pub fn run(root: PathBuf, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = WeaveConfig::from_env(&root)?;
    if fresh {
        let cache = config.cache_file();
        if cache.exists() {
            std::fs::remove_file(&cache)?;
        }
    }

    info!(
        "Weaving plugins under: {}...",
        config.plugin_directory.display()
    );

    let host = PluginHost::bootstrap(config)?;

    info!("Weave complete!");
    info!("Plugins: {}", host.registry().len());
    info!("Woven classes: {}", host.class_map().len());
    for (class, _) in host.class_map().iter().take(10) {
        info!(" - {class}");
    }

    Ok(())
}
