use classloom_core::WeaveConfig;
use std::path::PathBuf;
use tracing::info;

pub fn run(root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = WeaveConfig::from_env(&root)?;
    let storage = &config.storage_directory;

    if !storage.exists() {
        info!("Nothing to clear at: {}", storage.display());
        return Ok(());
    }

    info!("Clearing synthesized units at: {}...", storage.display());
    let mut removed = 0usize;
    for entry in std::fs::read_dir(storage)? {
        let entry = entry?;
        let path = entry.path();
        if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("php") | Some("json") | Some("tmp")
        ) {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    info!("Removed {removed} files.");

    Ok(())
}
