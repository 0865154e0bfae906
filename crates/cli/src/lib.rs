mod clear;
mod map;
mod weave;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "classloom",
    version,
    about = "Weaves plugin class extensions into synthesized units",
    long_about = "classloom scans an application's plugin tree for classes extended by \
                  sibling plugins, synthesizes the combined class bodies into the storage \
                  directory, and maintains the class map consulted at resolution time."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a weave pass over an application's plugin tree
    #[command(
        long_about = "Discovers plugins, collects tagged contributions between them, and \
                      synthesizes woven class units. With caching enabled the resulting \
                      class map is persisted for the next startup."
    )]
    Weave {
        /// Path to the application root. Defaults to the current directory.
        #[arg(value_name = "APP_PATH")]
        path: Option<PathBuf>,
        /// Discard any existing class map cache before weaving
        #[arg(long)]
        fresh: bool,
    },
    /// Print the persisted class map
    Map {
        /// Path to the application root. Defaults to the current directory.
        #[arg(value_name = "APP_PATH")]
        path: Option<PathBuf>,
    },
    /// Delete synthesized units and the class map cache
    Clear {
        /// Path to the application root. Defaults to the current directory.
        #[arg(value_name = "APP_PATH")]
        path: Option<PathBuf>,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = classloom_core::logging::init_logging("cli", true);

    match cli.command {
        Commands::Weave { path, fresh } => weave::run(app_root(path)?, fresh),
        Commands::Map { path } => map::run(app_root(path)?),
        Commands::Clear { path } => clear::run(app_root(path)?),
    }
}

fn app_root(path: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    })
}
