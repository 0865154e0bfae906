use classloom_core::{ClassMap, WeaveConfig};
use std::path::PathBuf;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

pub fn run(root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = WeaveConfig::from_env(&root)?;
    let cache = config.cache_file();

    match ClassMap::load(&cache)? {
        Some(map) if !map.is_empty() => {
            let rows: Vec<MappingRow> = map
                .iter()
                .map(|(class, path)| MappingRow {
                    class: class.to_string(),
                    unit: path.display().to_string(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Some(_) => println!("Class map at {} is empty.", cache.display()),
        None => println!(
            "No class map cache at {}. Run `classloom weave` first.",
            cache.display()
        ),
    }

    Ok(())
}
