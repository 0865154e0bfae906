mod common;

use classloom_core::{ClassMap, PluginHost, PluginRegistry};
use common::{CART, config_for, write_file, write_plugin};
use std::fs;
use tempfile::tempdir;

const CART_CLASS: &str = "App\\Plugins\\Shop\\Models\\Cart";

fn seeded_tree(root: &std::path::Path) {
    write_plugin(root, "Shop");
    write_plugin(root, "Audit");
    write_file(root, "Shop", "Models/Cart.php", CART);
    write_file(
        root,
        "Audit",
        "Models/Cart.php",
        "<?php\nclass Cart\n{\n    /** @add */\n    public function audited()\n    {\n        return true;\n    }\n}\n",
    );
}

#[test]
fn store_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage/plugins/classmap.json");

    let mut map = ClassMap::new();
    map.insert(CART_CLASS, dir.path().join("unit_a.php"));
    map.insert("App\\Plugins\\Shop\\Models\\Order", dir.path().join("unit_b.php"));
    map.store(&path).unwrap();

    let loaded = ClassMap::load(&path).unwrap().unwrap();
    assert_eq!(loaded, map);
}

#[test]
fn missing_or_garbled_cache_reads_as_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("classmap.json");
    assert!(ClassMap::load(&path).unwrap().is_none());

    fs::write(&path, "{not json").unwrap();
    assert!(ClassMap::load(&path).unwrap().is_none());
}

#[test]
fn store_is_atomic_and_human_diffable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("classmap.json");

    let mut map = ClassMap::new();
    map.insert(CART_CLASS, "/tmp/unit.php");
    map.store(&path).unwrap();

    // no temporary file left behind
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path() != path)
        .collect();
    assert!(leftovers.is_empty());

    // pretty JSON, one mapping per line
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.lines().count() > 1);
    assert!(raw.contains("App\\\\Plugins\\\\Shop\\\\Models\\\\Cart"));
}

#[test]
fn bootstrap_restores_the_map_from_cache() {
    let dir = tempdir().unwrap();
    seeded_tree(dir.path());

    let first = PluginHost::bootstrap(config_for(dir.path())).unwrap();
    assert!(first.class_map().contains(CART_CLASS));

    // remove the plugin sources; a second bootstrap must come from cache
    fs::remove_dir_all(dir.path().join("app/Plugins")).unwrap();
    let second = PluginHost::bootstrap(config_for(dir.path())).unwrap();
    assert_eq!(second.class_map(), first.class_map());
}

#[test]
fn disabled_cache_always_reweaves_and_writes_nothing() {
    let dir = tempdir().unwrap();
    seeded_tree(dir.path());

    let mut config = config_for(dir.path());
    config.cache_enabled = false;

    let host = PluginHost::bootstrap(config.clone()).unwrap();
    assert!(host.class_map().contains(CART_CLASS));
    assert!(!config.cache_file().exists());
}

#[test]
fn retried_pass_never_maps_a_missing_unit() {
    let dir = tempdir().unwrap();
    seeded_tree(dir.path());

    let config = config_for(dir.path());
    let registry = PluginRegistry::discover(&config).unwrap();
    let weaver = classloom_core::ClassWeaver::new(&config, &classloom_core::NothingPresent);
    let map = weaver.weave_all(&registry).unwrap();

    // simulate a crash that lost a unit after registration
    let unit = map.get(CART_CLASS).unwrap().to_path_buf();
    fs::remove_file(&unit).unwrap();
    fs::remove_file(config.cache_file()).unwrap();

    // a from-scratch retry republishes unit and mapping together
    let map = weaver.weave_all(&registry).unwrap();
    for (_, path) in map.iter() {
        assert!(path.exists(), "mapped unit {} must exist", path.display());
    }
    assert!(map.contains(CART_CLASS));
}
