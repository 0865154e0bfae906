use classloom_core::WeaveConfig;
use std::fs;
use std::path::Path;

/// Default configuration rooted at a scratch directory.
pub fn config_for(root: &Path) -> WeaveConfig {
    WeaveConfig::for_root(root)
}

/// Creates a plugin directory with its required entry class.
pub fn write_plugin(root: &Path, name: &str) {
    let dir = root.join("app/Plugins").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{name}Plugin.php")),
        format!("<?php\n\nclass {name}Plugin\n{{\n}}\n"),
    )
    .unwrap();
}

/// Writes a file at a path relative to the named plugin's root.
pub fn write_file(root: &Path, plugin: &str, relative: &str, contents: &str) {
    let path = root.join("app/Plugins").join(plugin).join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub const CART: &str = r#"<?php

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
