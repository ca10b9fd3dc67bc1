//! Helpers for tests that need plugins on disk

use std::path::{Path, PathBuf};

/// The bundled `test-plugin` fixture folder
pub fn test_plugin_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test-plugin")
}

/// Create `root/<folder>/init.lua` containing `script`
pub fn write_plugin(root: &Path, folder: &str, script: &str) -> PathBuf {
    let dir = root.join(folder);
    std::fs::create_dir_all(&dir).expect("create plugin folder");
    std::fs::write(dir.join("init.lua"), script).expect("write init.lua");
    dir
}

/// Write `plugin.yaml` into an existing plugin folder
pub fn write_manifest(plugin_dir: &Path, yaml: &str) {
    std::fs::write(plugin_dir.join("plugin.yaml"), yaml).expect("write plugin.yaml");
}
