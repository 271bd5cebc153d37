use homecat::Config;
use std::path::{Path, PathBuf};

/// Path of the fixture config next to this file
pub fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("homecat.yml")
}

/// Load the fixture config
///
/// It has a couple of top level apps and three scopes of fake workloads.
pub fn load() -> Config {
    Config::from_path(&fixture()).unwrap()
}
