//! Locating the effective-area tables on disk.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the table root directory.
pub const TABLE_DIR_ENV: &str = "AEFF_TABLE_DIR";

/// Where the `<selection>/<bucket>/Aeff_<stream>.csv` tree lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub root: PathBuf,
}

impl TableConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read `AEFF_TABLE_DIR`, falling back to the tables bundled with the crate.
    pub fn from_env() -> Self {
        match env::var_os(TABLE_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::bundled(),
        }
    }

    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tables"))
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
