//! Resolved build options

use std::path::{Path, PathBuf};

use crate::utils::resolve_path;

use super::Cli;

/// Options for a single run, built once from the command line.
///
/// Every path is absolute. Nothing mutates this after construction; the
/// compiler and the rule table borrow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Project root every relative path is resolved against
    pub root: PathBuf,

    /// Compilation entry point
    pub entry: PathBuf,

    /// Output directory, emptied before the first compilation
    pub out_dir: PathBuf,

    /// Production mode: no source maps, engine optimizations on
    pub production: bool,

    /// Stay resident and recompile on change
    pub watch: bool,
}

impl BuildOptions {
    pub fn resolve(cli: &Cli, root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entry: resolve_path(root, &cli.entry),
            out_dir: resolve_path(root, &cli.out_dir),
            production: cli.production,
            watch: cli.watch,
        }
    }

    pub fn mode(&self) -> &'static str {
        if self.production {
            "production"
        } else {
            "development"
        }
    }
}
