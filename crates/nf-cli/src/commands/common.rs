//! Shared helpers for command implementations

use anyhow::Result;
use std::path::{Path, PathBuf};

use nf_core::config::Config;

use crate::cli::GlobalArgs;

/// Load the project configuration and return it with the project root.
pub fn load_config(global: &GlobalArgs) -> Result<(Config, PathBuf)> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::load_from_dir(&root)?,
    };
    log::debug!("loaded config for project '{}'", config.name);
    Ok((config, root))
}
