// toolshape-cli/src/config.rs

//! Finds and loads `Toolshape.toml`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toolshape_core::config::CONFIG_FILE_NAME;
use toolshape_core::ToolshapeConfig;
use tracing::{debug, info};

/// Walks up from `start` to the filesystem root looking for the config file.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }
        current = current.parent()?;
    }
}

/// Loads the nearest config above `start`, or the defaults when there is
/// none. A config file that exists but doesn't parse is an error.
pub fn load_config(start: &Path) -> Result<(ToolshapeConfig, Option<PathBuf>)> {
    let Some(config_path) = find_config_file(start) else {
        debug!(start = %start.display(), "No {} found; using defaults", CONFIG_FILE_NAME);
        return Ok((ToolshapeConfig::default(), None));
    };
    info!("Found configuration file at: {:?}", config_path);
    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
    let config = ToolshapeConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse or validate {:?}", config_path))?;
    Ok((config, Some(config_path)))
}
