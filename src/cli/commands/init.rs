//! Config file bootstrap command.

use std::path::{Path, PathBuf};

use crate::config::{self, Config, ConfigError};

/// Write `config` (defaults plus any overrides) so it can be edited by hand
pub fn cmd_init(config: &Config, path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = write_config(config, path, force)?;
    println!("Wrote config to {}", path.display());
    Ok(())
}

fn write_config(
    config: &Config,
    path: Option<&Path>,
    force: bool,
) -> Result<PathBuf, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(ConfigError::NoConfigDir)?,
    };

    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path));
    }

    config::save_to(config, &path)?;
    Ok(path)
}
