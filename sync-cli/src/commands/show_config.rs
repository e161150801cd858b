//! Show the effective configuration.

use anyhow::{Context, Result};

use crate::config::{default_config_path, CliConfig};

/// Run the config command.
pub fn run(config: &CliConfig) -> Result<()> {
    if let Some(path) = default_config_path() {
        println!("# default config file: {}", path.display());
    }
    let out = toml::to_string_pretty(config).context("Failed to encode configuration")?;
    print!("{}", out);
    Ok(())
}
