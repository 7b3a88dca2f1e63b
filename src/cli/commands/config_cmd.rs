//! Configuration display command.

use console::style;

use crate::cli::icons::dim_arrow;
use crate::config::Config;

/// Print the effective configuration as TOML.
pub fn cmd_config(config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults (no config file found)".to_string());
    eprintln!("{} Source: {}", dim_arrow(), style(source).dim());

    print!("{}", config.to_toml()?);
    Ok(())
}
