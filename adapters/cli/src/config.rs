//! Loads the simulation configuration from TOML.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use corridor_defence_engine::SimulationConfig;

/// Reads the configuration at `path`, or the reference game when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse(text: &str) -> Result<SimulationConfig> {
    Ok(toml::from_str(text)?)
}
