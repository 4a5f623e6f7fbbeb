use anyhow::{Context, Result};
use coparent_core::Parent;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Directory the event store lives in
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Parent assigned to imported events unless --parent overrides it
    #[serde(default = "default_parent")]
    pub default_parent: Parent,

    /// IANA zone name new events default to
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            default_parent: default_parent(),
            time_zone: default_time_zone(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.local/share/coparent".to_string()
}

fn default_parent() -> Parent {
    Parent::A
}

fn default_time_zone() -> String {
    coparent_core::event::DEFAULT_TIME_ZONE.to_string()
}

/// Get the config file path (~/.config/coparent/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("coparent");
    Ok(config_dir.join("config.toml"))
}

/// Load config from ~/.config/coparent/config.toml. A missing file is
/// fine; everything has a default.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Path of the JSON event store (<data_dir>/events.json)
pub fn events_path(config: &Config) -> PathBuf {
    expand_path(&config.data_dir).join("events.json")
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
