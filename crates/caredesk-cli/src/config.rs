use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use caredesk_core::DEFAULT_API_URL;

use crate::cli::OutputFormat;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

impl ProfileConfig {
    pub fn output_format(&self) -> Result<Option<OutputFormat>> {
        self.format
            .as_deref()
            .map(parse_format)
            .transpose()
    }
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

/// Profiles stored in one TOML file, `~/.caredesk/config.toml` by default.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn open_default() -> Result<Self> {
        let dir = dirs::home_dir()
            .context("Cannot determine home directory")?
            .join(".caredesk");
        Ok(Self::at(dir.join("config.toml")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> Result<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let cfg: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", self.path.display()))?;
        Ok(cfg)
    }

    pub fn load_profile(&self, profile: &str) -> Result<ProfileConfig> {
        Ok(self.load_all()?.remove(profile).unwrap_or_default())
    }

    pub fn save_profile(&self, profile: &str, config: &ProfileConfig) -> Result<()> {
        let mut all = self.load_all()?;
        all.insert(profile.to_string(), config.clone());
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(&all)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Set one key of `profile`. Values are checked before anything is written.
    pub fn set(&self, profile: &str, key: &str, value: &str) -> Result<()> {
        let mut cfg = self.load_profile(profile)?;
        match key {
            "server" => {
                caredesk_core::ClientConfig::new(value)
                    .with_context(|| format!("Invalid server URL: {value}"))?;
                cfg.server = Some(value.to_string());
            }
            "format" => {
                parse_format(value)?;
                cfg.format = Some(value.to_string());
            }
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
        }
        self.save_profile(profile, &cfg)
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value {
        "json" => Ok(OutputFormat::Json),
        "table" => Ok(OutputFormat::Table),
        other => anyhow::bail!("Unknown format: {other}. Valid formats: json, table"),
    }
}

/// Server URL in priority order: `--server` / `CAREDESK_API_URL`, the
/// profile, then the default local API.
pub fn resolve_server(cli_server: Option<&str>, profile: &ProfileConfig) -> String {
    if let Some(s) = cli_server {
        return s.to_string();
    }
    if let Some(s) = &profile.server {
        return s.clone();
    }
    DEFAULT_API_URL.to_string()
}
