/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load Syn-Patch-Core configuration from TOML with sane
    defaults for the patch service, retry policy and paths.

  Security / Safety Notes:
    Configuration never stores passwords; credentials are
    supplied per invocation.

  Dependencies:
    serde + toml for parsing, dirs for XDG locations.

  Operational Scope:
    Read once at startup; the resulting values are immutable
    for the lifetime of the engine.

  Revision History:
    2026-10-17 COD  Authored configuration loader.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Every field defaulted; an absent file is valid
    - Environment overrides applied after file parsing
============================================================*/

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SynpatchError};
use crate::installer::{InstallerCatalog, Product};
use crate::retry::RetryPolicy;

const ENV_RETRY_MAX: &str = "SYNPATCH_RETRY_MAX";
const ENV_RETRY_INTERVAL: &str = "SYNPATCH_RETRY_INTERVAL";

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SynpatchConfig {
    pub remote: RemoteConfig,
    pub paths: PathsConfig,
    /// Product name (e.g. `OHS`) to the version its releases are published under.
    pub base_versions: BTreeMap<String, String>,
}

/// Patch service connection and retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub max_retries: usize,
    pub retry_interval_ms: u64,
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://updates.oracle.com".to_string(),
            timeout: 60,
            max_retries: 10,
            retry_interval_ms: 500,
            user_agent: "Syn-Patch-Core/0.3 (linux)".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_interval_ms),
        )
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_dir: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl SynpatchConfig {
    /// Load from `path`, or the default location when absent. A missing default file yields defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(explicit) => Self::load(explicit)?,
            None => match default_config_path() {
                Some(default) if default.exists() => Self::load(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            SynpatchError::Config(format!("Failed to read config {}: {err}", path.display()))
        })?;
        Self::parse(&text)
            .map_err(|err| SynpatchError::Config(format!("{} ({})", err, path.display())))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|err| SynpatchError::Config(format!("Invalid configuration: {err}")))
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_RETRY_MAX) {
            self.remote.max_retries = value.trim().parse().map_err(|err| {
                SynpatchError::Config(format!("{ENV_RETRY_MAX}=`{value}` is not a count: {err}"))
            })?;
        }
        if let Some(value) = lookup(ENV_RETRY_INTERVAL) {
            self.remote.retry_interval_ms = value.trim().parse().map_err(|err| {
                SynpatchError::Config(format!(
                    "{ENV_RETRY_INTERVAL}=`{value}` is not milliseconds: {err}"
                ))
            })?;
        }
        Ok(())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.paths
            .log_dir
            .clone()
            .unwrap_or_else(|| state_dir().join("logs"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.paths
            .manifest
            .clone()
            .unwrap_or_else(|| state_dir().join("patches.json"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.paths.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("syn-patch")
        })
    }

    /// Installer catalog with the configured base version overrides.
    pub fn installer_catalog(&self) -> Result<InstallerCatalog> {
        let mut overrides = BTreeMap::new();
        for (name, version) in &self.base_versions {
            let product: Product = name.parse()?;
            overrides.insert(product, version.clone());
        }
        Ok(InstallerCatalog::new(overrides))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("syn-patch").join("config.toml"))
}

fn state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("syn-patch")
}
