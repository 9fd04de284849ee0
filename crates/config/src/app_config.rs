// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use adm_fhe::FhePreset;
use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::info;

pub const DEFAULT_CONFIG_NAME: &str = "adm.config.yaml";
pub const ENV_PREFIX: &str = "ADM_";

/// Backing store for the ledger tables
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Everything is lost when the process exits
    Memory,
    #[default]
    Sled,
}

/// Who may request decryption of a record
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Open,
    SubmitterOnly,
}

/// The config actually used throughout the app
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Instance name. Scopes the default data dir.
    pub name: String,
    /// Data dir, defaults to `~/.local/share/adm/{name}`
    pub data_dir: Option<PathBuf>,
    /// Database file relative to the data dir
    pub db_file: PathBuf,
    pub storage: StorageKind,
    /// Address whose signatures are accepted as decryption proofs
    pub oracle_address: Option<Address>,
    pub fhe_preset: FhePreset,
    /// Drop repeated events on the bus. Off by default since the filter can drop a distinct
    /// event as a false positive.
    pub deduplicate_events: bool,
    /// `tracing` filter directive, eg. "info" or "adm_ledger=debug"
    pub log_level: String,
    pub decryption_policy: PolicyKind,
    /// The config file this was loaded from. Set by the loader.
    #[serde(skip)]
    pub found_config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            data_dir: None,
            db_file: PathBuf::from("db"),
            storage: StorageKind::Sled,
            oracle_address: None,
            fhe_preset: FhePreset::Secure8192,
            deduplicate_events: false,
            log_level: String::from("info"),
            decryption_policy: PolicyKind::Open,
            found_config_file: None,
        }
    }
}

impl AppConfig {
    /// Resolved data dir for this instance
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(OsDirs::data_dir()?.join(&self.name)),
        }
    }

    /// Database path. Absolute `db_file` values are used as given.
    pub fn db_file(&self) -> Result<PathBuf> {
        if self.db_file.is_absolute() {
            return Ok(self.db_file.clone());
        }
        Ok(path_clean::clean(self.data_dir()?.join(&self.db_file)))
    }

    pub fn use_in_mem_store(&self) -> bool {
        self.storage == StorageKind::Memory
    }
}

/// Load configuration from defaults, then the config file (if one exists), then `ADM_*`
/// environment variables. A missing file is not an error unless it was passed explicitly.
pub fn load_config(config_file: Option<&str>) -> Result<AppConfig> {
    let cwd = env::current_dir()?;
    let explicit = config_file.map(PathBuf::from);
    let resolved = resolve_config_path(
        find_in_parent,
        &cwd,
        &OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        explicit.as_deref(),
    );

    if explicit.is_some() && !resolved.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Configuration file not found: {}", resolved.display()),
        ))
        .context("Could not load configuration");
    }

    load_config_from(&resolved)
}

/// Extract configuration using the given file path. The file may be absent.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    let found = path.exists().then(|| path.to_path_buf());
    if let Some(file) = &found {
        info!("Loading configuration from {}", file.display());
        figment = figment.merge(Yaml::file(file));
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).only(&[
            "name",
            "data_dir",
            "db_file",
            "storage",
            "oracle_address",
            "fhe_preset",
            "deduplicate_events",
            "log_level",
            "decryption_policy",
        ]))
        .extract()
        .context("Could not parse configuration")?;

    config.found_config_file = found;
    Ok(config)
}

pub struct OsDirs;

impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("adm"))
            .ok_or_else(|| anyhow!("This OS does not provide a config dir"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join("adm"))
            .ok_or_else(|| anyhow!("This OS does not provide a data dir"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|jail| {
            let config = load_config_from(&jail.directory().join(DEFAULT_CONFIG_NAME))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.name, "default");
            assert_eq!(config.storage, StorageKind::Sled);
            assert_eq!(config.fhe_preset, FhePreset::Secure8192);
            assert_eq!(config.decryption_policy, PolicyKind::Open);
            assert!(!config.deduplicate_events);
            assert!(config.found_config_file.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_yaml_found_in_parent_dir() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_NAME,
                r#"
name: "campaigns"
data_dir: "/var/lib/adm"
db_file: "./ledger"
storage: "memory"
oracle_address: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
fhe_preset: "insecure512"
decryption_policy: "submitter_only"
"#,
            )?;
            jail.create_dir("nested/deeper")?;
            jail.change_dir("nested/deeper")?;

            let config = load_config(None).map_err(|e| e.to_string())?;

            assert_eq!(config.name, "campaigns");
            assert!(config.use_in_mem_store());
            assert_eq!(config.fhe_preset, FhePreset::Insecure512);
            assert_eq!(config.decryption_policy, PolicyKind::SubmitterOnly);
            assert_eq!(
                config.db_file().map_err(|e| e.to_string())?,
                PathBuf::from("/var/lib/adm/ledger")
            );
            assert_eq!(
                config.oracle_address,
                Some(alloy_primitives::address!(
                    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
                ))
            );
            assert!(config.found_config_file.is_some());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_NAME, "log_level: \"debug\"\nstorage: \"sled\"")?;
            jail.set_env("ADM_LOG_LEVEL", "warn");
            jail.set_env("ADM_STORAGE", "memory");

            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.log_level, "warn");
            assert_eq!(config.storage, StorageKind::Memory);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_NAME, "nmae: \"typo\"")?;
            assert!(load_config(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_not_found() -> Result<()> {
        let Err(err) = load_config(Some("/nope/adm.config.yaml")) else {
            anyhow::bail!("error expected");
        };
        let Some(e) = err.downcast_ref::<std::io::Error>() else {
            anyhow::bail!("io error expected");
        };
        assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        Ok(())
    }
}
