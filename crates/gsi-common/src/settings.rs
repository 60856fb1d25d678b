use std::{
    env,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::Context;
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::fs::canonicalize;

pub static CONFIG_INSTANCE: OnceLock<Settings> = OnceLock::new();

use crate::error::{GsiError, GsiResult};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Namespace to watch for game servers. Every namespace when unset.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Cluster-wide domain used when a game server carries no domain or fqdn annotation.
    #[serde(default)]
    pub base_domain: Option<String>,

    /// Issuer used for TLS game servers that do not name one.
    #[serde(default)]
    pub default_issuer: Option<String>,

    /// Reported as the component on recorded Kubernetes events.
    #[serde(default = "default_controller_name")]
    pub controller_name: String,

    #[serde(default = "default_max_concurrent_reconciles")]
    pub max_concurrent_reconciles: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            namespace: None,
            base_domain: None,
            default_issuer: None,
            controller_name: default_controller_name(),
            max_concurrent_reconciles: default_max_concurrent_reconciles(),
        }
    }
}

pub fn get_config() -> GsiResult<&'static Settings> {
    CONFIG_INSTANCE.get().ok_or(GsiError::NotInitialized)
}

pub fn set_config(settings: Settings) -> GsiResult<&'static Settings> {
    CONFIG_INSTANCE
        .set(settings)
        .map_err(|_| GsiError::AlreadyInitialized)?;
    get_config()
}

impl Settings {
    pub fn from_root(root: Option<PathBuf>) -> GsiResult<Self> {
        let curr_dir = std::env::current_dir().context("unable to get working directory")?;
        Self::load(root, &curr_dir)
    }

    /// Sources from lowest to highest priority: `config`, `config/default` and
    /// `config.<RUN_MODE>` under `base`, then `root` (a settings file, or a directory
    /// holding `config.*`), then `GSI_*` environment variables.
    pub fn load(root: Option<PathBuf>, base: &Path) -> GsiResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut s = config::Config::builder()
            .add_source(File::from(base.join("config")).required(false))
            .add_source(File::from(base.join("config/default")).required(false))
            .add_source(File::from(base.join(format!("config.{}", run_mode))).required(false));

        if let Some(root) = root {
            let root = canonicalize(root).context("unable to canonicalize root directory")?;
            if root.is_file() {
                s = s.add_source(File::from(root.as_path()));
            } else {
                s = s.add_source(File::from(root.join("config")).required(false));
            }
        }

        let s = s
            .add_source(
                Environment::with_prefix("GSI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg = s.try_deserialize()?;
        Ok(cfg)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_controller_name() -> String {
    "gameserver-ingress-controller".to_string()
}

fn default_max_concurrent_reconciles() -> usize {
    4
}
