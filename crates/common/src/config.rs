use std::{fs::File, path::PathBuf, time::Duration};

use clap::Parser;
use payloadscan_types::SelectionPolicy;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to init logging: {0}")]
    Logging(String),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScanConfig {
    pub postgres: PostgresConfig,
    pub beacon_client: BeaconClientConfig,
    /// Tried in order: primary first, then fallbacks.
    #[serde(default)]
    pub execution_clients: Vec<ExecutionClientConfig>,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub logging: LoggingConfig,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub check_payload_value: VerifierConfig,
}

impl ScanConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let start_config = StartConfig::parse();
        Self::from_file(start_config.config)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let file = File::open(path.into())?;
        let config: ScanConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_clients.is_empty() {
            return Err(ConfigError::Invalid("at least one execution client is required".into()))
        }
        if self.check_payload_value.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()))
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostgresConfig {
    pub hostname: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    pub db_name: String,
    pub user: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BeaconClientConfig {
    pub url: Url,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExecutionClientConfig {
    pub url: Url,
}

#[derive(Default, Serialize, Deserialize, Clone, Debug)]
pub enum LoggingConfig {
    #[default]
    Console,
    File {
        dir_path: String,
        file_name: String,
    },
}

/// Settings of the payload value check run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifierConfig {
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub selection: SelectionPolicy,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Stop the whole batch on the first record that can't be verified. When disabled the
    /// record is skipped, left unverified and reported in the batch summary.
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            fail_fast: default_fail_fast(),
        }
    }
}

impl VerifierConfig {
    /// Single slot runs are processed by one worker.
    pub fn effective_concurrency(&self) -> usize {
        if self.selection.is_single_slot() {
            1
        } else {
            self.concurrency.max(1)
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
#[clap(name = "payloadscan")]
pub struct StartConfig {
    #[clap(long, default_value = "config.yml")]
    pub config: String,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_fail_fast() -> bool {
    true
}
