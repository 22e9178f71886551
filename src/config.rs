use serde::{Deserialize, Serialize};
use std::fs;

use crate::depository::AccountType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Public (verification-facing) listener
    pub http: ListenerConfig,
    /// Privileged admin listener; never share a port with `http`
    pub admin: ListenerConfig,
    pub postgres_url: String,
    pub ach: AchConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    pub odfi: OdfiConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
}

impl ListenerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AchConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Ledger integration; disabled means no ledger postings are mirrored
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccountsConfig {
    pub enabled: bool,
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:8085".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Operator settlement account used as the verification counterparty
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OdfiConfig {
    pub account_number: String,
    pub routing_number: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default = "default_odfi_identification")]
    pub identification: String,
    #[serde(default = "default_odfi_name")]
    pub holder: String,
    #[serde(default = "default_odfi_name")]
    pub bank_name: String,
}

impl OdfiConfig {
    /// Apply `ODFI_IDENTIFICATION`, `ODFI_HOLDER` and `ODFI_BANK_NAME` overrides
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("ODFI_IDENTIFICATION") {
            self.identification = v;
        }
        if let Some(v) = non_empty("ODFI_HOLDER") {
            self.holder = v;
        }
        if let Some(v) = non_empty("ODFI_BANK_NAME") {
            self.bank_name = v;
        }
    }
}

/// Background merge-and-upload sweep
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_size: usize,
    pub outbound_dir: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 600,
            batch_size: 100,
            outbound_dir: "./storage/outbound".to_string(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_odfi_identification() -> String {
    "001".to_string()
}

fn default_odfi_name() -> String {
    "Moov, Inc".to_string()
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", config_path, e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = serde_yaml::from_str(content)?;
        config.odfi = config.odfi.with_env_overrides();
        if config.http.port == config.admin.port && config.http.host == config.admin.host {
            anyhow::bail!("admin listener must not share the public listener address");
        }
        Ok(config)
    }
}
