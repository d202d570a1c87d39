// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ChainConfig, ContractAddresses};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "cipherbridge.config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub compute: ComputeConfig,
    pub timeouts: TimeoutsConfig,
}

/// Location of the cipher-compute service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComputeConfig {
    pub base_url: String,
}

impl ComputeConfig {
    pub fn base_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.base_url).context("Failed to parse compute service base_url")
    }
}

/// Ledger confirmation waits and cipher-compute calls are bounded by
/// distinct timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutsConfig {
    pub ledger_confirmation_secs: u64,
    pub compute_secs: u64,
}

impl TimeoutsConfig {
    pub fn ledger_confirmation(&self) -> Duration {
        Duration::from_secs(self.ledger_confirmation_secs)
    }

    pub fn compute(&self) -> Duration {
        Duration::from_secs(self.compute_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig {
                name: "hardhat".to_string(),
                rpc_url: "http://localhost:8545".to_string(),
                contracts: ContractAddresses {
                    client_registry: String::new(),
                    bank_registry: String::new(),
                    data_storage: String::new(),
                    task_manager: String::new(),
                },
                chain_id: None,
            },
            compute: ComputeConfig {
                base_url: "http://localhost:8000".to_string(),
            },
            timeouts: TimeoutsConfig {
                ledger_confirmation_secs: 30,
                compute_secs: 20,
            },
        }
    }
}

/// Layered load: defaults, then the YAML file, then `CB_`-prefixed
/// environment overrides (`CB_CHAIN__RPC_URL=...`).
pub fn load_config(config_file: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    figment = match config_file {
        Some(path) => figment.merge(Yaml::file_exact(path)),
        None => figment.merge(Yaml::file(DEFAULT_CONFIG_NAME)),
    };

    figment
        .merge(Env::prefixed("CB_").split("__"))
        .extract()
        .context("Could not parse configuration")
}
