// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_url: String, // We may need multiple per chain for redundancy at a later point
    pub contracts: ContractAddresses,
    pub chain_id: Option<u64>,
}

/// Deployed addresses of the CipherBridge contract suite, as configured.
/// Parsed into typed addresses at startup so a bad config fails fast.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractAddresses {
    pub client_registry: String,
    pub bank_registry: String,
    pub data_storage: String,
    pub task_manager: String,
}

impl ContractAddresses {
    fn parse(label: &str, value: &str) -> Result<Address> {
        value
            .parse::<Address>()
            .map_err(|e| anyhow!("invalid {} address {:?}: {}", label, value, e))
    }

    pub fn client_registry(&self) -> Result<Address> {
        Self::parse("client_registry", &self.client_registry)
    }

    pub fn bank_registry(&self) -> Result<Address> {
        Self::parse("bank_registry", &self.bank_registry)
    }

    pub fn data_storage(&self) -> Result<Address> {
        Self::parse("data_storage", &self.data_storage)
    }

    pub fn task_manager(&self) -> Result<Address> {
        Self::parse("task_manager", &self.task_manager)
    }
}

impl ChainConfig {
    pub fn rpc_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.rpc_url)
            .with_context(|| format!("Failed to parse RPC URL for chain {}", self.name))
    }
}
