// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr};
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use cb_compute::{CipherCompute, HttpComputeClient};
use cb_config::AppConfig;
use cb_coordinator::{
    BankCoordinator, BankSession, ClientCoordinator, ClientSession,
};
use cb_events::{BridgeEvent, EventBus};
use cb_ledger::{
    EvmEventListener, EvmLedger, Ledger, LedgerAddresses, ProviderConfig,
};
use cb_logger::SimpleLogger;
use cb_pipeline::SubmissionPipeline;
use std::sync::Arc;
use std::time::Duration;

const EVENT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// A running client operator session: bus, ledger handle bound to the
/// client wallet, and the coordinator driving publishes.
pub struct ClientParty {
    pub bus: Addr<EventBus<BridgeEvent>>,
    pub ledger: Arc<dyn Ledger>,
    pub compute: Arc<dyn CipherCompute>,
    pub coordinator: Addr<ClientCoordinator>,
}

/// A running bank operator session: bus, ledger handle bound to the bank
/// wallet, the coordinator driving completions, and the submission
/// pipeline for anchoring client data.
pub struct BankParty {
    pub bus: Addr<EventBus<BridgeEvent>>,
    pub ledger: Arc<dyn Ledger>,
    pub compute: Arc<dyn CipherCompute>,
    pub coordinator: Addr<BankCoordinator>,
    pub pipeline: Arc<SubmissionPipeline>,
}

fn ledger_addresses(config: &AppConfig) -> Result<LedgerAddresses> {
    Ok(LedgerAddresses {
        client_registry: config.chain.contracts.client_registry()?,
        bank_registry: config.chain.contracts.bank_registry()?,
        data_storage: config.chain.contracts.data_storage()?,
        task_manager: config.chain.contracts.task_manager()?,
    })
}

fn compute_client(config: &AppConfig) -> Result<HttpComputeClient> {
    Ok(HttpComputeClient::new(
        config.compute.base_url()?,
        config.timeouts.compute(),
    )?)
}

pub async fn start_client_party(config: &AppConfig, signer: PrivateKeySigner) -> Result<ClientParty> {
    let bus = EventBus::<BridgeEvent>::default().start();
    SimpleLogger::attach("client", bus.clone());

    let addresses = ledger_addresses(config)?;
    let provider = ProviderConfig::new(&config.chain.rpc_url)
        .create_signer_provider(&signer)
        .await?;
    EvmEventListener::attach(
        provider.clone(),
        &addresses,
        bus.clone().recipient(),
        EVENT_POLL_INTERVAL,
    )
    .await?;
    let ledger: Arc<dyn Ledger> = Arc::new(
        EvmLedger::new(
            provider,
            addresses,
            config.timeouts.ledger_confirmation(),
        )
        .with_bus(bus.clone().recipient()),
    );

    let compute: Arc<dyn CipherCompute> = Arc::new(compute_client(config)?);
    let session = ClientSession::new(signer);
    let coordinator =
        ClientCoordinator::attach(session, ledger.clone(), compute.clone(), &bus).await?;

    Ok(ClientParty {
        bus,
        ledger,
        compute,
        coordinator,
    })
}

pub async fn start_bank_party(config: &AppConfig, signer: PrivateKeySigner) -> Result<BankParty> {
    let bus = EventBus::<BridgeEvent>::default().start();
    SimpleLogger::attach("bank", bus.clone());

    let addresses = ledger_addresses(config)?;
    let provider = ProviderConfig::new(&config.chain.rpc_url)
        .create_signer_provider(&signer)
        .await?;
    EvmEventListener::attach(
        provider.clone(),
        &addresses,
        bus.clone().recipient(),
        EVENT_POLL_INTERVAL,
    )
    .await?;
    let ledger: Arc<dyn Ledger> = Arc::new(
        EvmLedger::new(
            provider,
            addresses,
            config.timeouts.ledger_confirmation(),
        )
        .with_bus(bus.clone().recipient()),
    );

    let compute: Arc<dyn CipherCompute> = Arc::new(compute_client(config)?);
    let session = BankSession::new(signer.address());
    let coordinator =
        BankCoordinator::attach(session, ledger.clone(), compute.clone(), &bus).await?;
    let pipeline = Arc::new(SubmissionPipeline::new(compute.clone(), ledger.clone()));

    Ok(BankParty {
        bus,
        ledger,
        compute,
        coordinator,
        pipeline,
    })
}
