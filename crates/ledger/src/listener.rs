// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EthProvider, IDataStorage, ITaskManager, LedgerAddresses};
use actix::prelude::*;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use alloy_primitives::{LogData, B256};
use cb_events::{
    BridgeEvent, Ciphertext, RecordAnchored, TaskCompleted, TaskCreated, TaskDeclined, TaskId,
    TaskPublished,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, trace, warn};

/// Convert a contract log into a BridgeEvent.
pub fn extractor(data: &LogData, topic: Option<&B256>, chain_id: u64) -> Option<BridgeEvent> {
    match topic {
        Some(&ITaskManager::TaskCreated::SIGNATURE_HASH) => {
            let Ok(event) = ITaskManager::TaskCreated::decode_log_data(data) else {
                error!("Error parsing event TaskCreated after topic matched!");
                return None;
            };
            let Ok(data_type) = cb_events::DataType::from_str(&event.dataType) else {
                error!("TaskCreated event carried an unknown data type tag");
                return None;
            };
            Some(BridgeEvent::from(TaskCreated {
                task_id: TaskId::new(event.taskId.to_string(), chain_id),
                client: event.client,
                bank: event.bank,
                data_type,
                created_at: event.createdAt.try_into().unwrap_or_default(),
            }))
        }
        Some(&ITaskManager::TaskCompleted::SIGNATURE_HASH) => {
            let Ok(event) = ITaskManager::TaskCompleted::decode_log_data(data) else {
                error!("Error parsing event TaskCompleted after topic matched!");
                return None;
            };
            Some(BridgeEvent::from(TaskCompleted {
                task_id: TaskId::new(event.taskId.to_string(), chain_id),
                encrypted_result: Ciphertext::new(event.encryptedResult),
            }))
        }
        Some(&ITaskManager::TaskPublished::SIGNATURE_HASH) => {
            let Ok(event) = ITaskManager::TaskPublished::decode_log_data(data) else {
                error!("Error parsing event TaskPublished after topic matched!");
                return None;
            };
            Some(BridgeEvent::from(TaskPublished {
                task_id: TaskId::new(event.taskId.to_string(), chain_id),
                signature: event.signature,
            }))
        }
        Some(&ITaskManager::TaskDeclined::SIGNATURE_HASH) => {
            let Ok(event) = ITaskManager::TaskDeclined::decode_log_data(data) else {
                error!("Error parsing event TaskDeclined after topic matched!");
                return None;
            };
            Some(BridgeEvent::from(TaskDeclined {
                task_id: TaskId::new(event.taskId.to_string(), chain_id),
                reason: event.reason,
            }))
        }
        Some(&IDataStorage::DataStored::SIGNATURE_HASH) => {
            let Ok(event) = IDataStorage::DataStored::decode_log_data(data) else {
                error!("Error parsing event DataStored after topic matched!");
                return None;
            };
            let Ok(data_type) = cb_events::DataType::from_str(&event.dataType) else {
                error!("DataStored event carried an unknown data type tag");
                return None;
            };
            Some(BridgeEvent::from(RecordAnchored {
                owner: event.owner,
                producer: event.producer,
                data_type,
                expiry: event.expiryDate.try_into().unwrap_or_default(),
            }))
        }
        _topic => {
            trace!(topic=?_topic, "Unknown event received by ledger listener; ignored");
            None
        }
    }
}

/// Polls the contract suite for commit events and publishes them on the
/// party's bus. This is how a party observes the counterparty's writes;
/// its own writes are already emitted by the [`crate::EvmLedger`] handle
/// (the bus deduplicates the overlap).
pub struct EvmEventListener<P> {
    provider: EthProvider<P>,
    addresses: Vec<alloy_primitives::Address>,
    bus: Recipient<BridgeEvent>,
    next_block: u64,
    poll_interval: Duration,
}

impl<P: Provider + Clone + 'static> EvmEventListener<P> {
    pub async fn attach(
        provider: EthProvider<P>,
        addresses: &LedgerAddresses,
        bus: Recipient<BridgeEvent>,
        poll_interval: Duration,
    ) -> anyhow::Result<Addr<Self>> {
        let next_block = provider.provider().get_block_number().await? + 1;
        Ok(Self {
            provider,
            addresses: vec![addresses.data_storage, addresses.task_manager],
            bus,
            next_block,
            poll_interval,
        }
        .start())
    }
}

impl<P: Provider + Clone + 'static> Actor for EvmEventListener<P> {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.run_interval(self.poll_interval, |act, ctx| {
            let provider = act.provider.clone();
            let addresses = act.addresses.clone();
            let bus = act.bus.clone();
            let from_block = act.next_block;

            let fut = async move {
                let filter = Filter::new().address(addresses).from_block(from_block);
                let logs = match provider.provider().get_logs(&filter).await {
                    Ok(logs) => logs,
                    Err(err) => {
                        warn!("Failed to poll ledger events: {err}");
                        return from_block;
                    }
                };
                let mut next = from_block;
                for log in &logs {
                    if let Some(event) = extractor(log.data(), log.topic0(), provider.chain_id())
                    {
                        bus.do_send(event);
                    }
                    if let Some(block) = log.block_number {
                        next = next.max(block + 1);
                    }
                }
                next
            };

            ctx.spawn(fut.into_actor(act).map(|next, act, _| {
                act.next_block = next;
            }));
        });
    }
}
