// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    EncryptedRecord, EthProvider, Ledger, LedgerError, Registration, RoleView, StatusBucket, Task,
};
use actix::Recipient;
use alloy::consensus::TxReceipt;
use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum;
use alloy::providers::{PendingTransactionBuilder, Provider, WalletProvider};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use cb_events::{
    BridgeEvent, Ciphertext, DataType, RecordAnchored, TaskCompleted, TaskCreated, TaskDeclined,
    TaskId, TaskPublished,
};
use std::time::Duration;
use tracing::info;

sol!(
    #[sol(rpc)]
    interface IIdentityRegistry {
        struct RegistrationView {
            string fhePublicKey;
            bool isActive;
            bool exists;
        }

        event Registered(address indexed party, string fhePublicKey);

        function register(string calldata fhePublicKey) external;
        function getRegistration(address party) external view returns (RegistrationView memory);
    }
);

sol!(
    #[sol(rpc)]
    interface IDataStorage {
        struct DataEntry {
            address owner;
            address producer;
            string dataType;
            uint256 expiryDate;
            string encryptedData;
        }

        event DataStored(
            address indexed owner,
            address indexed producer,
            string dataType,
            uint256 indexed expiryDate
        );

        function storeData(
            address owner,
            string calldata dataType,
            uint256 expiryDate,
            string calldata encryptedData
        ) external;

        function getDataByOwnerAndType(address owner, string calldata dataType)
            external
            view
            returns (DataEntry[] memory);
    }
);

sol!(
    #[sol(rpc)]
    interface ITaskManager {
        struct TaskView {
            uint256 id;
            address client;
            address bank;
            string dataType;
            bool isCompleted;
            bool isPublished;
            bool isDeclined;
            string encryptedResult;
            string signature;
            string declineReason;
            uint256 createdAt;
            bool exists;
        }

        event TaskCreated(
            uint256 indexed taskId,
            address indexed client,
            address indexed bank,
            string dataType,
            uint256 createdAt
        );
        event TaskCompleted(uint256 indexed taskId, string encryptedResult);
        event TaskPublished(uint256 indexed taskId, string signature);
        event TaskDeclined(uint256 indexed taskId, string reason);

        function createTask(address bank, string calldata dataType) external returns (uint256);
        function completeTask(uint256 taskId, string calldata encryptedResult) external;
        function publishTask(uint256 taskId, string calldata signature) external;
        function declineTask(uint256 taskId, string calldata reason) external;
        function getTask(uint256 taskId) external view returns (TaskView memory);
        function listTasks(address party, uint8 role, uint8 bucket)
            external
            view
            returns (TaskView[] memory);
    }
);

/// Deployed addresses of the four CipherBridge contracts on one chain.
#[derive(Clone, Debug)]
pub struct LedgerAddresses {
    pub client_registry: Address,
    pub bank_registry: Address,
    pub data_storage: Address,
    pub task_manager: Address,
}

/// Ledger adapter over the deployed contract suite. Bound to the wallet
/// configured on the provider; every write is submitted as that identity
/// and confirmed against the receipt before it is reported as applied.
pub struct EvmLedger<P> {
    provider: EthProvider<P>,
    addresses: LedgerAddresses,
    bus: Option<Recipient<BridgeEvent>>,
    confirmation_timeout: Duration,
}

impl<P: Provider + WalletProvider + Clone + 'static> EvmLedger<P> {
    pub fn new(
        provider: EthProvider<P>,
        addresses: LedgerAddresses,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            addresses,
            bus: None,
            confirmation_timeout,
        }
    }

    /// Commit events from writes through this handle go to `bus`.
    pub fn with_bus(mut self, bus: Recipient<BridgeEvent>) -> Self {
        self.bus = Some(bus);
        self
    }

    fn emit(&self, event: impl Into<BridgeEvent>) {
        if let Some(bus) = &self.bus {
            bus.do_send(event.into());
        }
    }

    fn task_id(&self, raw: U256) -> TaskId {
        TaskId::new(raw.to_string(), self.provider.chain_id())
    }

    fn to_task(&self, view: ITaskManager::TaskView) -> Result<Task, LedgerError> {
        Ok(Task {
            id: self.task_id(view.id),
            client: view.client,
            bank: view.bank,
            data_type: parse_data_type(&view.dataType)?,
            is_completed: view.isCompleted,
            is_published: view.isPublished,
            is_declined: view.isDeclined,
            encrypted_result: Ciphertext::new(view.encryptedResult),
            signature: view.signature,
            decline_reason: view.declineReason,
            created_at: as_u64(view.createdAt)?,
        })
    }

    /// Wait for a submitted write's receipt within the confirmation
    /// timeout. A timeout means the transaction may still land; callers
    /// re-read ledger state before retrying.
    async fn wait_receipt(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TransactionReceipt, LedgerError> {
        let receipt = tokio::time::timeout(self.confirmation_timeout, pending.get_receipt())
            .await
            .map_err(|_| LedgerError::Unconfirmed(self.confirmation_timeout))?
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        if !receipt.status() {
            return Err(LedgerError::Rejected("transaction reverted".into()));
        }
        Ok(receipt)
    }
}

fn parse_data_type(tag: &str) -> Result<DataType, LedgerError> {
    tag.parse::<DataType>()
        .map_err(|e| LedgerError::Decode(e.to_string()))
}

fn as_u64(value: U256) -> Result<u64, LedgerError> {
    value
        .try_into()
        .map_err(|_| LedgerError::Decode(format!("timestamp out of range: {value}")))
}

/// Reverts are business rejections; anything else is a transport problem.
fn map_contract_error(error: alloy::contract::Error) -> LedgerError {
    let message = error.to_string();
    if message.contains("revert") {
        LedgerError::Rejected(message)
    } else {
        LedgerError::Transport(message)
    }
}

fn registration(
    address: Address,
    view: IIdentityRegistry::RegistrationView,
) -> Option<Registration> {
    view.exists.then_some(Registration {
        address,
        fhe_public_key: view.fhePublicKey,
        is_active: view.isActive,
    })
}

#[async_trait]
impl<P: Provider + WalletProvider + Clone + 'static> Ledger for EvmLedger<P> {
    fn signer_address(&self) -> Address {
        self.provider.provider().default_signer_address()
    }

    fn chain_id(&self) -> u64 {
        self.provider.chain_id()
    }

    async fn current_time(&self) -> Result<u64, LedgerError> {
        let block = self
            .provider
            .provider()
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?
            .ok_or_else(|| LedgerError::Transport("no latest block".into()))?;
        Ok(block.header.timestamp)
    }

    async fn register_client(&self, fhe_public_key: &str) -> Result<(), LedgerError> {
        let contract =
            IIdentityRegistry::new(self.addresses.client_registry, self.provider.provider());
        let pending = contract
            .register(fhe_public_key.to_string())
            .send()
            .await
            .map_err(map_contract_error)?;
        self.wait_receipt(pending).await?;
        Ok(())
    }

    async fn register_bank(&self, fhe_public_key: &str) -> Result<(), LedgerError> {
        let contract =
            IIdentityRegistry::new(self.addresses.bank_registry, self.provider.provider());
        let pending = contract
            .register(fhe_public_key.to_string())
            .send()
            .await
            .map_err(map_contract_error)?;
        self.wait_receipt(pending).await?;
        Ok(())
    }

    async fn client_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError> {
        let contract =
            IIdentityRegistry::new(self.addresses.client_registry, self.provider.provider());
        let view = contract
            .getRegistration(address)
            .call()
            .await
            .map_err(map_contract_error)?;
        Ok(registration(address, view))
    }

    async fn bank_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError> {
        let contract =
            IIdentityRegistry::new(self.addresses.bank_registry, self.provider.provider());
        let view = contract
            .getRegistration(address)
            .call()
            .await
            .map_err(map_contract_error)?;
        Ok(registration(address, view))
    }

    async fn store_record(
        &self,
        owner: Address,
        data_type: DataType,
        expiry: u64,
        ciphertext: Ciphertext,
    ) -> Result<EncryptedRecord, LedgerError> {
        let contract = IDataStorage::new(self.addresses.data_storage, self.provider.provider());
        let pending = contract
            .storeData(
                owner,
                data_type.as_str().to_string(),
                U256::from(expiry),
                ciphertext.as_str().to_string(),
            )
            .send()
            .await
            .map_err(map_contract_error)?;
        let receipt = self.wait_receipt(pending).await?;

        let record = EncryptedRecord {
            owner,
            producer: self.signer_address(),
            data_type,
            ciphertext,
            expiry,
        };
        for log in receipt.inner.logs() {
            if log.topic0() == Some(&IDataStorage::DataStored::SIGNATURE_HASH) {
                if let Ok(event) = IDataStorage::DataStored::decode_log_data(log.data()) {
                    self.emit(RecordAnchored {
                        owner: event.owner,
                        producer: event.producer,
                        data_type: record.data_type,
                        expiry: record.expiry,
                    });
                }
            }
        }
        Ok(record)
    }

    async fn records_by_owner(
        &self,
        owner: Address,
        data_type: DataType,
    ) -> Result<Vec<EncryptedRecord>, LedgerError> {
        let contract = IDataStorage::new(self.addresses.data_storage, self.provider.provider());
        let entries = contract
            .getDataByOwnerAndType(owner, data_type.as_str().to_string())
            .call()
            .await
            .map_err(map_contract_error)?;

        entries
            .into_iter()
            .map(|entry| {
                Ok(EncryptedRecord {
                    owner: entry.owner,
                    producer: entry.producer,
                    data_type: parse_data_type(&entry.dataType)?,
                    ciphertext: Ciphertext::new(entry.encryptedData),
                    expiry: as_u64(entry.expiryDate)?,
                })
            })
            .collect()
    }

    async fn create_task(
        &self,
        bank: Address,
        data_type: DataType,
    ) -> Result<TaskId, LedgerError> {
        let contract = ITaskManager::new(self.addresses.task_manager, self.provider.provider());
        let pending = contract
            .createTask(bank, data_type.as_str().to_string())
            .send()
            .await
            .map_err(map_contract_error)?;
        let receipt = self.wait_receipt(pending).await?;

        // The assigned id is only knowable from the commit event.
        for log in receipt.inner.logs() {
            if log.topic0() == Some(&ITaskManager::TaskCreated::SIGNATURE_HASH) {
                let Ok(event) = ITaskManager::TaskCreated::decode_log_data(log.data()) else {
                    continue;
                };
                let task_id = self.task_id(event.taskId);
                info!(task_id = %task_id, "Task created on ledger");
                self.emit(TaskCreated {
                    task_id: task_id.clone(),
                    client: event.client,
                    bank: event.bank,
                    data_type,
                    created_at: as_u64(event.createdAt)?,
                });
                return Ok(task_id);
            }
        }
        Err(LedgerError::Decode(
            "create confirmed but no TaskCreated event in receipt".into(),
        ))
    }

    async fn task(&self, task_id: &TaskId) -> Result<Option<Task>, LedgerError> {
        let contract = ITaskManager::new(self.addresses.task_manager, self.provider.provider());
        let raw: U256 = task_id
            .clone()
            .try_into()
            .map_err(|_| LedgerError::Decode(format!("malformed task id {task_id}")))?;
        let view = contract.getTask(raw).call().await.map_err(map_contract_error)?;
        if !view.exists {
            return Ok(None);
        }
        Ok(Some(self.to_task(view)?))
    }

    async fn complete_task(
        &self,
        task_id: &TaskId,
        encrypted_result: Ciphertext,
    ) -> Result<(), LedgerError> {
        let contract = ITaskManager::new(self.addresses.task_manager, self.provider.provider());
        let raw: U256 = task_id
            .clone()
            .try_into()
            .map_err(|_| LedgerError::Decode(format!("malformed task id {task_id}")))?;
        let pending = contract
            .completeTask(raw, encrypted_result.as_str().to_string())
            .send()
            .await
            .map_err(map_contract_error)?;
        self.wait_receipt(pending).await?;
        self.emit(TaskCompleted {
            task_id: task_id.clone(),
            encrypted_result,
        });
        Ok(())
    }

    async fn publish_task(&self, task_id: &TaskId, signature: &str) -> Result<(), LedgerError> {
        let contract = ITaskManager::new(self.addresses.task_manager, self.provider.provider());
        let raw: U256 = task_id
            .clone()
            .try_into()
            .map_err(|_| LedgerError::Decode(format!("malformed task id {task_id}")))?;
        let pending = contract
            .publishTask(raw, signature.to_string())
            .send()
            .await
            .map_err(map_contract_error)?;
        self.wait_receipt(pending).await?;
        self.emit(TaskPublished {
            task_id: task_id.clone(),
            signature: signature.to_string(),
        });
        Ok(())
    }

    async fn decline_task(&self, task_id: &TaskId, reason: &str) -> Result<(), LedgerError> {
        let contract = ITaskManager::new(self.addresses.task_manager, self.provider.provider());
        let raw: U256 = task_id
            .clone()
            .try_into()
            .map_err(|_| LedgerError::Decode(format!("malformed task id {task_id}")))?;
        let pending = contract
            .declineTask(raw, reason.to_string())
            .send()
            .await
            .map_err(map_contract_error)?;
        self.wait_receipt(pending).await?;
        self.emit(TaskDeclined {
            task_id: task_id.clone(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn list_tasks(
        &self,
        party: Address,
        view: RoleView,
        bucket: StatusBucket,
    ) -> Result<Vec<Task>, LedgerError> {
        let contract = ITaskManager::new(self.addresses.task_manager, self.provider.provider());
        let role = match view {
            RoleView::Client => 0u8,
            RoleView::Bank => 1u8,
        };
        let bucket = match bucket {
            StatusBucket::Pending => 0u8,
            StatusBucket::CompletedUnpublished => 1u8,
            StatusBucket::Published => 2u8,
            StatusBucket::Declined => 3u8,
        };
        let views = contract
            .listTasks(party, role, bucket)
            .call()
            .await
            .map_err(map_contract_error)?;
        views.into_iter().map(|v| self.to_task(v)).collect()
    }
}
