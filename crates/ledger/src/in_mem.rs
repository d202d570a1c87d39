// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EncryptedRecord, Ledger, LedgerError, Registration, RoleView, StatusBucket, Task};
use actix::Recipient;
use alloy_primitives::Address;
use async_trait::async_trait;
use cb_events::{
    BridgeEvent, Ciphertext, DataType, RecordAnchored, TaskCompleted, TaskCreated, TaskDeclined,
    TaskId, TaskPublished,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// In-memory reference ledger with the same observable semantics as the
/// EVM adapter: atomic writes, business-rule rejections, read-after-write
/// visibility for every connected handle. Used by tests and local
/// development; ledger time is a logical clock advanced explicitly.
pub struct InMemLedger {
    state: Arc<Mutex<LedgerState>>,
    signer: Address,
}

struct LedgerState {
    chain_id: u64,
    /// Every party session observing this ledger's commit events.
    buses: Vec<Recipient<BridgeEvent>>,
    now: u64,
    clients: HashMap<Address, Registration>,
    banks: HashMap<Address, Registration>,
    records: Vec<EncryptedRecord>,
    tasks: BTreeMap<u64, Task>,
    next_task: u64,
}

impl InMemLedger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                chain_id,
                buses: Vec::new(),
                now: 1_000,
                clients: HashMap::new(),
                banks: HashMap::new(),
                records: Vec::new(),
                tasks: BTreeMap::new(),
                next_task: 1,
            })),
            signer: Address::ZERO,
        }
    }

    /// A handle over the same ledger state, bound to another wallet.
    pub fn connect(&self, signer: Address) -> Self {
        Self {
            state: self.state.clone(),
            signer,
        }
    }

    /// Subscribe a party session's bus to this ledger's commit events.
    /// Commits are broadcast to every subscribed bus, whichever handle
    /// submitted the write.
    pub fn observe(&self, bus: Recipient<BridgeEvent>) {
        self.state.lock().unwrap().buses.push(bus);
    }

    /// Advance the logical ledger clock.
    pub fn advance_time(&self, seconds: u64) {
        self.state.lock().unwrap().now += seconds;
    }

    /// Flip a registration's `is_active` flag. Models registry
    /// administration, which has no operator surface in this crate.
    pub fn set_bank_active(&self, bank: Address, active: bool) {
        if let Some(reg) = self.state.lock().unwrap().banks.get_mut(&bank) {
            reg.is_active = active;
        }
    }

    pub fn set_client_active(&self, client: Address, active: bool) {
        if let Some(reg) = self.state.lock().unwrap().clients.get_mut(&client) {
            reg.is_active = active;
        }
    }

    fn emit(&self, event: impl Into<BridgeEvent>) {
        let event = event.into();
        let buses = self.state.lock().unwrap().buses.clone();
        for bus in buses {
            bus.do_send(event.clone());
        }
    }

    fn task_key(task_id: &TaskId) -> Result<u64, LedgerError> {
        task_id
            .task_id()
            .parse::<u64>()
            .map_err(|_| LedgerError::Rejected(format!("unknown task {}", task_id)))
    }
}

fn active_registration(
    registry: &HashMap<Address, Registration>,
    address: &Address,
) -> Result<(), LedgerError> {
    match registry.get(address) {
        Some(reg) if reg.is_active => Ok(()),
        Some(_) => Err(LedgerError::Rejected(format!(
            "{} is registered but inactive",
            address
        ))),
        None => Err(LedgerError::Rejected(format!("{} is not registered", address))),
    }
}

#[async_trait]
impl Ledger for InMemLedger {
    fn signer_address(&self) -> Address {
        self.signer
    }

    fn chain_id(&self) -> u64 {
        self.state.lock().unwrap().chain_id
    }

    async fn current_time(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().unwrap().now)
    }

    async fn register_client(&self, fhe_public_key: &str) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.clients.contains_key(&self.signer) {
            return Err(LedgerError::Rejected(format!(
                "client {} already registered",
                self.signer
            )));
        }
        state.clients.insert(
            self.signer,
            Registration {
                address: self.signer,
                fhe_public_key: fhe_public_key.to_string(),
                is_active: true,
            },
        );
        Ok(())
    }

    async fn register_bank(&self, fhe_public_key: &str) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.banks.contains_key(&self.signer) {
            return Err(LedgerError::Rejected(format!(
                "bank {} already registered",
                self.signer
            )));
        }
        state.banks.insert(
            self.signer,
            Registration {
                address: self.signer,
                fhe_public_key: fhe_public_key.to_string(),
                is_active: true,
            },
        );
        Ok(())
    }

    async fn client_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError> {
        Ok(self.state.lock().unwrap().clients.get(&address).cloned())
    }

    async fn bank_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError> {
        Ok(self.state.lock().unwrap().banks.get(&address).cloned())
    }

    async fn store_record(
        &self,
        owner: Address,
        data_type: DataType,
        expiry: u64,
        ciphertext: Ciphertext,
    ) -> Result<EncryptedRecord, LedgerError> {
        let record = {
            let mut state = self.state.lock().unwrap();
            active_registration(&state.banks, &self.signer)
                .map_err(|_| LedgerError::Rejected(format!(
                    "producer {} is not an active registered bank",
                    self.signer
                )))?;
            if !state.clients.contains_key(&owner) {
                return Err(LedgerError::Rejected(format!(
                    "owner {} is not a registered client",
                    owner
                )));
            }
            if ciphertext.is_empty() {
                return Err(LedgerError::Rejected("empty ciphertext".into()));
            }
            let record = EncryptedRecord {
                owner,
                producer: self.signer,
                data_type,
                ciphertext,
                expiry,
            };
            // Multiple anchors per (owner, data_type) are allowed; the
            // consumer picks the freshest live one.
            state.records.push(record.clone());
            record
        };
        self.emit(RecordAnchored {
            owner: record.owner,
            producer: record.producer,
            data_type: record.data_type,
            expiry: record.expiry,
        });
        Ok(record)
    }

    async fn records_by_owner(
        &self,
        owner: Address,
        data_type: DataType,
    ) -> Result<Vec<EncryptedRecord>, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.owner == owner && r.data_type == data_type)
            .cloned()
            .collect())
    }

    async fn create_task(
        &self,
        bank: Address,
        data_type: DataType,
    ) -> Result<TaskId, LedgerError> {
        let created = {
            let mut state = self.state.lock().unwrap();
            active_registration(&state.clients, &self.signer).map_err(|_| {
                LedgerError::Rejected(format!(
                    "caller {} is not an active registered client",
                    self.signer
                ))
            })?;
            active_registration(&state.banks, &bank).map_err(|_| {
                LedgerError::Rejected(format!("{} is not an active registered bank", bank))
            })?;

            let key = state.next_task;
            state.next_task += 1;
            let task = Task {
                id: TaskId::new(key.to_string(), state.chain_id),
                client: self.signer,
                bank,
                data_type,
                is_completed: false,
                is_published: false,
                is_declined: false,
                encrypted_result: Ciphertext::default(),
                signature: String::new(),
                decline_reason: String::new(),
                created_at: state.now,
            };
            state.tasks.insert(key, task.clone());
            task
        };
        self.emit(TaskCreated {
            task_id: created.id.clone(),
            client: created.client,
            bank: created.bank,
            data_type: created.data_type,
            created_at: created.created_at,
        });
        Ok(created.id)
    }

    async fn task(&self, task_id: &TaskId) -> Result<Option<Task>, LedgerError> {
        let key = match Self::task_key(task_id) {
            Ok(key) => key,
            Err(_) => return Ok(None),
        };
        Ok(self.state.lock().unwrap().tasks.get(&key).cloned())
    }

    async fn complete_task(
        &self,
        task_id: &TaskId,
        encrypted_result: Ciphertext,
    ) -> Result<(), LedgerError> {
        let key = Self::task_key(task_id)?;
        {
            let mut state = self.state.lock().unwrap();
            active_registration(&state.banks, &self.signer).map_err(|_| {
                LedgerError::Rejected(format!(
                    "caller {} is not an active registered bank",
                    self.signer
                ))
            })?;
            let task = state
                .tasks
                .get_mut(&key)
                .ok_or_else(|| LedgerError::Rejected(format!("unknown task {}", task_id)))?;
            if task.bank != self.signer {
                return Err(LedgerError::Rejected(format!(
                    "caller {} is not the bank for task {}",
                    self.signer, task_id
                )));
            }
            if task.is_declined {
                return Err(LedgerError::Rejected(format!("task {} was declined", task_id)));
            }
            if task.is_completed {
                return Err(LedgerError::Rejected(format!(
                    "task {} is already completed",
                    task_id
                )));
            }
            if encrypted_result.is_empty() {
                return Err(LedgerError::Rejected("empty encrypted result".into()));
            }
            task.encrypted_result = encrypted_result.clone();
            task.is_completed = true;
        }
        self.emit(TaskCompleted {
            task_id: task_id.clone(),
            encrypted_result,
        });
        Ok(())
    }

    async fn publish_task(&self, task_id: &TaskId, signature: &str) -> Result<(), LedgerError> {
        let key = Self::task_key(task_id)?;
        {
            let mut state = self.state.lock().unwrap();
            let task = state
                .tasks
                .get_mut(&key)
                .ok_or_else(|| LedgerError::Rejected(format!("unknown task {}", task_id)))?;
            if task.client != self.signer {
                return Err(LedgerError::Rejected(format!(
                    "caller {} is not the client for task {}",
                    self.signer, task_id
                )));
            }
            if !task.is_completed {
                return Err(LedgerError::Rejected(format!(
                    "task {} is not completed yet",
                    task_id
                )));
            }
            if task.is_published {
                return Err(LedgerError::Rejected(format!(
                    "task {} is already published",
                    task_id
                )));
            }
            if signature.is_empty() {
                return Err(LedgerError::Rejected("empty signature".into()));
            }
            task.signature = signature.to_string();
            task.is_published = true;
        }
        self.emit(TaskPublished {
            task_id: task_id.clone(),
            signature: signature.to_string(),
        });
        Ok(())
    }

    async fn decline_task(&self, task_id: &TaskId, reason: &str) -> Result<(), LedgerError> {
        let key = Self::task_key(task_id)?;
        {
            let mut state = self.state.lock().unwrap();
            let task = state
                .tasks
                .get_mut(&key)
                .ok_or_else(|| LedgerError::Rejected(format!("unknown task {}", task_id)))?;
            if task.bank != self.signer {
                return Err(LedgerError::Rejected(format!(
                    "caller {} is not the bank for task {}",
                    self.signer, task_id
                )));
            }
            if task.is_completed || task.is_published || task.is_declined {
                return Err(LedgerError::Rejected(format!(
                    "task {} is not pending",
                    task_id
                )));
            }
            task.decline_reason = reason.to_string();
            task.is_declined = true;
        }
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
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .values()
            .filter(|task| view.party_of(task) == &party && bucket.matches(task))
            .cloned()
            .collect())
    }
}
