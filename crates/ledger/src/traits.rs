// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EncryptedRecord, LedgerError, Registration, RoleView, StatusBucket, Task};
use alloy_primitives::Address;
use async_trait::async_trait;
use cb_events::{Ciphertext, DataType, TaskId};

/// Typed access to the four on-chain registries. A `Ledger` handle is
/// bound to one wallet identity, the transaction sender for every write,
/// the same way a wallet-connected provider is. Reads take the identity
/// they are scoped to explicitly.
///
/// Writes are single atomic ledger transactions: an accepted write is
/// immediately visible to subsequent reads from any party. A write that
/// returns `Unconfirmed` may still have applied; callers re-read before
/// retrying.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Identity every write from this handle is submitted as.
    fn signer_address(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Ledger time in seconds. All expiry arithmetic uses this, never the
    /// producer's wall clock.
    async fn current_time(&self) -> Result<u64, LedgerError>;

    // -- identity registries -------------------------------------------

    async fn register_client(&self, fhe_public_key: &str) -> Result<(), LedgerError>;

    async fn register_bank(&self, fhe_public_key: &str) -> Result<(), LedgerError>;

    async fn client_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError>;

    async fn bank_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError>;

    // -- encrypted-record store ----------------------------------------

    /// Anchor a ciphertext for `owner`. The producer is the bound signer;
    /// it must be an active registered bank.
    async fn store_record(
        &self,
        owner: Address,
        data_type: DataType,
        expiry: u64,
        ciphertext: Ciphertext,
    ) -> Result<EncryptedRecord, LedgerError>;

    /// All records for (owner, data_type), including expired ones; callers
    /// filter with [`EncryptedRecord::is_expired`].
    async fn records_by_owner(
        &self,
        owner: Address,
        data_type: DataType,
    ) -> Result<Vec<EncryptedRecord>, LedgerError>;

    // -- task store ----------------------------------------------------

    /// Create a task against `bank`; the client is the bound signer. The
    /// assigned id is carried by the commit event.
    async fn create_task(&self, bank: Address, data_type: DataType)
        -> Result<TaskId, LedgerError>;

    async fn task(&self, task_id: &TaskId) -> Result<Option<Task>, LedgerError>;

    async fn complete_task(
        &self,
        task_id: &TaskId,
        encrypted_result: Ciphertext,
    ) -> Result<(), LedgerError>;

    async fn publish_task(&self, task_id: &TaskId, signature: &str) -> Result<(), LedgerError>;

    async fn decline_task(&self, task_id: &TaskId, reason: &str) -> Result<(), LedgerError>;

    /// Scoped list query: `party`'s view of its own tasks, filtered on a
    /// status bucket.
    async fn list_tasks(
        &self,
        party: Address,
        view: RoleView,
        bucket: StatusBucket,
    ) -> Result<Vec<Task>, LedgerError>;
}
