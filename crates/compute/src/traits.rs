// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ComputeError, FheKeys};
use alloy_primitives::Address;
use async_trait::async_trait;
use cb_events::{Ciphertext, DataType, TaskId};

/// The cipher-compute collaborator: a stateless remote service performing
/// homomorphic key issuance, encryption, computation and decryption. Each
/// call stands alone; compute requests are correlated across retries only
/// by the caller-chosen task id.
#[async_trait]
pub trait CipherCompute: Send + Sync {
    /// Issue (or re-issue) the FHE key pair for an identity. Idempotent.
    async fn generate_keys(&self, identity: Address) -> Result<FheKeys, ComputeError>;

    /// Fetch the FHE public key previously issued for an identity.
    /// Idempotent and safe to call repeatedly.
    async fn get_public_key(&self, identity: Address) -> Result<String, ComputeError>;

    async fn encrypt(
        &self,
        identity: Address,
        data_type: DataType,
        value: u64,
    ) -> Result<Ciphertext, ComputeError>;

    async fn compute(
        &self,
        identity: Address,
        task_id: &TaskId,
        data_type: DataType,
        encrypted_values: &[Ciphertext],
    ) -> Result<Ciphertext, ComputeError>;

    async fn decrypt(
        &self,
        identity: Address,
        data_type: DataType,
        encrypted_value: &Ciphertext,
    ) -> Result<u64, ComputeError>;
}
