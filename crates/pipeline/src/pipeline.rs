// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EncryptionHistory, HistoryEntry, PipelineError};
use alloy_primitives::Address;
use cb_compute::CipherCompute;
use cb_events::{Ciphertext, DataType};
use cb_ledger::{EncryptedRecord, Ledger, LedgerError};
use std::sync::{Arc, Mutex};
use tracing::info;

const HISTORY_CAPACITY: usize = 256;

/// Turns a plaintext attribute into a ciphertext bound to its owner's key
/// and anchors it on the ledger with an expiry. The ledger handle is bound
/// to the producer's wallet (a bank encrypting on behalf of a client).
pub struct SubmissionPipeline {
    compute: Arc<dyn CipherCompute>,
    ledger: Arc<dyn Ledger>,
    history: Mutex<EncryptionHistory>,
}

impl SubmissionPipeline {
    pub fn new(compute: Arc<dyn CipherCompute>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            compute,
            ledger,
            history: Mutex::new(EncryptionHistory::new(HISTORY_CAPACITY)),
        }
    }

    /// Parse an operator-supplied tag against the closed enumeration.
    pub fn parse_tag(tag: &str) -> Result<DataType, PipelineError> {
        Ok(tag.parse::<DataType>()?)
    }

    /// Fetch the owner's FHE public key from the cipher-compute service.
    /// Idempotent; safe to call before every encryption.
    pub async fn request_key(&self, owner: Address) -> Result<String, PipelineError> {
        self.compute
            .get_public_key(owner)
            .await
            .map_err(|e| PipelineError::KeyServiceUnavailable(e.to_string()))
    }

    /// Encrypt `value` under the owner's key. The ciphertext is appended
    /// to the local history as not-yet-anchored.
    pub async fn encrypt(
        &self,
        owner: Address,
        data_type: DataType,
        value: u64,
    ) -> Result<Ciphertext, PipelineError> {
        let ciphertext = self
            .compute
            .encrypt(owner, data_type, value)
            .await
            .map_err(|e| PipelineError::EncryptionServiceError(e.to_string()))?;

        self.history.lock().unwrap().push(HistoryEntry {
            owner,
            data_type,
            ciphertext: ciphertext.clone(),
            anchored: false,
            expiry: None,
        });
        Ok(ciphertext)
    }

    /// Anchor a ciphertext on the ledger. Expiry is computed against
    /// ledger time, never the producer's wall clock, so producer/ledger
    /// clock skew cannot shorten or extend a record's life.
    pub async fn anchor(
        &self,
        owner: Address,
        data_type: DataType,
        ciphertext: Ciphertext,
        ttl: u64,
    ) -> Result<EncryptedRecord, PipelineError> {
        let now = self
            .ledger
            .current_time()
            .await
            .map_err(PipelineError::Ledger)?;
        let expiry = now + ttl;

        let record = self
            .ledger
            .store_record(owner, data_type, expiry, ciphertext)
            .await
            .map_err(|e| match e {
                LedgerError::Rejected(msg) => PipelineError::UnauthorizedProducer(msg),
                other => PipelineError::Ledger(other),
            })?;

        self.history.lock().unwrap().mark_anchored(
            record.owner,
            record.data_type,
            &record.ciphertext,
            record.expiry,
        );
        info!(owner = %record.owner, data_type = %record.data_type, expiry = record.expiry,
              "Encrypted record anchored");
        Ok(record)
    }

    /// Encrypt and anchor in one step, requesting the owner's key first.
    /// Mirrors the operator's encrypt-then-upload flow.
    pub async fn submit(
        &self,
        owner: Address,
        data_type: DataType,
        value: u64,
        ttl: u64,
    ) -> Result<EncryptedRecord, PipelineError> {
        self.request_key(owner).await?;
        let ciphertext = self.encrypt(owner, data_type, value).await?;
        self.anchor(owner, data_type, ciphertext, ttl).await
    }

    /// Non-authoritative encryption history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().entries()
    }
}
