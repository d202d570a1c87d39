// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use async_trait::async_trait;
use cb_compute::{CipherCompute, ComputeError, FheKeys};
use cb_events::{Ciphertext, DataType, TaskId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Deterministic stand-in for the cipher-compute service. "Ciphertexts"
/// are tagged tokens (`fhe:<data_type>:<value>`), computation sums the
/// inputs and compares against an eligibility threshold, and decryption
/// reads the token back. Call counters and a failure switch support
/// retry and idempotency tests.
pub struct StubCompute {
    threshold: u64,
    pub compute_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
    fail_compute: AtomicBool,
}

impl StubCompute {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            compute_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
            fail_compute: AtomicBool::new(false),
        }
    }

    /// Make the next compute calls fail with a transient service error.
    pub fn set_fail_compute(&self, fail: bool) {
        self.fail_compute.store(fail, Ordering::SeqCst);
    }

    pub fn encode(data_type: DataType, value: u64) -> Ciphertext {
        Ciphertext::new(format!("fhe:{}:{}", data_type, value))
    }

    fn decode(data_type: DataType, ciphertext: &Ciphertext) -> Result<u64, ComputeError> {
        let mut parts = ciphertext.as_str().splitn(3, ':');
        let (Some("fhe"), Some(tag), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ComputeError::Rejected(format!(
                "not a ciphertext issued by this service: {ciphertext}"
            )));
        };
        if tag != data_type.as_str() {
            return Err(ComputeError::Rejected(format!(
                "ciphertext is tagged {tag}, not {data_type}"
            )));
        }
        value
            .parse::<u64>()
            .map_err(|e| ComputeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CipherCompute for StubCompute {
    async fn generate_keys(&self, identity: Address) -> Result<FheKeys, ComputeError> {
        Ok(FheKeys {
            fhe_public_key: format!("fhe-pk-{identity}"),
            client_key: format!("fhe-ck-{identity}"),
        })
    }

    async fn get_public_key(&self, identity: Address) -> Result<String, ComputeError> {
        Ok(format!("fhe-pk-{identity}"))
    }

    async fn encrypt(
        &self,
        _identity: Address,
        data_type: DataType,
        value: u64,
    ) -> Result<Ciphertext, ComputeError> {
        Ok(Self::encode(data_type, value))
    }

    async fn compute(
        &self,
        _identity: Address,
        _task_id: &TaskId,
        data_type: DataType,
        encrypted_values: &[Ciphertext],
    ) -> Result<Ciphertext, ComputeError> {
        self.compute_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_compute.load(Ordering::SeqCst) {
            return Err(ComputeError::Service("stub compute offline".into()));
        }
        if encrypted_values.is_empty() {
            return Err(ComputeError::Rejected("no inputs".into()));
        }
        let mut sum = 0u64;
        for ciphertext in encrypted_values {
            sum += Self::decode(data_type, ciphertext)?;
        }
        let eligible = u64::from(sum >= self.threshold);
        Ok(Self::encode(data_type, eligible))
    }

    async fn decrypt(
        &self,
        _identity: Address,
        data_type: DataType,
        encrypted_value: &Ciphertext,
    ) -> Result<u64, ComputeError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        Self::decode(data_type, encrypted_value)
    }
}
