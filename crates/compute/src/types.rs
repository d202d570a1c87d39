// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Wire types matching the cipher-compute service's JSON schema.

use cb_events::{Ciphertext, DataType};
use serde::{Deserialize, Serialize};

/// Key pair issued by the service for a wallet identity.
#[derive(Clone, Debug, Deserialize)]
pub struct FheKeys {
    pub fhe_public_key: String,
    pub client_key: String,
}

#[derive(Serialize)]
pub(crate) struct GenerateKeysRequest {
    pub public_key: String,
}

#[derive(Serialize)]
pub(crate) struct GetPublicKeyRequest {
    pub public_key: String,
}

#[derive(Deserialize)]
pub(crate) struct GetPublicKeyResponse {
    pub fhe_public_key: String,
}

#[derive(Serialize)]
pub(crate) struct EncryptRequest {
    pub public_key: String,
    pub data_type: DataType,
    pub value: u64,
}

#[derive(Deserialize)]
pub(crate) struct EncryptResponse {
    pub encrypted_value: Ciphertext,
}

#[derive(Serialize)]
pub(crate) struct ComputeRequest {
    pub public_key: String,
    /// Caller-chosen correlation token; retried requests with the same
    /// task id are recognized as equivalent by the service.
    pub task_id: String,
    pub data_type: DataType,
    pub encrypted_values: Vec<Ciphertext>,
}

#[derive(Deserialize)]
pub(crate) struct ComputeResponse {
    pub result: Ciphertext,
}

#[derive(Serialize)]
pub(crate) struct DecryptRequest {
    pub public_key: String,
    pub data_type: DataType,
    pub encrypted_value: Ciphertext,
}

#[derive(Deserialize)]
pub(crate) struct DecryptResponse {
    pub value: u64,
}
