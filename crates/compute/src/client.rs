// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::types::*;
use crate::{CipherCompute, ComputeError, FheKeys};
use alloy_primitives::Address;
use async_trait::async_trait;
use cb_events::{Ciphertext, DataType, TaskId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP/JSON client for the cipher-compute service.
#[derive(Clone)]
pub struct HttpComputeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpComputeClient {
    /// `timeout` bounds every call to the service; it is configured
    /// separately from ledger confirmation waits.
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, ComputeError> {
        // Url::join drops the last path segment unless it ends in '/';
        // "http://host/service" must become "http://host/service/".
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ComputeError::Service(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    async fn post<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, ComputeError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ComputeError::Service(e.to_string()))?;
        debug!(%url, "cipher-compute request");

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ComputeError::Service(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ComputeError::Rejected(format!("{status}: {detail}")));
        }
        if !status.is_success() {
            return Err(ComputeError::Service(format!("status {status}")));
        }
        response
            .json::<Res>()
            .await
            .map_err(|e| ComputeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CipherCompute for HttpComputeClient {
    async fn generate_keys(&self, identity: Address) -> Result<FheKeys, ComputeError> {
        self.post(
            "generate_keys",
            &GenerateKeysRequest {
                public_key: identity.to_string(),
            },
        )
        .await
    }

    async fn get_public_key(&self, identity: Address) -> Result<String, ComputeError> {
        let response: GetPublicKeyResponse = self
            .post(
                "get_public_key",
                &GetPublicKeyRequest {
                    public_key: identity.to_string(),
                },
            )
            .await?;
        Ok(response.fhe_public_key)
    }

    async fn encrypt(
        &self,
        identity: Address,
        data_type: DataType,
        value: u64,
    ) -> Result<Ciphertext, ComputeError> {
        let response: EncryptResponse = self
            .post(
                "encrypt",
                &EncryptRequest {
                    public_key: identity.to_string(),
                    data_type,
                    value,
                },
            )
            .await?;
        Ok(response.encrypted_value)
    }

    async fn compute(
        &self,
        identity: Address,
        task_id: &TaskId,
        data_type: DataType,
        encrypted_values: &[Ciphertext],
    ) -> Result<Ciphertext, ComputeError> {
        let response: ComputeResponse = self
            .post(
                "compute",
                &ComputeRequest {
                    public_key: identity.to_string(),
                    task_id: task_id.to_string(),
                    data_type,
                    encrypted_values: encrypted_values.to_vec(),
                },
            )
            .await?;
        Ok(response.result)
    }

    async fn decrypt(
        &self,
        identity: Address,
        data_type: DataType,
        encrypted_value: &Ciphertext,
    ) -> Result<u64, ComputeError> {
        let response: DecryptResponse = self
            .post(
                "decrypt",
                &DecryptRequest {
                    public_key: identity.to_string(),
                    data_type,
                    encrypted_value: encrypted_value.clone(),
                },
            )
            .await?;
        Ok(response.value)
    }
}
