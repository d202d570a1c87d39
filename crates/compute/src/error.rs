// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cb_events::BridgeErrorType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
    /// The service refused the request on policy grounds (unregistered
    /// party, unsupported data type). Never retried automatically.
    #[error("compute service rejected the request: {0}")]
    Rejected(String),

    /// Transport failure or 5xx. Eligible for manual retry; compute
    /// requests are idempotent per task id.
    #[error("compute service unavailable: {0}")]
    Service(String),

    #[error("compute service returned a malformed response: {0}")]
    Decode(String),
}

impl ComputeError {
    pub fn kind(&self) -> BridgeErrorType {
        match self {
            ComputeError::Rejected(_) => BridgeErrorType::Rejection,
            ComputeError::Service(_) | ComputeError::Decode(_) => BridgeErrorType::Transient,
        }
    }
}
