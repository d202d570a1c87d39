// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cb_events::{BridgeErrorType, InvalidDataType};
use cb_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("key service unavailable: {0}")]
    KeyServiceUnavailable(String),

    #[error(transparent)]
    InvalidDataType(#[from] InvalidDataType),

    #[error("encryption service error: {0}")]
    EncryptionServiceError(String),

    /// The submitting identity is not an active registered producer for
    /// the target owner.
    #[error("unauthorized producer: {0}")]
    UnauthorizedProducer(String),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl PipelineError {
    pub fn kind(&self) -> BridgeErrorType {
        match self {
            PipelineError::InvalidDataType(_) => BridgeErrorType::Validation,
            PipelineError::UnauthorizedProducer(_) => BridgeErrorType::Rejection,
            PipelineError::KeyServiceUnavailable(_) | PipelineError::EncryptionServiceError(_) => {
                BridgeErrorType::Transient
            }
            PipelineError::Ledger(inner) => inner.kind(),
        }
    }
}
