// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cb_compute::ComputeError;
use cb_events::{BridgeErrorType, DataType, TaskId};
use cb_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Every anchored record for the task's (owner, data type) is missing
    /// or expired. The task stays pending; the bank operator may decline.
    #[error("no non-expired record found for {owner} / {data_type}")]
    NoRecordFound { owner: Address, data_type: DataType },

    #[error("task {0} not found on ledger")]
    TaskNotFound(TaskId),

    /// The caller is not a valid party for this operation.
    #[error("{0}")]
    Rejected(String),

    /// Observed ledger state contradicts the expected lifecycle. Needs
    /// operator reconciliation; never auto-resolved.
    #[error("ledger state conflict: {0}")]
    Inconsistent(String),

    #[error("signing failed: {0}")]
    Signer(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl CoordinatorError {
    pub fn kind(&self) -> BridgeErrorType {
        match self {
            CoordinatorError::NoRecordFound { .. }
            | CoordinatorError::TaskNotFound(_)
            | CoordinatorError::Rejected(_) => BridgeErrorType::Rejection,
            CoordinatorError::Inconsistent(_) => BridgeErrorType::Inconsistent,
            CoordinatorError::Signer(_) => BridgeErrorType::Validation,
            CoordinatorError::Ledger(inner) => inner.kind(),
            CoordinatorError::Compute(inner) => inner.kind(),
        }
    }
}
