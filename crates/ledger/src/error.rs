// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cb_events::BridgeErrorType;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Business-rule refusal. Never retried automatically.
    #[error("rejected by ledger: {0}")]
    Rejected(String),

    /// The write may or may not have applied. Callers must re-read task
    /// state before retrying the same write.
    #[error("ledger write unconfirmed after {0:?}")]
    Unconfirmed(Duration),

    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("could not decode ledger response: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn kind(&self) -> BridgeErrorType {
        match self {
            LedgerError::Rejected(_) => BridgeErrorType::Rejection,
            LedgerError::Unconfirmed(_) | LedgerError::Transport(_) => BridgeErrorType::Transient,
            LedgerError::Decode(_) => BridgeErrorType::Transient,
        }
    }
}
