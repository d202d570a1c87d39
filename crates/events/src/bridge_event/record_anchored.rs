// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DataType;
use actix::Message;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// An encrypted record was anchored to the ledger for an owner.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct RecordAnchored {
    pub owner: Address,
    pub producer: Address,
    pub data_type: DataType,
    pub expiry: u64,
}

impl Display for RecordAnchored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "owner: {}, producer: {}, data_type: {}, expiry: {}",
            self.owner, self.producer, self.data_type, self.expiry
        )
    }
}
