// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DataType, TaskId};
use actix::Message;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A task was committed to the ledger by a client.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct TaskCreated {
    pub task_id: TaskId,
    pub client: Address,
    pub bank: Address,
    pub data_type: DataType,
    pub created_at: u64,
}

impl Display for TaskCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task_id: {}, client: {}, bank: {}, data_type: {}",
            self.task_id, self.client, self.bank, self.data_type
        )
    }
}
