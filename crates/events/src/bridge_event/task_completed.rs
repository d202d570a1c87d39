// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Ciphertext, TaskId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The task's bank committed an encrypted result to the ledger.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct TaskCompleted {
    pub task_id: TaskId,
    pub encrypted_result: Ciphertext,
}

impl Display for TaskCompleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task_id: {}, encrypted_result: {}",
            self.task_id, self.encrypted_result
        )
    }
}
