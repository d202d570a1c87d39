// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::TaskId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The task's client committed a result attestation, closing the task.
/// Only the signature goes on-chain; the plaintext stays with the client.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct TaskPublished {
    pub task_id: TaskId,
    pub signature: String,
}

impl Display for TaskPublished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_id: {}, signature: <omitted>", self.task_id)
    }
}
