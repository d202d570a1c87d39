// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::TaskId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The task's bank declined to service the task. Terminal.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct TaskDeclined {
    pub task_id: TaskId,
    pub reason: String,
}

impl Display for TaskDeclined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_id: {}, reason: {}", self.task_id, self.reason)
    }
}
