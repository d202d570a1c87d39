// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::TaskId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A lifecycle sub-step that completed without (yet) changing ledger state.
/// Ledger transitions themselves are announced by the commit events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStep {
    RecordsFetched,
    ComputeRequested,
    ResultDecrypted,
    ResultSigned,
}

impl Display for TaskStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStep::RecordsFetched => "records_fetched",
            TaskStep::ComputeRequested => "compute_requested",
            TaskStep::ResultDecrypted => "result_decrypted",
            TaskStep::ResultSigned => "result_signed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct TaskProgress {
    pub task_id: TaskId,
    pub step: TaskStep,
}

impl Display for TaskProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_id: {}, step: {}", self.task_id, self.step)
    }
}
