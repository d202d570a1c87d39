use alloy_primitives::ruint::ParseError;
use alloy_primitives::U256;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Ledger-assigned task identifier, qualified by the chain it lives on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    id: String,
    chain_id: u64,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.id)
    }
}

impl TaskId {
    pub fn new(id: impl Into<String>, chain_id: u64) -> Self {
        Self {
            id: id.into(),
            chain_id,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.id
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl TryFrom<TaskId> for U256 {
    type Error = ParseError;
    fn try_from(value: TaskId) -> Result<Self, Self::Error> {
        U256::from_str_radix(&value.id, 10)
    }
}
