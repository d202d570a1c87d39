// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cb_events::{Ciphertext, DataType, TaskId};
use serde::{Deserialize, Serialize};

/// A wallet-bound identity registered on the ledger for one role,
/// paired with the FHE public key the cipher-compute service issued for
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub address: Address,
    pub fhe_public_key: String,
    pub is_active: bool,
}

/// An encrypted attribute value anchored on the ledger. Immutable once
/// written; expiry is enforced by consumers at read time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub owner: Address,
    pub producer: Address,
    pub data_type: DataType,
    pub ciphertext: Ciphertext,
    /// Ledger time (seconds) after which the record must not be consumed.
    pub expiry: u64,
}

impl EncryptedRecord {
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expiry
    }
}

/// The unit of cross-party work: one data-type-scoped computation request
/// from a client to a bank. Permanent ledger entry; never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub client: Address,
    pub bank: Address,
    pub data_type: DataType,
    pub is_completed: bool,
    pub is_published: bool,
    pub is_declined: bool,
    pub encrypted_result: Ciphertext,
    pub signature: String,
    pub decline_reason: String,
    pub created_at: u64,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        if self.is_declined {
            TaskStatus::Declined
        } else if self.is_published {
            TaskStatus::Published
        } else if self.is_completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }
    }

    /// `is_published ⇒ is_completed` and declined tasks carry no result.
    pub fn status_bits_consistent(&self) -> bool {
        (!self.is_published || self.is_completed)
            && (!self.is_declined || (!self.is_completed && !self.is_published))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Published,
    Declined,
}

/// Which side of a task a scoped list query looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleView {
    Client,
    Bank,
}

/// Status buckets for the scoped list queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    Pending,
    CompletedUnpublished,
    Published,
    Declined,
}

impl StatusBucket {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusBucket::Pending => task.status() == TaskStatus::Pending,
            StatusBucket::CompletedUnpublished => task.status() == TaskStatus::Completed,
            StatusBucket::Published => task.status() == TaskStatus::Published,
            StatusBucket::Declined => task.status() == TaskStatus::Declined,
        }
    }
}

impl RoleView {
    pub fn party_of<'t>(&self, task: &'t Task) -> &'t Address {
        match self {
            RoleView::Client => &task.client,
            RoleView::Bank => &task.bank,
        }
    }
}
