// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cb_events::{Ciphertext, DataType};
use std::collections::VecDeque;

/// One encryption the pipeline performed, for UI replay. Newest first.
/// Not authoritative: the ledger's record store is, and this log can be
/// rebuilt from it plus the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub owner: Address,
    pub data_type: DataType,
    pub ciphertext: Ciphertext,
    pub anchored: bool,
    /// Set once the record is anchored.
    pub expiry: Option<u64>,
}

pub(crate) struct EncryptionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl EncryptionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Mark the entry holding `ciphertext` as anchored, or record a fresh
    /// anchored entry if the ciphertext was produced elsewhere.
    pub fn mark_anchored(
        &mut self,
        owner: Address,
        data_type: DataType,
        ciphertext: &Ciphertext,
        expiry: u64,
    ) {
        for entry in &mut self.entries {
            if &entry.ciphertext == ciphertext {
                entry.anchored = true;
                entry.expiry = Some(expiry);
                return;
            }
        }
        self.push(HistoryEntry {
            owner,
            data_type,
            ciphertext: ciphertext.clone(),
            anchored: true,
            expiry: Some(expiry),
        });
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}
