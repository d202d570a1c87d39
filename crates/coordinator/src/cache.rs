// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cb_ledger::{Ledger, LedgerError, RoleView, StatusBucket, Task};
use std::collections::HashMap;
use std::sync::Mutex;

/// Read-through cache over the scoped task list queries, keyed by status
/// bucket for one (identity, role). Never authoritative: coordinators
/// bypass it and re-read the ledger before any state-changing write, and
/// every observed commit event invalidates it.
pub struct TaskCache {
    party: Address,
    view: RoleView,
    buckets: Mutex<HashMap<StatusBucket, Vec<Task>>>,
}

impl TaskCache {
    pub fn new(party: Address, view: RoleView) -> Self {
        Self {
            party,
            view,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub async fn list(
        &self,
        ledger: &dyn Ledger,
        bucket: StatusBucket,
    ) -> Result<Vec<Task>, LedgerError> {
        if let Some(hit) = self.buckets.lock().unwrap().get(&bucket) {
            return Ok(hit.clone());
        }
        let fresh = ledger.list_tasks(self.party, self.view, bucket).await?;
        self.buckets
            .lock()
            .unwrap()
            .insert(bucket, fresh.clone());
        Ok(fresh)
    }

    pub fn invalidate(&self) {
        self.buckets.lock().unwrap().clear();
    }
}
