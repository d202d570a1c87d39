// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BankSession, CoordinatorError, TaskCache};
use actix::prelude::*;
use anyhow::anyhow;
use cb_compute::CipherCompute;
use cb_events::{
    BridgeEvent, BusError, Ciphertext, Die, EventBus, Subscribe, TaskId, TaskProgress, TaskStep,
};
use cb_ledger::{Ledger, RoleView, StatusBucket, Task, TaskStatus};
use std::sync::Arc;
use tracing::{info, warn};

/// Drive a pending task through the bank-side transition: fetch the
/// client's live records, request the homomorphic computation, commit the
/// encrypted result. Retryable end to end; the ledger write is the sole
/// authority for the `Completed` transition.
#[derive(Message)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct ProcessTask {
    pub task_id: TaskId,
}

/// Explicitly refuse a pending task. Terminal; an operator decision,
/// never issued automatically.
#[derive(Message)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct DeclineTask {
    pub task_id: TaskId,
    pub reason: String,
}

/// The bank's view of its own tasks, served through the read-through
/// cache.
#[derive(Message)]
#[rtype(result = "Result<Vec<Task>, CoordinatorError>")]
pub struct ListBankTasks {
    pub bucket: StatusBucket,
}

pub struct BankCoordinator {
    session: BankSession,
    ledger: Arc<dyn Ledger>,
    compute: Arc<dyn CipherCompute>,
    bus: Addr<EventBus<BridgeEvent>>,
    cache: Arc<TaskCache>,
}

impl BankCoordinator {
    pub fn new(
        session: BankSession,
        ledger: Arc<dyn Ledger>,
        compute: Arc<dyn CipherCompute>,
        bus: &Addr<EventBus<BridgeEvent>>,
    ) -> Self {
        let cache = Arc::new(TaskCache::new(session.address, RoleView::Bank));
        Self {
            session,
            ledger,
            compute,
            bus: bus.clone(),
            cache,
        }
    }

    pub async fn attach(
        session: BankSession,
        ledger: Arc<dyn Ledger>,
        compute: Arc<dyn CipherCompute>,
        bus: &Addr<EventBus<BridgeEvent>>,
    ) -> anyhow::Result<Addr<Self>> {
        let addr = Self::new(session, ledger, compute, bus).start();
        bus.send(Subscribe::new("*", addr.clone().recipient())).await?;
        Ok(addr)
    }
}

impl Actor for BankCoordinator {
    type Context = Context<Self>;
}

impl Handler<BridgeEvent> for BankCoordinator {
    type Result = ();

    fn handle(&mut self, msg: BridgeEvent, ctx: &mut Self::Context) -> Self::Result {
        match msg {
            // Any observed commit may move tasks between buckets,
            // whichever party wrote it.
            BridgeEvent::TaskCreated { .. }
            | BridgeEvent::TaskCompleted { .. }
            | BridgeEvent::TaskPublished { .. }
            | BridgeEvent::TaskDeclined { .. } => self.cache.invalidate(),
            BridgeEvent::Shutdown { .. } => ctx.notify(Die),
            _ => (),
        }
    }
}

impl Handler<Die> for BankCoordinator {
    type Result = ();
    fn handle(&mut self, _: Die, ctx: &mut Self::Context) -> Self::Result {
        warn!("BankCoordinator is shutting down");
        ctx.stop()
    }
}

impl Handler<ProcessTask> for BankCoordinator {
    type Result = ResponseFuture<Result<(), CoordinatorError>>;

    fn handle(&mut self, msg: ProcessTask, _: &mut Self::Context) -> Self::Result {
        let session = self.session;
        let ledger = self.ledger.clone();
        let compute = self.compute.clone();
        let bus = self.bus.clone();

        Box::pin(async move {
            let result = process_task(session, ledger, compute, &bus, msg.task_id).await;
            if let Err(err) = &result {
                bus.err(err.kind(), anyhow!("{err}"));
            }
            result
        })
    }
}

impl Handler<DeclineTask> for BankCoordinator {
    type Result = ResponseFuture<Result<(), CoordinatorError>>;

    fn handle(&mut self, msg: DeclineTask, _: &mut Self::Context) -> Self::Result {
        let session = self.session;
        let ledger = self.ledger.clone();
        let bus = self.bus.clone();

        Box::pin(async move {
            let result = decline_task(session, ledger, msg.task_id, msg.reason).await;
            if let Err(err) = &result {
                bus.err(err.kind(), anyhow!("{err}"));
            }
            result
        })
    }
}

impl Handler<ListBankTasks> for BankCoordinator {
    type Result = ResponseFuture<Result<Vec<Task>, CoordinatorError>>;

    fn handle(&mut self, msg: ListBankTasks, _: &mut Self::Context) -> Self::Result {
        let ledger = self.ledger.clone();
        let cache = self.cache.clone();
        Box::pin(async move { Ok(cache.list(ledger.as_ref(), msg.bucket).await?) })
    }
}

/// Re-read the task and check it is still ours to process. Returns None
/// when there is nothing left to do (another session already finished).
async fn load_pending_task(
    session: BankSession,
    ledger: &dyn Ledger,
    task_id: &TaskId,
) -> Result<Option<Task>, CoordinatorError> {
    let task = ledger
        .task(task_id)
        .await?
        .ok_or_else(|| CoordinatorError::TaskNotFound(task_id.clone()))?;

    if task.bank != session.address {
        return Err(CoordinatorError::Rejected(format!(
            "{} is not the bank for task {}",
            session.address, task_id
        )));
    }
    match task.status() {
        TaskStatus::Pending => Ok(Some(task)),
        status => {
            info!(task_id = %task_id, ?status, "Nothing to process; task is no longer pending");
            Ok(None)
        }
    }
}

async fn process_task(
    session: BankSession,
    ledger: Arc<dyn Ledger>,
    compute: Arc<dyn CipherCompute>,
    bus: &Addr<EventBus<BridgeEvent>>,
    task_id: TaskId,
) -> Result<(), CoordinatorError> {
    let Some(task) = load_pending_task(session, ledger.as_ref(), &task_id).await? else {
        return Ok(());
    };

    // An inactive client must not be serviced even though the task still
    // references it.
    match ledger.client_registration(task.client).await? {
        Some(reg) if reg.is_active => {}
        _ => {
            return Err(CoordinatorError::Rejected(format!(
                "client {} is not an active registered counterparty",
                task.client
            )))
        }
    }

    // 1. Fetch the client's records, dropping anything expired at read
    //    time.
    let now = ledger.current_time().await?;
    let records = ledger.records_by_owner(task.client, task.data_type).await?;
    let live: Vec<Ciphertext> = records
        .iter()
        .filter(|record| !record.is_expired(now))
        .map(|record| record.ciphertext.clone())
        .collect();
    if live.is_empty() {
        return Err(CoordinatorError::NoRecordFound {
            owner: task.client,
            data_type: task.data_type,
        });
    }
    bus.do_send(BridgeEvent::from(TaskProgress {
        task_id: task_id.clone(),
        step: TaskStep::RecordsFetched,
    }));

    // 2. Request the computation. The task id is the idempotency token:
    //    a retry after a lost response is recognized by the service.
    let encrypted_result = compute
        .compute(session.address, &task_id, task.data_type, &live)
        .await?;
    if encrypted_result.is_empty() {
        return Err(CoordinatorError::Inconsistent(
            "compute service returned an empty result".into(),
        ));
    }
    bus.do_send(BridgeEvent::from(TaskProgress {
        task_id: task_id.clone(),
        step: TaskStep::ComputeRequested,
    }));

    // 3. Commit. Re-read immediately before the write: a racing session
    //    may have completed the task while we were computing.
    let current = ledger
        .task(&task_id)
        .await?
        .ok_or_else(|| CoordinatorError::TaskNotFound(task_id.clone()))?;
    if current.is_declined {
        return Err(CoordinatorError::Inconsistent(format!(
            "task {} was declined while being processed",
            task_id
        )));
    }
    if current.is_completed {
        if current.encrypted_result == encrypted_result {
            info!(task_id = %task_id, "Task already completed with identical result; treating as success");
            return Ok(());
        }
        return Err(CoordinatorError::Inconsistent(format!(
            "task {} was completed by another session with a different result",
            task_id
        )));
    }

    ledger.complete_task(&task_id, encrypted_result).await?;
    info!(task_id = %task_id, "Task completed on ledger");
    Ok(())
}

async fn decline_task(
    session: BankSession,
    ledger: Arc<dyn Ledger>,
    task_id: TaskId,
    reason: String,
) -> Result<(), CoordinatorError> {
    let Some(_) = load_pending_task(session, ledger.as_ref(), &task_id).await? else {
        return Err(CoordinatorError::Inconsistent(format!(
            "task {} is no longer pending and cannot be declined",
            task_id
        )));
    };
    ledger.decline_task(&task_id, &reason).await?;
    info!(task_id = %task_id, reason, "Task declined on ledger");
    Ok(())
}
