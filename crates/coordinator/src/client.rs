// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{sign_result, ClientSession, CoordinatorError, TaskCache};
use actix::prelude::*;
use anyhow::anyhow;
use cb_compute::CipherCompute;
use cb_events::{
    BridgeEvent, BusError, DataType, Die, EventBus, Subscribe, TaskId, TaskProgress, TaskStep,
};
use cb_ledger::{Ledger, RoleView, StatusBucket, Task, TaskStatus};
use alloy_primitives::Address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Create a new task against a bank. The assigned id comes back from the
/// ledger's commit event.
#[derive(Message)]
#[rtype(result = "Result<TaskId, CoordinatorError>")]
pub struct CreateTask {
    pub bank: Address,
    pub data_type: DataType,
}

/// Drive a completed task through the client-side transition: decrypt the
/// result locally, sign it, publish the attestation. Returns the
/// decrypted value; the plaintext never goes on-chain.
#[derive(Message)]
#[rtype(result = "Result<u64, CoordinatorError>")]
pub struct PublishResult {
    pub task_id: TaskId,
}

/// The client's view of its own tasks, served through the read-through
/// cache.
#[derive(Message)]
#[rtype(result = "Result<Vec<Task>, CoordinatorError>")]
pub struct ListClientTasks {
    pub bucket: StatusBucket,
}

/// Look up a previously decrypted result from the local session cache.
#[derive(Message)]
#[rtype(result = "Option<u64>")]
pub struct GetDecryptedResult {
    pub task_id: TaskId,
}

pub struct ClientCoordinator {
    session: ClientSession,
    ledger: Arc<dyn Ledger>,
    compute: Arc<dyn CipherCompute>,
    bus: Addr<EventBus<BridgeEvent>>,
    cache: Arc<TaskCache>,
    /// Session-local plaintext cache keyed by task id. Reconstructible by
    /// decrypting again; losing it costs convenience, not correctness.
    decrypted: Arc<Mutex<HashMap<TaskId, u64>>>,
}

impl ClientCoordinator {
    pub fn new(
        session: ClientSession,
        ledger: Arc<dyn Ledger>,
        compute: Arc<dyn CipherCompute>,
        bus: &Addr<EventBus<BridgeEvent>>,
    ) -> Self {
        let cache = Arc::new(TaskCache::new(session.address, RoleView::Client));
        Self {
            session,
            ledger,
            compute,
            bus: bus.clone(),
            cache,
            decrypted: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn attach(
        session: ClientSession,
        ledger: Arc<dyn Ledger>,
        compute: Arc<dyn CipherCompute>,
        bus: &Addr<EventBus<BridgeEvent>>,
    ) -> anyhow::Result<Addr<Self>> {
        let addr = Self::new(session, ledger, compute, bus).start();
        bus.send(Subscribe::new("*", addr.clone().recipient())).await?;
        Ok(addr)
    }
}

impl Actor for ClientCoordinator {
    type Context = Context<Self>;
}

impl Handler<BridgeEvent> for ClientCoordinator {
    type Result = ();

    fn handle(&mut self, msg: BridgeEvent, ctx: &mut Self::Context) -> Self::Result {
        match msg {
            BridgeEvent::TaskCreated { .. }
            | BridgeEvent::TaskCompleted { .. }
            | BridgeEvent::TaskPublished { .. }
            | BridgeEvent::TaskDeclined { .. } => self.cache.invalidate(),
            BridgeEvent::Shutdown { .. } => ctx.notify(Die),
            _ => (),
        }
    }
}

impl Handler<Die> for ClientCoordinator {
    type Result = ();
    fn handle(&mut self, _: Die, ctx: &mut Self::Context) -> Self::Result {
        warn!("ClientCoordinator is shutting down");
        ctx.stop()
    }
}

impl Handler<CreateTask> for ClientCoordinator {
    type Result = ResponseFuture<Result<TaskId, CoordinatorError>>;

    fn handle(&mut self, msg: CreateTask, _: &mut Self::Context) -> Self::Result {
        let ledger = self.ledger.clone();
        let bus = self.bus.clone();

        Box::pin(async move {
            let result = create_task(ledger, msg.bank, msg.data_type).await;
            if let Err(err) = &result {
                bus.err(err.kind(), anyhow!("{err}"));
            }
            result
        })
    }
}

impl Handler<PublishResult> for ClientCoordinator {
    type Result = ResponseFuture<Result<u64, CoordinatorError>>;

    fn handle(&mut self, msg: PublishResult, _: &mut Self::Context) -> Self::Result {
        let session = self.session.clone();
        let ledger = self.ledger.clone();
        let compute = self.compute.clone();
        let bus = self.bus.clone();
        let decrypted = self.decrypted.clone();

        Box::pin(async move {
            let result =
                publish_result(session, ledger, compute, &bus, decrypted, msg.task_id).await;
            if let Err(err) = &result {
                bus.err(err.kind(), anyhow!("{err}"));
            }
            result
        })
    }
}

impl Handler<ListClientTasks> for ClientCoordinator {
    type Result = ResponseFuture<Result<Vec<Task>, CoordinatorError>>;

    fn handle(&mut self, msg: ListClientTasks, _: &mut Self::Context) -> Self::Result {
        let ledger = self.ledger.clone();
        let cache = self.cache.clone();
        Box::pin(async move { Ok(cache.list(ledger.as_ref(), msg.bucket).await?) })
    }
}

impl Handler<GetDecryptedResult> for ClientCoordinator {
    type Result = Option<u64>;

    fn handle(&mut self, msg: GetDecryptedResult, _: &mut Self::Context) -> Self::Result {
        self.decrypted.lock().unwrap().get(&msg.task_id).copied()
    }
}

async fn create_task(
    ledger: Arc<dyn Ledger>,
    bank: Address,
    data_type: DataType,
) -> Result<TaskId, CoordinatorError> {
    // Validate the counterparty before spending a write on it.
    match ledger.bank_registration(bank).await? {
        Some(reg) if reg.is_active => {}
        _ => {
            return Err(CoordinatorError::Rejected(format!(
                "{} is not an active registered bank",
                bank
            )))
        }
    }
    let task_id = ledger.create_task(bank, data_type).await?;
    info!(task_id = %task_id, bank = %bank, data_type = %data_type, "Task created");
    Ok(task_id)
}

async fn publish_result(
    session: ClientSession,
    ledger: Arc<dyn Ledger>,
    compute: Arc<dyn CipherCompute>,
    bus: &Addr<EventBus<BridgeEvent>>,
    decrypted: Arc<Mutex<HashMap<TaskId, u64>>>,
    task_id: TaskId,
) -> Result<u64, CoordinatorError> {
    let task = ledger
        .task(&task_id)
        .await?
        .ok_or_else(|| CoordinatorError::TaskNotFound(task_id.clone()))?;

    if task.client != session.address {
        return Err(CoordinatorError::Rejected(format!(
            "{} is not the client for task {}",
            session.address, task_id
        )));
    }
    match task.status() {
        TaskStatus::Completed | TaskStatus::Published => {}
        TaskStatus::Pending => {
            return Err(CoordinatorError::Rejected(format!(
                "task {} has no result to publish yet",
                task_id
            )))
        }
        TaskStatus::Declined => {
            return Err(CoordinatorError::Rejected(format!(
                "task {} was declined by the bank",
                task_id
            )))
        }
    }

    // 1. Decrypt locally via the service. A value already decrypted in
    //    this session is reused rather than re-requested.
    let cached = decrypted.lock().unwrap().get(&task_id).copied();
    let value = match cached {
        Some(value) => value,
        None => {
            let value = compute
                .decrypt(session.address, task.data_type, &task.encrypted_result)
                .await?;
            decrypted.lock().unwrap().insert(task_id.clone(), value);
            bus.do_send(BridgeEvent::from(TaskProgress {
                task_id: task_id.clone(),
                step: TaskStep::ResultDecrypted,
            }));
            value
        }
    };

    // 2. Sign. Local, offline, deterministic; never retried against any
    //    remote service.
    let signature = sign_result(&session.signer, value)?;
    bus.do_send(BridgeEvent::from(TaskProgress {
        task_id: task_id.clone(),
        step: TaskStep::ResultSigned,
    }));

    // 3. Commit. Re-read immediately before the write: a racing session
    //    may have published while we were decrypting.
    let current = ledger
        .task(&task_id)
        .await?
        .ok_or_else(|| CoordinatorError::TaskNotFound(task_id.clone()))?;
    if current.is_published {
        if current.signature == signature {
            info!(task_id = %task_id, "Task already published with identical signature; treating as success");
            return Ok(value);
        }
        return Err(CoordinatorError::Inconsistent(format!(
            "task {} was published by another session with a different signature",
            task_id
        )));
    }

    ledger.publish_task(&task_id, &signature).await?;
    info!(task_id = %task_id, "Task published on ledger");
    Ok(value)
}
