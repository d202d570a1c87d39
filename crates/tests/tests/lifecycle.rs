// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Addr;
use anyhow::Result;
use cb_coordinator::{
    BankCoordinator, BankSession, ClientCoordinator, ClientSession, CreateTask, DeclineTask,
    GetDecryptedResult, ListBankTasks, ListClientTasks, ProcessTask, PublishResult,
};
use cb_events::{
    new_event_bus_with_history, BridgeEvent, DataType, Event, GetErrors, GetEvents,
    HistoryCollector, TaskStep,
};
use cb_ledger::{InMemLedger, Ledger, StatusBucket, TaskStatus};
use cb_logger::SimpleLogger;
use cb_pipeline::SubmissionPipeline;
use cb_test_helpers::{rand_eth_addr, rand_signer, StubCompute};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const CHAIN_ID: u64 = 31337;
const ELIGIBILITY_THRESHOLD: u64 = 30_000;
const THIRTY_DAYS: u64 = 30 * 24 * 60 * 60;

struct Party {
    history: Addr<HistoryCollector<BridgeEvent>>,
    ledger: Arc<InMemLedger>,
}

struct World {
    root: InMemLedger,
    compute: Arc<StubCompute>,
    client_session: ClientSession,
    bank_session: BankSession,
    client: Party,
    bank: Party,
    client_coordinator: Addr<ClientCoordinator>,
    bank_coordinator: Addr<BankCoordinator>,
}

/// Two registered parties, each with its own session, bus and ledger
/// handle over one shared in-memory ledger.
async fn setup() -> Result<World> {
    let root = InMemLedger::new(CHAIN_ID);
    let compute = Arc::new(StubCompute::new(ELIGIBILITY_THRESHOLD));

    let client_session = ClientSession::new(rand_signer());
    let bank_session = BankSession::new(rand_eth_addr());

    let (client_bus, client_history) = new_event_bus_with_history::<BridgeEvent>();
    let (bank_bus, bank_history) = new_event_bus_with_history::<BridgeEvent>();
    SimpleLogger::attach("client", client_bus.clone());
    SimpleLogger::attach("bank", bank_bus.clone());

    let client_ledger = Arc::new(root.connect(client_session.address));
    let bank_ledger = Arc::new(root.connect(bank_session.address));
    root.observe(client_bus.clone().recipient());
    root.observe(bank_bus.clone().recipient());

    client_ledger.register_client("fhe-pk-client").await?;
    bank_ledger.register_bank("fhe-pk-bank").await?;

    let client_coordinator = ClientCoordinator::attach(
        client_session.clone(),
        client_ledger.clone() as Arc<dyn Ledger>,
        compute.clone(),
        &client_bus,
    )
    .await?;
    let bank_coordinator = BankCoordinator::attach(
        bank_session,
        bank_ledger.clone() as Arc<dyn Ledger>,
        compute.clone(),
        &bank_bus,
    )
    .await?;

    Ok(World {
        root,
        compute,
        client_session,
        bank_session,
        client: Party {
            history: client_history,
            ledger: client_ledger,
        },
        bank: Party {
            history: bank_history,
            ledger: bank_ledger,
        },
        client_coordinator,
        bank_coordinator,
    })
}

fn count_events(events: &[BridgeEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}

#[actix::test]
#[serial_test::serial]
async fn test_end_to_end_lifecycle() -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let world = setup().await?;

    ///////////////////////////////////////////////////////////////////////
    // 1. The bank encrypts and anchors the client's income on the ledger
    ///////////////////////////////////////////////////////////////////////
    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        world.bank.ledger.clone() as Arc<dyn Ledger>,
    );
    let record = pipeline
        .submit(
            world.client_session.address,
            DataType::MonthlyIncome,
            50_000,
            THIRTY_DAYS,
        )
        .await?;
    assert_eq!(record.producer, world.bank_session.address);

    ///////////////////////////////////////////////////////////////////////
    // 2. The client requests an eligibility computation from the bank
    ///////////////////////////////////////////////////////////////////////
    let task_id = world
        .client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::MonthlyIncome,
        })
        .await??;
    sleep(Duration::from_millis(50)).await;

    // Both parties see it pending in their scoped views.
    let pending = world
        .bank_coordinator
        .send(ListBankTasks {
            bucket: StatusBucket::Pending,
        })
        .await??;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, task_id);

    ///////////////////////////////////////////////////////////////////////
    // 3. The bank fetches records, computes, and commits the result
    ///////////////////////////////////////////////////////////////////////
    world
        .bank_coordinator
        .send(ProcessTask {
            task_id: task_id.clone(),
        })
        .await??;
    sleep(Duration::from_millis(50)).await;

    let task = world.bank.ledger.task(&task_id).await?.unwrap();
    assert_eq!(task.status(), TaskStatus::Completed);
    assert!(task.status_bits_consistent());

    // The completion moved the task out of the cached pending bucket.
    let pending = world
        .bank_coordinator
        .send(ListBankTasks {
            bucket: StatusBucket::Pending,
        })
        .await??;
    assert!(pending.is_empty());

    ///////////////////////////////////////////////////////////////////////
    // 4. The client decrypts, signs, and publishes the attestation
    ///////////////////////////////////////////////////////////////////////
    let value = world
        .client_coordinator
        .send(PublishResult {
            task_id: task_id.clone(),
        })
        .await??;
    assert_eq!(value, 1, "income 50k clears a 30k eligibility threshold");
    sleep(Duration::from_millis(50)).await;

    let task = world.client.ledger.task(&task_id).await?.unwrap();
    assert_eq!(task.status(), TaskStatus::Published);
    assert!(task.is_completed, "published implies completed");
    // Only the signature landed on the ledger, never the plaintext.
    assert!(task.signature.starts_with("0x"));
    assert_ne!(task.signature, "1");

    let cached = world
        .client_coordinator
        .send(GetDecryptedResult {
            task_id: task_id.clone(),
        })
        .await?;
    assert_eq!(cached, Some(1));

    ///////////////////////////////////////////////////////////////////////
    // 5. Terminal state is visible to both roles, only as published
    ///////////////////////////////////////////////////////////////////////
    for bucket in [
        StatusBucket::Pending,
        StatusBucket::CompletedUnpublished,
        StatusBucket::Declined,
    ] {
        let client_view = world
            .client_coordinator
            .send(ListClientTasks { bucket })
            .await??;
        let bank_view = world
            .bank_coordinator
            .send(ListBankTasks { bucket })
            .await??;
        assert!(client_view.is_empty());
        assert!(bank_view.is_empty());
    }
    let client_published = world
        .client_coordinator
        .send(ListClientTasks {
            bucket: StatusBucket::Published,
        })
        .await??;
    let bank_published = world
        .bank_coordinator
        .send(ListBankTasks {
            bucket: StatusBucket::Published,
        })
        .await??;
    assert_eq!(client_published.len(), 1);
    assert_eq!(bank_published.len(), 1);

    ///////////////////////////////////////////////////////////////////////
    // 6. Every commit and sub-step was observable; no errors surfaced
    ///////////////////////////////////////////////////////////////////////
    let events = world.client.history.send(GetEvents::new()).await?;
    assert_eq!(count_events(&events, "RecordAnchored"), 1);
    assert_eq!(count_events(&events, "TaskCreated"), 1);
    assert_eq!(count_events(&events, "TaskCompleted"), 1);
    assert_eq!(count_events(&events, "TaskPublished"), 1);
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            BridgeEvent::TaskProgress { data, .. } => Some(data.step),
            _ => None,
        })
        .collect();
    assert!(progress.contains(&TaskStep::ResultDecrypted));
    assert!(progress.contains(&TaskStep::ResultSigned));

    let bank_events = world.bank.history.send(GetEvents::new()).await?;
    let bank_progress: Vec<_> = bank_events
        .iter()
        .filter_map(|e| match e {
            BridgeEvent::TaskProgress { data, .. } => Some(data.step),
            _ => None,
        })
        .collect();
    assert!(bank_progress.contains(&TaskStep::RecordsFetched));
    assert!(bank_progress.contains(&TaskStep::ComputeRequested));

    let errors = world.client.history.send(GetErrors::new()).await?;
    assert!(errors.is_empty());
    let errors = world.bank.history.send(GetErrors::new()).await?;
    assert!(errors.is_empty());

    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_foreign_bank_cannot_complete() -> Result<()> {
    let world = setup().await?;
    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        world.bank.ledger.clone() as Arc<dyn Ledger>,
    );
    pipeline
        .submit(
            world.client_session.address,
            DataType::CreditScore,
            700,
            THIRTY_DAYS,
        )
        .await?;
    let task_id = world
        .client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::CreditScore,
        })
        .await??;

    // A different registered bank drives its own coordinator at the task.
    let intruder_session = BankSession::new(rand_eth_addr());
    let intruder_ledger = Arc::new(world.root.connect(intruder_session.address));
    intruder_ledger.register_bank("fhe-pk-intruder").await?;
    let (intruder_bus, _) = new_event_bus_with_history::<BridgeEvent>();
    let intruder = BankCoordinator::attach(
        intruder_session,
        intruder_ledger as Arc<dyn Ledger>,
        world.compute.clone(),
        &intruder_bus,
    )
    .await?;

    let result = intruder
        .send(ProcessTask {
            task_id: task_id.clone(),
        })
        .await?;
    assert!(result.is_err(), "foreign bank must be refused");

    let task = world.client.ledger.task(&task_id).await?.unwrap();
    assert_eq!(task.status(), TaskStatus::Pending, "task is untouched");
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_inactive_client_is_not_serviced() -> Result<()> {
    let world = setup().await?;
    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        world.bank.ledger.clone() as Arc<dyn Ledger>,
    );
    pipeline
        .submit(
            world.client_session.address,
            DataType::MonthlyIncome,
            50_000,
            THIRTY_DAYS,
        )
        .await?;
    let task_id = world
        .client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::MonthlyIncome,
        })
        .await??;

    // Deactivated after task creation: the task still references the
    // client but it must no longer be treated as a valid counterparty.
    world
        .root
        .set_client_active(world.client_session.address, false);

    let result = world
        .bank_coordinator
        .send(ProcessTask {
            task_id: task_id.clone(),
        })
        .await?;
    assert!(result.is_err());
    let task = world.bank.ledger.task(&task_id).await?.unwrap();
    assert_eq!(task.status(), TaskStatus::Pending);
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_decline_is_terminal() -> Result<()> {
    let world = setup().await?;
    let task_id = world
        .client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::PropertyValue,
        })
        .await??;

    // No record was ever anchored; processing surfaces the gap and leaves
    // the task pending.
    let result = world
        .bank_coordinator
        .send(ProcessTask {
            task_id: task_id.clone(),
        })
        .await?;
    assert!(result.is_err());
    assert_eq!(
        world.bank.ledger.task(&task_id).await?.unwrap().status(),
        TaskStatus::Pending
    );

    // Declining is an explicit operator decision.
    world
        .bank_coordinator
        .send(DeclineTask {
            task_id: task_id.clone(),
            reason: "no usable records".into(),
        })
        .await??;
    sleep(Duration::from_millis(50)).await;

    let task = world.client.ledger.task(&task_id).await?.unwrap();
    assert_eq!(task.status(), TaskStatus::Declined);
    assert!(task.status_bits_consistent());

    // Terminal: it cannot be completed, published, or re-declined.
    let complete = world
        .bank_coordinator
        .send(ProcessTask {
            task_id: task_id.clone(),
        })
        .await?;
    assert!(complete.is_ok(), "processing a declined task is a no-op");
    let publish = world
        .client_coordinator
        .send(PublishResult {
            task_id: task_id.clone(),
        })
        .await?;
    assert!(publish.is_err());
    let redecline = world
        .bank_coordinator
        .send(DeclineTask {
            task_id: task_id.clone(),
            reason: "again".into(),
        })
        .await?;
    assert!(redecline.is_err());
    assert_eq!(
        world.client.ledger.task(&task_id).await?.unwrap().status(),
        TaskStatus::Declined
    );
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_publish_requires_a_completed_task() -> Result<()> {
    let world = setup().await?;
    let task_id = world
        .client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::MonthlyIncome,
        })
        .await??;

    let result = world
        .client_coordinator
        .send(PublishResult {
            task_id: task_id.clone(),
        })
        .await?;
    assert!(result.is_err(), "nothing to publish on a pending task");

    let task = world.client.ledger.task(&task_id).await?.unwrap();
    assert_eq!(task.status(), TaskStatus::Pending);
    assert!(!task.is_published);
    Ok(())
}
