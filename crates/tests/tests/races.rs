// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Racing-session behavior: a second session attempting the same ledger
//! transition must observe success-as-no-op when its parameters are
//! identical, and a surfaced conflict when they are not. The rival's
//! write is injected between the coordinator's entry read and its
//! guarded re-read.

use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use cb_coordinator::{
    sign_result, BankCoordinator, BankSession, ClientCoordinator, ClientSession, CreateTask,
    ProcessTask, PublishResult,
};
use cb_events::{
    new_event_bus_with_history, BridgeEvent, Ciphertext, DataType, Event, GetEvents, TaskId,
};
use cb_ledger::{
    EncryptedRecord, InMemLedger, Ledger, LedgerError, Registration, RoleView, StatusBucket, Task,
    TaskStatus,
};
use cb_test_helpers::{rand_eth_addr, rand_signer, StubCompute};
use std::sync::{Arc, Mutex};

const CHAIN_ID: u64 = 31337;
const TTL: u64 = 60 * 60;

enum RivalAction {
    /// Complete the task through another session while the observed
    /// session is between fetching records and committing.
    CompleteOnFetch {
        rival: Arc<InMemLedger>,
        task_id: TaskId,
        result: Ciphertext,
    },
    /// Publish the task through another session while the observed
    /// session is between its entry read and its guarded re-read.
    PublishOnRead {
        rival: Arc<InMemLedger>,
        task_id: TaskId,
        signature: String,
    },
}

/// Delegates to the shared in-memory ledger, firing the armed rival write
/// at the chosen interleaving point exactly once.
struct RacingLedger {
    inner: Arc<InMemLedger>,
    action: Mutex<Option<RivalAction>>,
}

impl RacingLedger {
    fn new(inner: Arc<InMemLedger>) -> Self {
        Self {
            inner,
            action: Mutex::new(None),
        }
    }

    fn arm(&self, action: RivalAction) {
        *self.action.lock().unwrap() = Some(action);
    }

    fn take_if<F: Fn(&RivalAction) -> bool>(&self, pred: F) -> Option<RivalAction> {
        let mut slot = self.action.lock().unwrap();
        if slot.as_ref().is_some_and(pred) {
            slot.take()
        } else {
            None
        }
    }
}

#[async_trait]
impl Ledger for RacingLedger {
    fn signer_address(&self) -> Address {
        self.inner.signer_address()
    }

    fn chain_id(&self) -> u64 {
        self.inner.chain_id()
    }

    async fn current_time(&self) -> Result<u64, LedgerError> {
        self.inner.current_time().await
    }

    async fn register_client(&self, fhe_public_key: &str) -> Result<(), LedgerError> {
        self.inner.register_client(fhe_public_key).await
    }

    async fn register_bank(&self, fhe_public_key: &str) -> Result<(), LedgerError> {
        self.inner.register_bank(fhe_public_key).await
    }

    async fn client_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError> {
        self.inner.client_registration(address).await
    }

    async fn bank_registration(
        &self,
        address: Address,
    ) -> Result<Option<Registration>, LedgerError> {
        self.inner.bank_registration(address).await
    }

    async fn store_record(
        &self,
        owner: Address,
        data_type: DataType,
        expiry: u64,
        ciphertext: Ciphertext,
    ) -> Result<EncryptedRecord, LedgerError> {
        self.inner
            .store_record(owner, data_type, expiry, ciphertext)
            .await
    }

    async fn records_by_owner(
        &self,
        owner: Address,
        data_type: DataType,
    ) -> Result<Vec<EncryptedRecord>, LedgerError> {
        let records = self.inner.records_by_owner(owner, data_type).await?;
        if let Some(RivalAction::CompleteOnFetch {
            rival,
            task_id,
            result,
        }) = self.take_if(|a| matches!(a, RivalAction::CompleteOnFetch { .. }))
        {
            rival.complete_task(&task_id, result).await?;
        }
        Ok(records)
    }

    async fn create_task(
        &self,
        bank: Address,
        data_type: DataType,
    ) -> Result<TaskId, LedgerError> {
        self.inner.create_task(bank, data_type).await
    }

    async fn task(&self, task_id: &TaskId) -> Result<Option<Task>, LedgerError> {
        let task = self.inner.task(task_id).await?;
        if let Some(RivalAction::PublishOnRead {
            rival,
            task_id: armed_id,
            signature,
        }) = self.take_if(
            |a| matches!(a, RivalAction::PublishOnRead { task_id: id, .. } if id == task_id),
        ) {
            debug_assert_eq!(&armed_id, task_id);
            rival.publish_task(&armed_id, &signature).await?;
        }
        Ok(task)
    }

    async fn complete_task(
        &self,
        task_id: &TaskId,
        encrypted_result: Ciphertext,
    ) -> Result<(), LedgerError> {
        self.inner.complete_task(task_id, encrypted_result).await
    }

    async fn publish_task(&self, task_id: &TaskId, signature: &str) -> Result<(), LedgerError> {
        self.inner.publish_task(task_id, signature).await
    }

    async fn decline_task(&self, task_id: &TaskId, reason: &str) -> Result<(), LedgerError> {
        self.inner.decline_task(task_id, reason).await
    }

    async fn list_tasks(
        &self,
        party: Address,
        view: RoleView,
        bucket: StatusBucket,
    ) -> Result<Vec<Task>, LedgerError> {
        self.inner.list_tasks(party, view, bucket).await
    }
}

struct RaceWorld {
    root: InMemLedger,
    compute: Arc<StubCompute>,
    client_session: ClientSession,
    bank_session: BankSession,
    racing_ledger: Arc<RacingLedger>,
    task_id: TaskId,
    history: actix::Addr<cb_events::HistoryCollector<BridgeEvent>>,
}

/// One pending task with an anchored income record, where the observed
/// bank/client session runs over a `RacingLedger`.
async fn setup_race() -> Result<RaceWorld> {
    let root = InMemLedger::new(CHAIN_ID);
    let compute = Arc::new(StubCompute::new(30_000));
    let client_session = ClientSession::new(rand_signer());
    let bank_session = BankSession::new(rand_eth_addr());

    let (bus, history) = new_event_bus_with_history::<BridgeEvent>();
    root.observe(bus.recipient());

    let client_ledger = root.connect(client_session.address);
    let bank_ledger = root.connect(bank_session.address);
    client_ledger.register_client("fhe-pk-client").await?;
    bank_ledger.register_bank("fhe-pk-bank").await?;

    let expiry = root.current_time().await? + TTL;
    bank_ledger
        .store_record(
            client_session.address,
            DataType::MonthlyIncome,
            expiry,
            StubCompute::encode(DataType::MonthlyIncome, 50_000),
        )
        .await?;
    let task_id = client_ledger
        .create_task(bank_session.address, DataType::MonthlyIncome)
        .await?;

    let racing_ledger = Arc::new(RacingLedger::new(Arc::new(
        root.connect(bank_session.address),
    )));

    Ok(RaceWorld {
        root,
        compute,
        client_session,
        bank_session,
        racing_ledger,
        task_id,
        history,
    })
}

fn count_events(events: &[BridgeEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}

#[actix::test]
#[serial_test::serial]
async fn test_identical_double_complete_is_a_noop() -> Result<()> {
    let world = setup_race().await?;
    let (bus, _) = new_event_bus_with_history::<BridgeEvent>();

    // The rival session lands the exact result our session will compute.
    world.racing_ledger.arm(RivalAction::CompleteOnFetch {
        rival: Arc::new(world.root.connect(world.bank_session.address)),
        task_id: world.task_id.clone(),
        result: StubCompute::encode(DataType::MonthlyIncome, 1),
    });

    let coordinator = BankCoordinator::attach(
        world.bank_session,
        world.racing_ledger.clone() as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;

    let outcome = coordinator
        .send(ProcessTask {
            task_id: world.task_id.clone(),
        })
        .await?;
    assert!(outcome.is_ok(), "identical double-complete is a no-op");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let events = world.history.send(GetEvents::new()).await?;
    assert_eq!(
        count_events(&events, "TaskCompleted"),
        1,
        "exactly one ledger state change"
    );
    let task = world.root.connect(world.bank_session.address).task(&world.task_id).await?;
    assert_eq!(task.unwrap().status(), TaskStatus::Completed);
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_divergent_double_complete_is_surfaced() -> Result<()> {
    let world = setup_race().await?;
    let (bus, _) = new_event_bus_with_history::<BridgeEvent>();

    // The rival lands a different result; guessing which session is
    // right would be unsafe, so the conflict must surface.
    world.racing_ledger.arm(RivalAction::CompleteOnFetch {
        rival: Arc::new(world.root.connect(world.bank_session.address)),
        task_id: world.task_id.clone(),
        result: StubCompute::encode(DataType::MonthlyIncome, 0),
    });

    let coordinator = BankCoordinator::attach(
        world.bank_session,
        world.racing_ledger.clone() as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;

    let outcome = coordinator
        .send(ProcessTask {
            task_id: world.task_id.clone(),
        })
        .await?;
    assert!(outcome.is_err());

    // The rival's committed result is untouched.
    let task = world
        .root
        .connect(world.bank_session.address)
        .task(&world.task_id)
        .await?
        .unwrap();
    assert_eq!(
        task.encrypted_result,
        StubCompute::encode(DataType::MonthlyIncome, 0)
    );
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_identical_double_publish_is_a_noop() -> Result<()> {
    let world = setup_race().await?;

    // Bank completes normally first.
    let bank_ledger = world.root.connect(world.bank_session.address);
    bank_ledger
        .complete_task(
            &world.task_id,
            StubCompute::encode(DataType::MonthlyIncome, 1),
        )
        .await?;

    // Two sessions of the same client share the wallet key, so their
    // signatures agree.
    let rival_signature = sign_result(&world.client_session.signer, 1).unwrap();
    let client_racing = Arc::new(RacingLedger::new(Arc::new(
        world.root.connect(world.client_session.address),
    )));
    client_racing.arm(RivalAction::PublishOnRead {
        rival: Arc::new(world.root.connect(world.client_session.address)),
        task_id: world.task_id.clone(),
        signature: rival_signature,
    });

    let (bus, _) = new_event_bus_with_history::<BridgeEvent>();
    let coordinator = ClientCoordinator::attach(
        world.client_session.clone(),
        client_racing as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;

    let outcome = coordinator
        .send(PublishResult {
            task_id: world.task_id.clone(),
        })
        .await?;
    assert_eq!(outcome.unwrap(), 1, "no-op success still returns the value");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let events = world.history.send(GetEvents::new()).await?;
    assert_eq!(
        count_events(&events, "TaskPublished"),
        1,
        "exactly one ledger state change"
    );
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_divergent_double_publish_is_surfaced() -> Result<()> {
    let world = setup_race().await?;

    let bank_ledger = world.root.connect(world.bank_session.address);
    bank_ledger
        .complete_task(
            &world.task_id,
            StubCompute::encode(DataType::MonthlyIncome, 1),
        )
        .await?;

    // The rival publishes a signature ours cannot match.
    let foreign_signature = sign_result(&rand_signer(), 1).unwrap();
    let client_racing = Arc::new(RacingLedger::new(Arc::new(
        world.root.connect(world.client_session.address),
    )));
    client_racing.arm(RivalAction::PublishOnRead {
        rival: Arc::new(world.root.connect(world.client_session.address)),
        task_id: world.task_id.clone(),
        signature: foreign_signature.clone(),
    });

    let (bus, _) = new_event_bus_with_history::<BridgeEvent>();
    let coordinator = ClientCoordinator::attach(
        world.client_session.clone(),
        client_racing as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;

    let outcome = coordinator
        .send(PublishResult {
            task_id: world.task_id.clone(),
        })
        .await?;
    assert!(outcome.is_err());

    // The first publish stands.
    let task = world
        .root
        .connect(world.client_session.address)
        .task(&world.task_id)
        .await?
        .unwrap();
    assert_eq!(task.signature, foreign_signature);
    assert_eq!(task.status(), TaskStatus::Published);
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_create_task_against_unknown_bank_is_rejected() -> Result<()> {
    let world = setup_race().await?;
    let (bus, _) = new_event_bus_with_history::<BridgeEvent>();
    let client_ledger = Arc::new(world.root.connect(world.client_session.address));
    let coordinator = ClientCoordinator::attach(
        world.client_session.clone(),
        client_ledger as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;

    let outcome = coordinator
        .send(CreateTask {
            bank: rand_eth_addr(),
            data_type: DataType::MonthlyIncome,
        })
        .await?;
    assert!(outcome.is_err());
    Ok(())
}
