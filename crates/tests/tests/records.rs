// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Encrypted-record semantics: ledger-time expiry, multiple anchors per
//! (owner, data type), the submission pipeline's history log, and the
//! encrypt/decrypt round trip.

use anyhow::Result;
use cb_compute::CipherCompute;
use cb_coordinator::{BankCoordinator, BankSession, ClientCoordinator, ClientSession, CreateTask, ProcessTask};
use cb_events::{new_event_bus_with_history, BridgeEvent, DataType};
use cb_ledger::{InMemLedger, Ledger, TaskStatus};
use cb_pipeline::{PipelineError, SubmissionPipeline};
use cb_test_helpers::{rand_eth_addr, rand_signer, StubCompute};
use std::sync::Arc;

const CHAIN_ID: u64 = 31337;

struct World {
    root: InMemLedger,
    compute: Arc<StubCompute>,
    client_session: ClientSession,
    bank_session: BankSession,
    client_ledger: Arc<InMemLedger>,
    bank_ledger: Arc<InMemLedger>,
}

async fn setup() -> Result<World> {
    let root = InMemLedger::new(CHAIN_ID);
    let compute = Arc::new(StubCompute::new(30_000));
    let client_session = ClientSession::new(rand_signer());
    let bank_session = BankSession::new(rand_eth_addr());

    let client_ledger = Arc::new(root.connect(client_session.address));
    let bank_ledger = Arc::new(root.connect(bank_session.address));
    client_ledger.register_client("fhe-pk-client").await?;
    bank_ledger.register_bank("fhe-pk-bank").await?;

    Ok(World {
        root,
        compute,
        client_session,
        bank_session,
        client_ledger,
        bank_ledger,
    })
}

#[actix::test]
#[serial_test::serial]
async fn test_expired_records_are_excluded_from_processing() -> Result<()> {
    let world = setup().await?;
    let ttl = 1_000;

    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        world.bank_ledger.clone() as Arc<dyn Ledger>,
    );
    pipeline
        .submit(
            world.client_session.address,
            DataType::MonthlyIncome,
            50_000,
            ttl,
        )
        .await?;

    let (bus, _) = new_event_bus_with_history::<BridgeEvent>();
    let client_coordinator = ClientCoordinator::attach(
        world.client_session.clone(),
        world.client_ledger.clone() as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;
    let bank_coordinator = BankCoordinator::attach(
        world.bank_session,
        world.bank_ledger.clone() as Arc<dyn Ledger>,
        world.compute.clone(),
        &bus,
    )
    .await?;

    // Within the ttl the record is usable.
    let first = client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::MonthlyIncome,
        })
        .await??;
    world.root.advance_time(ttl); // expiry is inclusive: now == anchor + ttl
    bank_coordinator
        .send(ProcessTask {
            task_id: first.clone(),
        })
        .await??;
    assert_eq!(
        world.bank_ledger.task(&first).await?.unwrap().status(),
        TaskStatus::Completed
    );

    // One second past the ttl the record must be filtered out at read
    // time, and the new task stays pending.
    world.root.advance_time(1);
    let second = client_coordinator
        .send(CreateTask {
            bank: world.bank_session.address,
            data_type: DataType::MonthlyIncome,
        })
        .await??;
    let outcome = bank_coordinator
        .send(ProcessTask {
            task_id: second.clone(),
        })
        .await?;
    assert!(outcome.is_err(), "expired record must not be consumed");
    assert_eq!(
        world.bank_ledger.task(&second).await?.unwrap().status(),
        TaskStatus::Pending
    );

    // A fresh anchor makes the task processable again; the expired
    // record stays on the ledger but is ignored.
    pipeline
        .submit(
            world.client_session.address,
            DataType::MonthlyIncome,
            52_000,
            ttl,
        )
        .await?;
    bank_coordinator
        .send(ProcessTask {
            task_id: second.clone(),
        })
        .await??;
    assert_eq!(
        world.bank_ledger.task(&second).await?.unwrap().status(),
        TaskStatus::Completed
    );
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_pipeline_history_tracks_anchoring() -> Result<()> {
    let world = setup().await?;
    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        world.bank_ledger.clone() as Arc<dyn Ledger>,
    );

    let owner = world.client_session.address;
    pipeline.request_key(owner).await?;
    let ciphertext = pipeline.encrypt(owner, DataType::CreditScore, 720).await?;
    let entries = pipeline.history();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].anchored);

    let record = pipeline
        .anchor(owner, DataType::CreditScore, ciphertext, 500)
        .await?;
    let entries = pipeline.history();
    assert_eq!(entries.len(), 1, "anchoring updates the entry in place");
    assert!(entries[0].anchored);
    assert_eq!(entries[0].expiry, Some(record.expiry));

    // Expiry is anchored in ledger time.
    let now = world.root.current_time().await?;
    assert_eq!(record.expiry, now + 500);

    // A second submission for the same (owner, type) is allowed.
    pipeline
        .submit(owner, DataType::CreditScore, 640, 500)
        .await?;
    assert_eq!(pipeline.history().len(), 2);
    assert_eq!(
        world
            .bank_ledger
            .records_by_owner(owner, DataType::CreditScore)
            .await?
            .len(),
        2
    );
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_unregistered_producer_cannot_anchor() -> Result<()> {
    let world = setup().await?;

    // A wallet with no bank registration tries to act as producer.
    let outsider = Arc::new(world.root.connect(rand_eth_addr()));
    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        outsider as Arc<dyn Ledger>,
    );
    let err = pipeline
        .submit(
            world.client_session.address,
            DataType::MonthlyIncome,
            10_000,
            500,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnauthorizedProducer(_)));
    assert!(world
        .bank_ledger
        .records_by_owner(world.client_session.address, DataType::MonthlyIncome)
        .await?
        .is_empty());
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_encrypt_decrypt_round_trip() -> Result<()> {
    let world = setup().await?;
    let pipeline = SubmissionPipeline::new(
        world.compute.clone(),
        world.bank_ledger.clone() as Arc<dyn Ledger>,
    );

    let owner = world.client_session.address;
    let ciphertext = pipeline
        .encrypt(owner, DataType::PropertyValue, 350_000)
        .await?;
    let value = world
        .compute
        .decrypt(owner, DataType::PropertyValue, &ciphertext)
        .await?;
    assert_eq!(value, 350_000);

    // Decrypting under the wrong data type is refused.
    assert!(world
        .compute
        .decrypt(owner, DataType::CreditScore, &ciphertext)
        .await
        .is_err());
    Ok(())
}

#[actix::test]
#[serial_test::serial]
async fn test_unknown_tag_is_a_validation_error() {
    let err = SubmissionPipeline::parse_tag("shoe_size").unwrap_err();
    assert!(matches!(err, PipelineError::InvalidDataType(_)));
    assert_eq!(
        SubmissionPipeline::parse_tag("monthly_income").unwrap(),
        DataType::MonthlyIncome
    );
}
