// Step retries never resubmit work that already reached the network

#![allow(clippy::disallowed_methods)]

mod common;

use anyhow::Result;
use common::Fixture;
use shardnet_testing_framework::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn runner(retries: u32) -> StepRunner {
    StepRunner::new(StepOptions {
        timeout: Duration::from_secs(60),
        retries,
    })
}

#[tokio::test(start_paused = true)]
async fn test_retry_refused_when_transfer_landed() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new()).await?;
    let mut session = fixture.session().await?;
    let owner = session.user("owner")?;
    session.sync_users(&[owner.clone()]).await?;
    let receiver = Address::new([7; 32]);
    let mut runner = runner(3);

    let err = runner
        .run(&mut session, "pay then fail", |s| {
            let owner = owner.clone();
            async move {
                let pending = s.build_transfer(&owner, &receiver, 10).await?;
                s.send(&pending).await?;
                Err::<(), _>(HarnessError::Assertion("checked too early".to_string()))
            }
            .boxed()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::RetryUnsafe { step, .. } if step == "pay then fail"));
    assert_eq!(runner.failed_step(), Some("pay then fail"));

    // Paid exactly once
    fixture.network.process_until_idle();
    assert_native_balance(fixture.network.as_ref(), &receiver, 10).await?;
    assert_nonce(fixture.network.as_ref(), &owner.address(), 1).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_retry_resyncs_nonces_when_nothing_was_sent() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new()).await?;
    let mut session = fixture.session().await?;
    let owner = session.user("owner")?;
    session.sync_users(&[owner.clone()]).await?;
    let receiver = Address::new([7; 32]);
    let attempts = AtomicU32::new(0);
    let mut runner = runner(1);

    let outcome = runner
        .run(&mut session, "build twice", |s| {
            let owner = owner.clone();
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                let pending = s.build_transfer(&owner, &receiver, 10).await?;
                if attempt == 0 {
                    // The nonce was consumed, the transaction never sent
                    return Err(HarnessError::Assertion("lost before broadcast".to_string()));
                }
                assert_eq!(pending.nonce(), 0);
                s.send_and_await(&pending).await
            }
            .boxed()
        })
        .await?;

    assert!(outcome.is_success());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_native_balance(fixture.network.as_ref(), &receiver, 10).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rejected_transaction_does_not_block_retry() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new()).await?;
    let mut session = fixture.session().await?;
    let owner = session.user("owner")?;
    session.sync_users(&[owner.clone()]).await?;
    let receiver = Address::new([7; 32]);
    let attempts = AtomicU32::new(0);
    let mut runner = runner(1);

    // First attempt sends a transaction the network refuses (nonce too high)
    runner
        .run(&mut session, "rejected first", |s| {
            let owner = owner.clone();
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    s.nonces_mut().set_nonce(owner.address(), 5);
                }
                let pending = s.build_transfer(&owner, &receiver, 10).await?;
                s.send(&pending).await?;
                Ok::<(), HarnessError>(())
            }
            .boxed()
        })
        .await?;

    fixture.network.process_until_idle();
    assert_nonce(fixture.network.as_ref(), &owner.address(), 1).await?;
    assert_native_balance(fixture.network.as_ref(), &receiver, 10).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_suite_stops_after_failed_step() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new()).await?;
    let mut session = fixture.session().await?;
    let mut runner = StepRunner::default();

    let first = runner
        .run(&mut session, "load missing", |s| {
            async move { s.load_address("never saved") }.boxed()
        })
        .await;
    assert!(matches!(first, Err(HarnessError::NotFound { .. })));

    let second = runner
        .run(&mut session, "anything", |_| async { Ok::<(), HarnessError>(()) }.boxed())
        .await;
    assert!(matches!(
        second,
        Err(HarnessError::SuiteAborted { failed_step }) if failed_step == "load missing"
    ));
    Ok(())
}
