// Awaiting a resolved transaction again returns the same outcome; a
// timed-out wait leaves the transaction free to land later.

#![allow(clippy::disallowed_methods)]

mod common;

use anyhow::Result;
use common::{Fixture, PROFILE};
use shardnet_testing_framework::prelude::*;
use shardnet_testing_framework::watcher::WatchState;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_second_await_returns_same_outcome() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new()).await?;
    let mut session = fixture.session().await?;
    let owner = session.user("owner")?;
    session.sync_users(&[owner.clone()]).await?;

    // Cross-shard receiver: two rounds to settle
    let receiver = common::keypair_in_shard(1, 0).address();
    let pending = session.build_transfer(&owner, &receiver, 10).await?;
    let hash = session.send(&pending).await?;

    let first = session.await_outcome(&hash).await?;
    let second = session.await_outcome(&hash).await?;
    assert_eq!(first, second);
    assert!(first.is_success());
    assert_eq!(session.watcher().state_of(&hash), Some(WatchState::Executed));

    let completed = session.watcher().await_completed(&hash).await?;
    assert!(completed.is_cross_shard());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_transaction_lands_later() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new().with_auto_processing(false)).await?;
    let mut session = TestSessionBuilder::new(PROFILE, fixture.dir.path())
        .with_provider(fixture.network.clone())
        .with_clock(Arc::new(PausedClock))
        .with_awaiting_options(
            AwaitingOptions::default()
                .with_polling_interval(Duration::from_secs(1))
                .with_timeout(Duration::from_secs(30)),
        )
        .build()
        .await?;
    let owner = session.user("owner")?;
    session.sync_users(&[owner.clone()]).await?;

    // Same shard as the owner: settles in the round after it is processed
    let receiver = common::keypair_in_shard(0, 1).address();
    let pending = session.build_transfer(&owner, &receiver, 10).await?;
    let hash = session.send(&pending).await?;

    let err = session.await_outcome(&hash).await.unwrap_err();
    assert!(matches!(err, HarnessError::TimedOut { .. }));
    assert_eq!(session.watcher().state_of(&hash), Some(WatchState::TimedOut));

    fixture.network.process_round();
    assert!(session.await_outcome(&hash).await?.is_success());
    assert_eq!(session.watcher().state_of(&hash), Some(WatchState::Executed));
    assert_native_balance(fixture.network.as_ref(), &receiver, 10).await?;
    Ok(())
}
