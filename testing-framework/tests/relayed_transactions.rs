// Relayed transactions through a test session: a sponsor pays the fees of
// a user who only holds the value it moves.

#![allow(clippy::disallowed_methods)]

mod common;

use anyhow::Result;
use common::{keypair_in_shard, open_session, write_profile};
use shardnet_testing_framework::prelude::*;
use tempfile::TempDir;

struct Sponsored {
    _dir: TempDir,
    network: Arc<TestNetwork>,
    session: TestSession,
    user: TestUser,
    sponsor: TestUser,
}

const USER_FUNDS: u128 = 1_000;

async fn sponsored() -> Result<Sponsored> {
    common::init_logger();
    let dir = TempDir::new()?;
    let user = keypair_in_shard(0, 0);
    let sponsor = keypair_in_shard(0, 1);
    write_profile(dir.path(), &[("user", &user), ("sponsor", &sponsor)], &[]).await?;
    let network = Arc::new(
        TestNetworkBuilder::new()
            .with_account(user.address(), USER_FUNDS)
            .with_account(sponsor.address(), 10 * COIN_VALUE)
            .build(),
    );
    let mut session = open_session(dir.path(), network.clone()).await?;
    let user = session.user("user")?;
    let sponsor = session.user("sponsor")?;
    session.sync_users(&[user.clone(), sponsor.clone()]).await?;
    Ok(Sponsored {
        _dir: dir,
        network,
        session,
        user,
        sponsor,
    })
}

#[tokio::test(start_paused = true)]
async fn test_sponsor_pays_relayed_v3_fee() -> Result<()> {
    let Sponsored {
        network,
        mut session,
        user,
        sponsor,
        ..
    } = sponsored().await?;
    let receiver = keypair_in_shard(0, 2).address();

    session.set_step("relayed v3");
    let pending = session
        .build_relayed(&user, &sponsor, |f, sender, nonce| {
            f.transfer(sender, &receiver, nonce, USER_FUNDS, Vec::new())
        })
        .await?;
    let outcome = session.send_and_await(&pending).await?;
    assert!(outcome.is_success(), "{}", outcome);

    assert_native_balance(network.as_ref(), &user.address(), 0).await?;
    assert_native_balance(network.as_ref(), &receiver, USER_FUNDS).await?;
    assert_nonce(network.as_ref(), &user.address(), 1).await?;
    assert_nonce(network.as_ref(), &sponsor.address(), 0).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_sponsor_relays_v1_and_v2() -> Result<()> {
    let Sponsored {
        network,
        mut session,
        user,
        sponsor,
        ..
    } = sponsored().await?;
    let receiver = keypair_in_shard(0, 2).address();

    session.set_step("relayed v1");
    let inner = session
        .build_with(&user, |f, sender, nonce| {
            f.transfer(sender, &receiver, nonce, 400, Vec::new())
        })
        .await?;
    let pending = session.build_relayed_v1(&sponsor, &inner).await?;
    let outcome = session.send_and_await(&pending).await?;
    assert!(outcome.is_success(), "{}", outcome);

    session.set_step("relayed v2");
    let inner = session
        .build_with(&user, |f, sender, nonce| {
            let mut tx = f.transfer(sender, &receiver, nonce, 0, b"thanks".to_vec());
            tx.gas_limit = 0;
            tx
        })
        .await?;
    let pending = session.build_relayed_v2(&sponsor, &inner, 100_000).await?;
    let outcome = session.send_and_await(&pending).await?;
    assert!(outcome.is_success(), "{}", outcome);

    // Both nonces move, the user only pays the value
    assert_nonce(network.as_ref(), &user.address(), 2).await?;
    assert_nonce(network.as_ref(), &sponsor.address(), 2).await?;
    assert_native_balance(network.as_ref(), &user.address(), USER_FUNDS - 400).await?;
    assert_native_balance(network.as_ref(), &receiver, 400).await?;

    // A v2 inner transaction must come without gas
    let inner = session
        .build_with(&user, |f, sender, nonce| f.transfer(sender, &receiver, nonce, 0, Vec::new()))
        .await?;
    let err = session.build_relayed_v2(&sponsor, &inner, 100_000).await.unwrap_err();
    assert!(matches!(err, HarnessError::InvalidRelay(_)));
    assert_eq!(session.nonces().get_nonce(&sponsor)?, 2);
    Ok(())
}
