// Airdrop from one funder to a group spread over every shard

#![allow(clippy::disallowed_methods)]

mod common;

use anyhow::Result;
use common::{keypair_in_shard, open_session, write_profile};
use shardnet_testing_framework::prelude::*;
use tempfile::TempDir;

const TOKEN: &str = "ROSE-0a1b2c";

struct Setup {
    _dir: TempDir,
    network: Arc<TestNetwork>,
    session: TestSession,
    funder: TestUser,
    recipients: Vec<TestUser>,
}

async fn setup(funder_tokens: u128) -> Result<Setup> {
    common::init_logger();
    let dir = TempDir::new()?;
    let funder = keypair_in_shard(0, 0);
    let members = [keypair_in_shard(0, 1), keypair_in_shard(1, 0), keypair_in_shard(2, 0)];
    write_profile(dir.path(), &[("funder", &funder)], &[("recipients", &members[..])]).await?;

    let network = Arc::new(
        TestNetworkBuilder::new()
            .with_account(funder.address(), 10 * COIN_VALUE)
            .with_token_balance(funder.address(), TOKEN, 0, funder_tokens)
            .build(),
    );
    let mut session = open_session(dir.path(), network.clone()).await?;
    let funder = session.user("funder")?;
    let recipients = session.group("recipients")?;
    session.sync_users(&[funder.clone()]).await?;

    Ok(Setup {
        _dir: dir,
        network,
        session,
        funder,
        recipients,
    })
}

#[tokio::test(start_paused = true)]
async fn test_token_airdrop_credits_each_recipient_once() -> Result<()> {
    let Setup {
        _dir,
        network,
        mut session,
        funder,
        recipients,
    } = setup(1_000).await?;
    let addresses: Vec<Address> = recipients.iter().map(TestUser::address).collect();

    session.set_step("airdrop tokens");
    let payment = TokenPayment::fungible_from_atomic(TOKEN, 100, 0);
    let service = AirdropService::default();
    let report = service
        .send_to_each_user(&mut session, &funder, &addresses, &[payment])
        .await?;
    assert_eq!(report.accepted, 3);

    let outcomes = service.await_delivery(&mut session, &report).await?;
    assert!(outcomes.iter().all(TransactionOutcome::is_success));

    assert_token_balance(network.as_ref(), &funder.address(), TOKEN, 0, 700).await?;
    for address in &addresses {
        assert_token_balance(network.as_ref(), address, TOKEN, 0, 100).await?;
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_native_airdrop_debits_sum_plus_fees() -> Result<()> {
    let Setup {
        _dir,
        network,
        mut session,
        funder,
        recipients,
    } = setup(0).await?;
    let addresses: Vec<Address> = recipients.iter().map(TestUser::address).collect();
    let before = network.get_account(&funder.address()).await?.balance;

    session.set_step("airdrop native");
    let service = AirdropService::new(DeliveryMode::Individually);
    let report = service
        .send_to_each_user(&mut session, &funder, &addresses, &[TokenPayment::native(100)])
        .await?;
    service.await_delivery(&mut session, &report).await?;

    let mut fees = 0u128;
    for hash in report.accepted_hashes() {
        fees += session.watcher().await_completed(&hash).await?.fee;
    }
    assert!(fees > 0);

    assert_native_balance(network.as_ref(), &funder.address(), before - 300 - fees).await?;
    for address in &addresses {
        assert_native_balance(network.as_ref(), address, 100).await?;
    }
    Ok(())
}
