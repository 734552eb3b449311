// Shared fixtures for the scenario tests: deterministic keys, a profile in
// a temporary directory and a session bound to an in-process network.

#![allow(dead_code)]
#![allow(clippy::disallowed_methods)]

use anyhow::{Context, Result};
use shardnet_common::crypto::KeyPair;
use shardnet_testing_framework::prelude::*;
use shardnet_testing_framework::session::{GroupEntry, IndividualEntry, SessionProfile, UsersConfig};
use std::path::Path;
use tempfile::TempDir;

pub const PROFILE: &str = "localnet";
pub const NUM_SHARDS: u32 = 3;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The `skip`-th deterministic key pair whose address lives in `shard`
pub fn keypair_in_shard(shard: u32, skip: usize) -> KeyPair {
    (1u8..=255)
        .map(|seed| KeyPair::from_seed([seed; 32]))
        .filter(|k| k.address().shard(NUM_SHARDS) == shard)
        .nth(skip)
        .expect("not enough seeds for this shard")
}

fn secret_hex(keys: &KeyPair) -> String {
    keys.secret_key().to_hex()
}

pub async fn write_profile(
    dir: &Path,
    individuals: &[(&str, &KeyPair)],
    groups: &[(&str, &[KeyPair])],
) -> Result<()> {
    let profile = SessionProfile {
        proxy_url: "http://127.0.0.1:7950".to_string(),
        chain_id: None,
        users: UsersConfig {
            individuals: individuals
                .iter()
                .map(|(name, keys)| IndividualEntry {
                    name: name.to_string(),
                    secret_key: secret_hex(keys),
                })
                .collect(),
            groups: groups
                .iter()
                .map(|(name, members)| GroupEntry {
                    name: name.to_string(),
                    secret_keys: members.iter().map(secret_hex).collect(),
                })
                .collect(),
        },
    };
    profile
        .save(dir, PROFILE)
        .await
        .context("Failed to write session profile")?;
    Ok(())
}

pub async fn open_session(dir: &Path, network: Arc<TestNetwork>) -> Result<TestSession> {
    TestSessionBuilder::new(PROFILE, dir)
        .with_provider(network)
        .with_clock(Arc::new(PausedClock))
        .build()
        .await
        .context("Failed to build test session")
}

/// Temporary session directory with a funded `owner` in shard 0
pub struct Fixture {
    pub dir: TempDir,
    pub owner: KeyPair,
    pub network: Arc<TestNetwork>,
}

impl Fixture {
    pub async fn new(network: TestNetworkBuilder) -> Result<Self> {
        init_logger();
        let dir = TempDir::new()?;
        let owner = keypair_in_shard(0, 0);
        write_profile(dir.path(), &[("owner", &owner)], &[]).await?;
        let network = Arc::new(network.with_account(owner.address(), 100 * COIN_VALUE).build());
        Ok(Self { dir, owner, network })
    }

    pub async fn session(&self) -> Result<TestSession> {
        open_session(self.dir.path(), self.network.clone()).await
    }
}
