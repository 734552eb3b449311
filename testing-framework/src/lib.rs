//! # Shardnet Testing Framework
//!
//! Session orchestration and transaction lifecycle harness for integration
//! tests against a sharded network.
//!
//! ## Architecture Overview
//!
//! - **Session** (`session`): profile, users and groups, named artifacts
//!   persisted under `<base_dir>/<profile>.session` so that test phases run
//!   as separate processes share state
//! - **Nonces** (`nonce`): per-user cursors synchronized from the network
//! - **Transactions** (`transactions`): factory for transfers, token
//!   payments, contract deployments and calls, signed by the user's signer
//! - **Watcher** (`watcher`): bounded polling until a terminal status
//! - **Dispatcher** (`dispatch`): bulk submission of pre-signed transactions
//! - **Audit** (`audit`): step-tagged event trail and the final report
//! - **Airdrop** (`airdrop`): fan-out of payments from one funder
//! - **Orchestrator** (`orchestrator`): the `TestSession` context, the
//!   injectable clock and the step runner
//! - **Network** (`network`, `testnet`): the provider capability set, the
//!   HTTP proxy and an in-process sharded network for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shardnet_testing_framework::prelude::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_transfer() {
//!     let network = Arc::new(TestNetworkBuilder::new().with_account(alice, COIN_VALUE).build());
//!     let mut session = TestSessionBuilder::new("local", dir.path())
//!         .with_provider(network)
//!         .with_clock(Arc::new(PausedClock))
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let alice = session.user("alice").unwrap();
//!     session.sync_users(&[alice.clone()]).await.unwrap();
//!     let tx = session.build_transfer(&alice, &bob, 10).await.unwrap();
//!     assert!(session.send_and_await(&tx).await.unwrap().is_success());
//! }
//! ```

#![warn(clippy::all)]

pub mod airdrop;
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod network;
pub mod nonce;
/// Session context, clock and step runner
pub mod orchestrator;
pub mod outcome;
pub mod session;
/// In-process sharded network implementing the provider capability set
pub mod testnet;
pub mod transactions;
pub mod users;
pub mod watcher;

// Convenient re-exports for common usage
pub mod prelude;

pub use error::{HarnessError, Result};
pub use orchestrator::{
    Clock, PausedClock, StepRunner, SystemClock, TestSession, TestSessionBuilder,
};

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
