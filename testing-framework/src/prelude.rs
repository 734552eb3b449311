//! Common imports for suites
//!
//! ```rust,ignore
//! use shardnet_testing_framework::prelude::*;
//! ```

pub use std::sync::Arc;

pub use futures::FutureExt;
pub use shardnet_common::{
    api::{ContractQuery, NetworkConfig, ReturnCode, TransactionStatus},
    config::COIN_VALUE,
    crypto::{Address, Hash, KeyPair},
    transaction::{CodeMetadata, NftCreate, TokenDescriptor, TokenPayment, TokenProperties},
};

pub use crate::airdrop::{AirdropReport, AirdropService, DeliveryMode};
pub use crate::audit::{AuditKind, Report};
pub use crate::config::{AwaitingOptions, DispatchOptions, StepOptions};
pub use crate::error::{EntryKind, HarnessError, Result};
pub use crate::network::assertions::{assert_native_balance, assert_nonce, assert_token_balance};
pub use crate::network::{NetworkProvider, ProxyNetworkProvider};
pub use crate::orchestrator::{
    Clock, PausedClock, StepRunner, SystemClock, TestSession, TestSessionBuilder,
};
pub use crate::outcome::{FailureCode, TransactionOutcome};
pub use crate::testnet::{programs::ADDER_CODE, TestNetwork, TestNetworkBuilder};
pub use crate::transactions::{
    ContractCall, ContractDeploy, PendingTransaction, TransactionFactory,
};
pub use crate::users::TestUser;
