// File: testing-framework/src/network/mod.rs
//
// Network provider capability set
//
// Everything the harness needs from a network, as one trait. The HTTP proxy
// and the in-process `TestNetwork` both implement it, and extra capabilities
// (bulk submit) are part of the interface rather than a subclass of a provider.

pub mod assertions;
pub mod proxy;

pub use proxy::ProxyNetworkProvider;

use async_trait::async_trait;
use shardnet_common::{
    api::{
        AccountOnNetwork, BatchReceipt, ContractQuery, NetworkConfig, NetworkStatus, QueryResponse,
        TransactionOnNetwork,
    },
    crypto::{Address, Hash},
    transaction::Transaction,
};
use thiserror::Error;

/// Errors returned by a network provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Connection failure, timeout or server-side error, worth retrying
    #[error("Transient network error: {0}")]
    Transient(String),

    /// The requested entity is unknown to the network (or not indexed yet)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The network refused a submitted transaction
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The response could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Capability interface of a network used by the harness.
///
/// # Implementation Note
///
/// Implementations map their transport failures to `ProviderError::Transient`
/// so that waiters can tell them apart from terminal failures.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Chain id, gas schedule and shard count
    async fn get_network_config(&self) -> ProviderResult<NetworkConfig>;

    /// Round and epoch of the given shard
    async fn get_network_status(&self, shard: u32) -> ProviderResult<NetworkStatus>;

    /// Nonce and native balance of an account
    async fn get_account(&self, address: &Address) -> ProviderResult<AccountOnNetwork>;

    /// Balance of a token held by an account (fungible tokens use nonce 0)
    async fn get_token_balance(
        &self,
        address: &Address,
        identifier: &str,
        nonce: u64,
    ) -> ProviderResult<u128>;

    /// Broadcast one signed transaction
    ///
    /// # Errors
    ///
    /// `ProviderError::Rejected` if the network refuses it (bad nonce, signature, funds...).
    async fn send_transaction(&self, tx: &Transaction) -> ProviderResult<Hash>;

    /// Broadcast many signed transactions in one call.
    ///
    /// Entries refused by the network are reported in the receipt, they do not fail the call.
    async fn send_transactions(&self, txs: &[Transaction]) -> ProviderResult<BatchReceipt>;

    /// Transaction with its status, contract results and logs
    async fn get_transaction(&self, hash: &Hash) -> ProviderResult<TransactionOnNetwork>;

    /// Execute a read-only contract function
    async fn query_contract(&self, query: &ContractQuery) -> ProviderResult<QueryResponse>;
}
