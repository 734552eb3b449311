//! TestNetworkBuilder - Fluent API for configuring a TestNetwork

use shardnet_common::{api::NetworkConfig, crypto::Address};
use std::sync::Arc;

use super::programs::{AdderProgram, ContractProgram, ADDER_CODE};
use super::{Account, NetworkState, TestNetwork};

/// Builder for TestNetwork instances with fluent API
///
/// # Example
///
/// ```rust,ignore
/// use shardnet_testing_framework::testnet::TestNetworkBuilder;
///
/// let network = TestNetworkBuilder::new()
///     .with_shards(3)
///     .with_account(alice, 1_000 * COIN_VALUE)
///     .with_token_balance(alice, "ROSE-0a1b2c", 0, 1_000_000)
///     .build();
/// ```
pub struct TestNetworkBuilder {
    config: NetworkConfig,
    accounts: Vec<(Address, u128)>,
    tokens: Vec<(Address, String, u64, u128)>,
    programs: Vec<(Vec<u8>, Arc<dyn ContractProgram>)>,
    auto_process: bool,
    indexing_delay: u64,
}

impl TestNetworkBuilder {
    /// Create new builder with defaults
    ///
    /// Default configuration:
    /// - local network config (3 shards, chain id "localnet")
    /// - the adder program registered under `ADDER_CODE`
    /// - auto-processing on: every read query advances one round
    pub fn new() -> Self {
        Self {
            config: NetworkConfig::default(),
            accounts: Vec::new(),
            tokens: Vec::new(),
            programs: vec![(ADDER_CODE.to_vec(), Arc::new(AdderProgram))],
            auto_process: true,
            indexing_delay: 0,
        }
    }

    pub fn with_config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_shards(mut self, num_shards: u32) -> Self {
        self.config.num_shards = num_shards;
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.config.chain_id = chain_id.into();
        self
    }

    /// Add a funded account
    pub fn with_account(mut self, address: Address, balance: u128) -> Self {
        self.accounts.push((address, balance));
        self
    }

    /// Credit a token balance at genesis (nonce 0 for fungible tokens)
    pub fn with_token_balance(
        mut self,
        address: Address,
        identifier: impl Into<String>,
        nonce: u64,
        amount: u128,
    ) -> Self {
        self.tokens.push((address, identifier.into(), nonce, amount));
        self
    }

    /// Register a program for deployments carrying `code`
    pub fn with_program(
        mut self,
        code: impl Into<Vec<u8>>,
        program: Arc<dyn ContractProgram>,
    ) -> Self {
        self.programs.push((code.into(), program));
        self
    }

    /// When disabled, rounds only advance through `TestNetwork::process_round`
    pub fn with_auto_processing(mut self, enabled: bool) -> Self {
        self.auto_process = enabled;
        self
    }

    /// Number of rounds during which a new transaction is not returned by lookups
    pub fn with_indexing_delay(mut self, rounds: u64) -> Self {
        self.indexing_delay = rounds;
        self
    }

    pub fn build(self) -> TestNetwork {
        let mut state = NetworkState::new(self.config);
        state.auto_process = self.auto_process;
        state.indexing_delay = self.indexing_delay;

        for (code, program) in self.programs {
            state.programs.insert(code, program);
        }
        for (address, balance) in self.accounts {
            state.accounts.entry(address).or_insert_with(Account::default).balance += balance;
        }
        for (address, identifier, nonce, amount) in self.tokens {
            *state
                .accounts
                .entry(address)
                .or_insert_with(Account::default)
                .tokens
                .entry((identifier, nonce))
                .or_insert(0) += amount;
        }

        TestNetwork::from_state(state)
    }
}

impl Default for TestNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
