// File: testing-framework/src/testnet/mod.rs
//
// In-process sharded network
//
// A deterministic stand-in for a local network, implementing the same
// `NetworkProvider` capability set as the HTTP proxy. It admits signed
// transactions (chain id, signatures, gas and contiguous nonces), executes
// them in rounds and keeps cross-shard transactions pending for one extra
// round. Contract calls run registered `ContractProgram`s; token issuance
// runs on the metachain through the token issuer system contract.

mod builder;
mod execution;
pub mod programs;
mod relayed;
mod system;

pub use builder::TestNetworkBuilder;
pub use programs::{AdderProgram, ContractProgram, ADDER_CODE};

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use shardnet_common::{
    api::{
        AccountOnNetwork, BatchReceipt, ContractQuery, LogEvent, NetworkConfig, NetworkStatus,
        QueryResponse, ReturnCode, SmartContractResult, TransactionOnNetwork, TransactionStatus,
    },
    crypto::{Address, Hash},
    transaction::{CodeMetadata, Transaction},
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::network::{NetworkProvider, ProviderError, ProviderResult};
use programs::{ContractStorage, QueryContext};
use relayed::Relaying;
use system::IssuedToken;

#[derive(Default)]
pub(crate) struct Account {
    pub(crate) nonce: u64,
    pub(crate) balance: u128,
    // (identifier, nonce) -> amount
    pub(crate) tokens: HashMap<(String, u64), u128>,
    pub(crate) contract: Option<ContractAccount>,
}

pub(crate) struct ContractAccount {
    pub(crate) owner: Address,
    pub(crate) code: Vec<u8>,
    pub(crate) metadata: CodeMetadata,
    pub(crate) storage: ContractStorage,
    // Share of call fees, claimable by the owner
    pub(crate) developer_rewards: u128,
}

/// Effect of a transaction, decided at admission from its data field
#[derive(Debug, Clone)]
pub(crate) enum Action {
    MoveBalance,
    Deploy,
    ContractCall,
    TokenTransfer {
        receiver: Address,
        transfers: Vec<(String, u64, u128)>,
    },
    // Call to the token issuer
    TokenManagement,
    NftCreate,
    ChangeOwner,
    ClaimDeveloperRewards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Queued,
    // Source shard done, destination shard next round
    InFlight,
    Done,
}

pub(crate) struct TxEntry {
    // As submitted
    pub(crate) tx: Transaction,
    pub(crate) hash: Hash,
    // As executed: the relayed transaction, or `tx` itself
    pub(crate) inner: Transaction,
    pub(crate) relaying: Relaying,
    // Pays the fee: the sender, or the relayer
    pub(crate) payer: Address,
    pub(crate) move_gas: u64,
    pub(crate) action: Action,
    pub(crate) status: TransactionStatus,
    pub(crate) stage: Stage,
    pub(crate) fee: u128,
    // Native units debited at source and not yet settled (value + max fee)
    pub(crate) locked: u128,
    pub(crate) source_shard: u32,
    pub(crate) destination_shard: u32,
    pub(crate) admitted_round: u64,
    pub(crate) results: Vec<SmartContractResult>,
    pub(crate) logs: Vec<LogEvent>,
}

impl TxEntry {
    fn to_api(&self) -> TransactionOnNetwork {
        TransactionOnNetwork {
            hash: self.hash.clone(),
            nonce: self.tx.nonce,
            sender: self.tx.sender,
            receiver: self.tx.receiver,
            value: self.tx.value,
            data: self.tx.data.clone(),
            gas_limit: self.tx.gas_limit,
            gas_price: self.tx.gas_price,
            status: self.status,
            fee: self.fee,
            source_shard: self.source_shard,
            destination_shard: self.destination_shard,
            contract_results: self.results.clone(),
            logs: self.logs.clone(),
        }
    }
}

pub(crate) struct NetworkState {
    pub(crate) config: NetworkConfig,
    pub(crate) accounts: HashMap<Address, Account>,
    pub(crate) transactions: HashMap<Hash, TxEntry>,
    // Admitted, waiting for their source shard execution, in admission order
    pub(crate) mempool: Vec<Hash>,
    // Executed at source, waiting for the destination shard
    pub(crate) in_flight: Vec<Hash>,
    pub(crate) programs: HashMap<Vec<u8>, Arc<dyn ContractProgram>>,
    // Issued token collections by identifier
    pub(crate) tokens: HashMap<String, IssuedToken>,
    pub(crate) round: u64,
    pub(crate) auto_process: bool,
    pub(crate) indexing_delay: u64,
    pub(crate) injected_faults: u32,
    pub(crate) results_counter: u64,
}

impl NetworkState {
    pub(crate) fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            accounts: HashMap::new(),
            transactions: HashMap::new(),
            mempool: Vec::new(),
            in_flight: Vec::new(),
            programs: HashMap::new(),
            tokens: HashMap::new(),
            round: 0,
            auto_process: true,
            indexing_delay: 0,
            injected_faults: 0,
            results_counter: 0,
        }
    }

    pub(crate) fn shard_of(&self, address: &Address) -> u32 {
        address.shard(self.config.num_shards)
    }

    // Consume one injected fault, if any is armed
    fn take_fault(&mut self, operation: &str) -> ProviderResult<()> {
        if self.injected_faults > 0 {
            self.injected_faults -= 1;
            debug!("Injected transient fault on {}", operation);
            return Err(ProviderError::Transient(format!(
                "{}: injected fault",
                operation
            )));
        }
        Ok(())
    }

    // Reads advance the network by one round in auto mode
    fn tick(&mut self) {
        if self.auto_process {
            self.process_round();
        }
    }
}

/// Deterministic in-process sharded network.
///
/// # Example
///
/// ```rust,ignore
/// let network = Arc::new(TestNetworkBuilder::new().with_account(alice, COIN_VALUE).build());
/// let hash = network.send_transaction(&signed).await?;
/// network.process_round();
/// let tx = network.get_transaction(&hash).await?;
/// ```
pub struct TestNetwork {
    state: Mutex<NetworkState>,
}

impl TestNetwork {
    pub(crate) fn from_state(state: NetworkState) -> Self {
        info!(
            "Test network '{}' with {} shards and {} genesis accounts",
            state.config.chain_id,
            state.config.num_shards,
            state.accounts.len()
        );
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> NetworkConfig {
        self.state.lock().config.clone()
    }

    /// Execute one round: cross-shard arrivals first, then every admitted transaction
    pub fn process_round(&self) {
        self.state.lock().process_round();
    }

    /// Run rounds until nothing is queued or in flight
    pub fn process_until_idle(&self) {
        let mut state = self.state.lock();
        while !state.mempool.is_empty() || !state.in_flight.is_empty() {
            state.process_round();
        }
    }

    pub fn current_round(&self) -> u64 {
        self.state.lock().round
    }

    pub fn set_auto_processing(&self, enabled: bool) {
        self.state.lock().auto_process = enabled;
    }

    /// Make the next `count` provider calls fail with a transient error
    pub fn inject_transient_faults(&self, count: u32) {
        self.state.lock().injected_faults += count;
    }

    /// Credit native units to an account outside of any transaction
    pub fn mint(&self, address: &Address, amount: u128) {
        self.state
            .lock()
            .accounts
            .entry(*address)
            .or_default()
            .balance += amount;
    }

    /// Number of transactions ever admitted
    pub fn transaction_count(&self) -> usize {
        self.state.lock().transactions.len()
    }
}

#[async_trait]
impl NetworkProvider for TestNetwork {
    async fn get_network_config(&self) -> ProviderResult<NetworkConfig> {
        let mut state = self.state.lock();
        state.take_fault("network/config")?;
        Ok(state.config.clone())
    }

    async fn get_network_status(&self, _shard: u32) -> ProviderResult<NetworkStatus> {
        let mut state = self.state.lock();
        state.take_fault("network/status")?;
        state.tick();
        Ok(NetworkStatus {
            current_round: state.round,
            epoch_number: state.round / state.config.rounds_per_epoch.max(1),
            highest_final_nonce: state.round,
        })
    }

    async fn get_account(&self, address: &Address) -> ProviderResult<AccountOnNetwork> {
        let mut state = self.state.lock();
        state.take_fault("address")?;
        state.tick();
        let shard = state.shard_of(address);
        Ok(match state.accounts.get(address) {
            Some(account) => AccountOnNetwork {
                address: *address,
                nonce: account.nonce,
                balance: account.balance,
                shard,
                owner: account.contract.as_ref().map(|c| c.owner),
                developer_reward: account
                    .contract
                    .as_ref()
                    .map(|c| c.developer_rewards)
                    .unwrap_or(0),
            },
            None => AccountOnNetwork {
                address: *address,
                nonce: 0,
                balance: 0,
                shard,
                owner: None,
                developer_reward: 0,
            },
        })
    }

    async fn get_token_balance(
        &self,
        address: &Address,
        identifier: &str,
        nonce: u64,
    ) -> ProviderResult<u128> {
        let mut state = self.state.lock();
        state.take_fault("address/token")?;
        state.tick();
        Ok(state
            .accounts
            .get(address)
            .and_then(|a| a.tokens.get(&(identifier.to_string(), nonce)))
            .copied()
            .unwrap_or(0))
    }

    async fn send_transaction(&self, tx: &Transaction) -> ProviderResult<Hash> {
        let mut state = self.state.lock();
        state.take_fault("transaction/send")?;
        state.admit(tx.clone()).map_err(ProviderError::Rejected)
    }

    async fn send_transactions(&self, txs: &[Transaction]) -> ProviderResult<BatchReceipt> {
        let mut state = self.state.lock();
        state.take_fault("transaction/send-multiple")?;

        // The network orders by sender and nonce, whatever the submission order
        let mut order: Vec<usize> = (0..txs.len()).collect();
        order.sort_by_key(|i| (txs[*i].sender, txs[*i].nonce));

        let mut receipt = BatchReceipt::default();
        for index in order {
            match state.admit(txs[index].clone()) {
                Ok(hash) => {
                    receipt.txs_hashes.insert(index, hash);
                }
                Err(reason) => {
                    receipt.rejected.insert(index, reason);
                }
            }
        }
        receipt.num_of_sent_txs = receipt.txs_hashes.len();
        Ok(receipt)
    }

    async fn get_transaction(&self, hash: &Hash) -> ProviderResult<TransactionOnNetwork> {
        let mut state = self.state.lock();
        state.take_fault("transaction")?;
        state.tick();

        let round = state.round;
        let delay = state.indexing_delay;
        match state.transactions.get(hash) {
            Some(entry) if round >= entry.admitted_round + delay => Ok(entry.to_api()),
            _ => Err(ProviderError::NotFound(format!("transaction {} not found", hash))),
        }
    }

    async fn query_contract(&self, query: &ContractQuery) -> ProviderResult<QueryResponse> {
        let mut state = self.state.lock();
        state.take_fault("vm-values/query")?;

        let args = query
            .args_bytes()
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;

        let failure = |code: ReturnCode, message: &str| QueryResponse {
            return_code: code,
            return_message: message.to_string(),
            return_data: Vec::new(),
        };

        let contract = match state
            .accounts
            .get(&query.sc_address)
            .and_then(|a| a.contract.as_ref())
        {
            Some(contract) => contract,
            None => return Ok(failure(ReturnCode::ContractNotFound, "contract not found")),
        };
        let program = match state.programs.get(&contract.code) {
            Some(program) => program,
            None => return Ok(failure(ReturnCode::ContractInvalid, "contract invalid")),
        };

        let ctx = QueryContext {
            caller: query.caller,
            contract: query.sc_address,
            storage: &contract.storage,
        };
        Ok(match program.query(&ctx, &query.func_name, &args) {
            Ok(values) => QueryResponse {
                return_code: ReturnCode::Ok,
                return_message: String::new(),
                return_data: values.iter().map(hex::encode).collect(),
            },
            Err(e) => failure(e.code, &e.message),
        })
    }
}
