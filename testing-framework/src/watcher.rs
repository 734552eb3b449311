// File: testing-framework/src/watcher.rs
//
// Transaction watcher
//
// Polls the network until a transaction reaches a terminal status or the
// deadline elapses:
//
//   Submitted -> Pending -> { Executed, Failed }
//        \          \
//         `----------`---> TimedOut
//
// Transient provider errors and "not found" answers (not indexed yet) are
// retried up to `max_transient_errors` consecutive times. Any other error
// ends the wait at once. A timed-out transaction may still land later.

use futures::future::try_join_all;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use shardnet_common::{
    api::{AccountOnNetwork, NetworkStatus, TransactionOnNetwork, TransactionStatus},
    crypto::{Address, Hash},
    transaction::Transaction,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::config::AwaitingOptions;
use crate::error::{HarnessError, Result};
use crate::network::{NetworkProvider, ProviderResult};
use crate::orchestrator::clock::Clock;
use crate::outcome::{ResultsParser, TransactionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Submitted,
    Pending,
    Executed,
    Failed,
    TimedOut,
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WatchState::Submitted | WatchState::Pending)
    }
}

pub struct TransactionWatcher {
    provider: Arc<dyn NetworkProvider>,
    clock: Arc<dyn Clock>,
    options: AwaitingOptions,
    states: Mutex<HashMap<Hash, WatchState>>,
    // Terminal results, returned as-is on later waits
    resolved: Mutex<HashMap<Hash, TransactionOnNetwork>>,
}

impl TransactionWatcher {
    pub fn new(
        provider: Arc<dyn NetworkProvider>,
        clock: Arc<dyn Clock>,
        options: AwaitingOptions,
    ) -> Self {
        Self {
            provider,
            clock,
            options,
            states: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &AwaitingOptions {
        &self.options
    }

    pub fn state_of(&self, hash: &Hash) -> Option<WatchState> {
        self.states.lock().get(hash).copied()
    }

    fn set_state(&self, hash: &Hash, state: WatchState) {
        trace!("{} -> {:?}", hash, state);
        self.states.lock().insert(hash.clone(), state);
    }

    /// Poll `check` until it yields a value.
    ///
    /// `check` returns `Ok(None)` while the condition does not hold yet.
    async fn poll<T, F, Fut>(&self, what: &str, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<Option<T>>>,
    {
        let deadline = self.clock.deadline(self.options.timeout);
        let mut consecutive_errors = 0u32;

        loop {
            match check().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => consecutive_errors = 0,
                Err(e) if e.is_transient() || e.is_not_found() => {
                    consecutive_errors += 1;
                    debug!(
                        "Retryable error while waiting for {} ({}/{}): {}",
                        what, consecutive_errors, self.options.max_transient_errors, e
                    );
                    if consecutive_errors > self.options.max_transient_errors {
                        return Err(HarnessError::NetworkTransient {
                            attempts: consecutive_errors,
                            last_error: e.to_string(),
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }

            if self.clock.is_past(deadline) {
                warn!("Timeout waiting for {} after {:?}", what, self.options.timeout);
                return Err(HarnessError::TimedOut {
                    what: what.to_string(),
                    after: self.options.timeout,
                });
            }
            self.clock.sleep(self.options.polling_interval).await;
        }
    }

    /// Wait until the transaction is executed or failed
    ///
    /// # Errors
    ///
    /// - `HarnessError::TimedOut` if the deadline elapses first
    /// - `HarnessError::NetworkTransient` after too many consecutive transient errors
    /// - `HarnessError::Provider` on a terminal provider error
    pub async fn await_completed(&self, hash: &Hash) -> Result<TransactionOnNetwork> {
        if let Some(tx) = self.resolved.lock().get(hash) {
            return Ok(tx.clone());
        }

        if self.state_of(hash).is_none() {
            self.set_state(hash, WatchState::Submitted);
        }

        let what = format!("transaction {}", hash);
        let result = self
            .poll(&what, || async move {
                self.provider.get_transaction(hash).await.map(|tx| {
                    if tx.status.is_completed() {
                        return Some(tx);
                    }
                    self.set_state(hash, WatchState::Pending);
                    None
                })
            })
            .await;

        match result {
            Ok(tx) => {
                let state = if tx.status == TransactionStatus::Success {
                    WatchState::Executed
                } else {
                    WatchState::Failed
                };
                self.set_state(hash, state);
                debug!("{} completed with status {}", hash, tx.status);
                self.resolved.lock().insert(hash.clone(), tx.clone());
                Ok(tx)
            }
            Err(e) => {
                if matches!(e, HarnessError::TimedOut { .. }) {
                    self.set_state(hash, WatchState::TimedOut);
                }
                Err(e)
            }
        }
    }

    /// `await_completed` decoded into an outcome
    pub async fn await_outcome(&self, hash: &Hash) -> Result<TransactionOutcome> {
        let tx = self.await_completed(hash).await?;
        Ok(ResultsParser::parse(&tx))
    }

    /// Wait for several transactions; no ordering between them
    pub async fn await_all(&self, hashes: &[Hash]) -> Result<Vec<TransactionOnNetwork>> {
        try_join_all(hashes.iter().map(|hash| self.await_completed(hash))).await
    }

    /// Wait until the sender's nonce moved past the transaction, then fetch it
    pub async fn await_processing_started(&self, tx: &Transaction) -> Result<TransactionOnNetwork> {
        let sender = tx.sender;
        let nonce = tx.nonce;
        let what = format!("nonce of {} above {}", sender, nonce);
        self.await_account_condition(&sender, &what, |account| account.nonce > nonce)
            .await?;

        let hash = tx.hash();
        self.poll(&format!("transaction {}", hash), || {
            let hash = hash.clone();
            async move { self.provider.get_transaction(&hash).await.map(Some) }
        })
        .await
    }

    /// Poll an account until `condition` holds
    pub async fn await_account_condition<C>(
        &self,
        address: &Address,
        what: &str,
        condition: C,
    ) -> Result<AccountOnNetwork>
    where
        C: Fn(&AccountOnNetwork) -> bool,
    {
        let condition = &condition;
        self.poll(what, || async move {
            self.provider
                .get_account(address)
                .await
                .map(|account| condition(&account).then_some(account))
        })
        .await
    }

    /// Poll the status of a shard until the given epoch is reached
    pub async fn wait_until_epoch(&self, shard: u32, epoch: u64) -> Result<NetworkStatus> {
        self.poll(&format!("epoch {} on shard {}", epoch, shard), || async move {
            self.provider
                .get_network_status(shard)
                .await
                .map(|status| (status.epoch_number >= epoch).then_some(status))
        })
        .await
    }
}
