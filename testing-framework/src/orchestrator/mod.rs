// File: testing-framework/src/orchestrator/mod.rs
//
// Test session context
//
// One owned value carries everything a suite needs: the session store,
// the nonce tracker, the audit trail, the watcher and the dispatcher. It is
// passed into every step instead of living in a process-wide singleton.

/// Clock abstractions for deterministic time control in tests
pub mod clock;
/// Sequential step execution with per-step budget and reconciled retry
pub mod steps;

pub use clock::{Clock, PausedClock, SystemClock};
pub use steps::StepRunner;

use log::{debug, info, warn};
use serde_json::Value;
use shardnet_common::{
    api::{BatchReceipt, ContractQuery, NetworkConfig, QueryResponse},
    crypto::{Address, Hash},
    transaction::{Transaction, TokenPayment},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audit::{AuditTrail, Report, SnapshotComparison};
use crate::config::{AwaitingOptions, DispatchOptions};
use crate::dispatch::BatchDispatcher;
use crate::error::{HarnessError, Result};
use crate::network::{NetworkProvider, ProviderError, ProxyNetworkProvider};
use crate::nonce::NonceTracker;
use crate::outcome::{ResultsParser, TransactionOutcome};
use crate::session::{Session, AUDIT_TREE};
use crate::transactions::{ContractCall, ContractDeploy, PendingTransaction, TransactionFactory};
use crate::users::TestUser;
use crate::watcher::TransactionWatcher;

/// Builder for a `TestSession`
///
/// # Example
///
/// ```rust,ignore
/// let network = Arc::new(TestNetworkBuilder::new().with_account(alice, COIN_VALUE).build());
/// let mut session = TestSessionBuilder::new("local", dir.path())
///     .with_provider(network)
///     .with_clock(Arc::new(PausedClock))
///     .build()
///     .await?;
/// ```
pub struct TestSessionBuilder {
    profile: String,
    base_dir: PathBuf,
    provider: Option<Arc<dyn NetworkProvider>>,
    clock: Option<Arc<dyn Clock>>,
    awaiting: AwaitingOptions,
}

impl TestSessionBuilder {
    pub fn new(profile: impl Into<String>, base_dir: impl AsRef<Path>) -> Self {
        Self {
            profile: profile.into(),
            base_dir: base_dir.as_ref().to_path_buf(),
            provider: None,
            clock: None,
            awaiting: AwaitingOptions::default(),
        }
    }

    /// Use this provider instead of a proxy built from the profile URL
    pub fn with_provider(mut self, provider: Arc<dyn NetworkProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_awaiting_options(mut self, options: AwaitingOptions) -> Self {
        self.awaiting = options;
        self
    }

    /// Load the session and fetch the network configuration
    ///
    /// # Errors
    ///
    /// - `HarnessError::SessionLoad` if the profile or the store cannot be read
    /// - `HarnessError::Provider` if the network configuration cannot be fetched
    pub async fn build(self) -> Result<TestSession> {
        let session = Session::load(&self.profile, &self.base_dir).await?;

        let provider: Arc<dyn NetworkProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(ProxyNetworkProvider::new(session.profile().proxy_url.clone())?),
        };
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let config = provider.get_network_config().await?;
        let mut factory = TransactionFactory::new(config);
        if let Some(chain_id) = &session.profile().chain_id {
            factory = factory.with_chain_id(chain_id.clone());
        }

        let audit = AuditTrail::new(
            session.store().open_tree(AUDIT_TREE)?,
            session.base_dir(),
            session.name(),
        )?;
        let watcher = TransactionWatcher::new(provider.clone(), clock.clone(), self.awaiting);
        let dispatcher = BatchDispatcher::new(provider.clone(), clock.clone());

        info!(
            "Test session '{}' ready on chain '{}' ({} shards)",
            session.name(),
            factory.chain_id(),
            factory.config().num_shards
        );

        Ok(TestSession {
            session,
            provider,
            clock,
            factory,
            nonces: NonceTracker::new(),
            audit,
            watcher,
            dispatcher,
        })
    }
}

pub struct TestSession {
    session: Session,
    provider: Arc<dyn NetworkProvider>,
    clock: Arc<dyn Clock>,
    factory: TransactionFactory,
    nonces: NonceTracker,
    audit: AuditTrail,
    watcher: TransactionWatcher,
    dispatcher: BatchDispatcher,
}

impl TestSession {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn provider(&self) -> &Arc<dyn NetworkProvider> {
        &self.provider
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn network_config(&self) -> &NetworkConfig {
        self.factory.config()
    }

    pub fn factory(&self) -> &TransactionFactory {
        &self.factory
    }

    pub fn nonces(&self) -> &NonceTracker {
        &self.nonces
    }

    pub fn nonces_mut(&mut self) -> &mut NonceTracker {
        &mut self.nonces
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn watcher(&self) -> &TransactionWatcher {
        &self.watcher
    }

    pub fn dispatcher(&self) -> &BatchDispatcher {
        &self.dispatcher
    }

    /// A bootstrap user, cloned so it can be held across mutable calls
    pub fn user(&self, name: &str) -> Result<TestUser> {
        self.session.get_user(name).cloned()
    }

    pub fn group(&self, name: &str) -> Result<Vec<TestUser>> {
        self.session.get_group(name)
    }

    pub async fn save_address(&self, name: &str, address: &Address) -> Result<()> {
        self.session.save_address(name, address).await
    }

    pub fn load_address(&self, name: &str) -> Result<Address> {
        self.session.load_address(name)
    }

    pub async fn sync_users(&mut self, users: &[TestUser]) -> Result<()> {
        self.nonces.sync_users(self.provider.as_ref(), users).await
    }

    /// Resynchronize every address the tracker holds a cursor for
    pub async fn resync_tracked(&mut self) -> Result<()> {
        let addresses = self.nonces.tracked();
        debug!("Resyncing {} nonce cursors", addresses.len());
        self.nonces.sync_addresses(self.provider.as_ref(), &addresses).await
    }

    /// Label attached to the following audit events
    pub fn set_step(&mut self, label: impl Into<String>) {
        self.audit.set_step(label);
    }

    pub async fn sign(&self, user: &TestUser, tx: Transaction) -> Result<PendingTransaction> {
        self.factory.sign(user.signer(), tx).await
    }

    /// Any factory-built transaction with the next nonce of `sender`
    ///
    /// ```rust,ignore
    /// let issue = session
    ///     .build_with(&alice, |f, sender, nonce| {
    ///         f.issue_fungible(sender, nonce, "Rose", "ROSE", supply, 6, &TokenProperties::all())
    ///     })
    ///     .await?;
    /// ```
    pub async fn build_with<F>(&mut self, sender: &TestUser, make: F) -> Result<PendingTransaction>
    where
        F: FnOnce(&TransactionFactory, &Address, u64) -> Transaction,
    {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let tx = make(&self.factory, &sender.address(), nonce);
        self.sign(sender, tx).await
    }

    /// Like `build_with`, with the fee paid by `relayer` (v3)
    pub async fn build_relayed<F>(
        &mut self,
        sender: &TestUser,
        relayer: &TestUser,
        make: F,
    ) -> Result<PendingTransaction>
    where
        F: FnOnce(&TransactionFactory, &Address, u64) -> Transaction,
    {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let tx = make(&self.factory, &sender.address(), nonce);
        let tx = self.factory.relayed_v3(tx, &relayer.address());
        let pending = self.sign(sender, tx).await?;
        self.factory.sign_as_relayer(relayer.signer(), pending).await
    }

    /// Wrap a transaction signed by another user into a v1 relayed one,
    /// sent with the next nonce of `relayer`
    pub async fn build_relayed_v1(
        &mut self,
        relayer: &TestUser,
        inner: &PendingTransaction,
    ) -> Result<PendingTransaction> {
        // The nonce is only taken once the wrapping succeeds
        let nonce = self.nonces.get_nonce(relayer)?;
        let tx = self.factory.relayed_v1(inner, &relayer.address(), nonce)?;
        self.nonces.get_nonce_then_increment(relayer)?;
        self.sign(relayer, tx).await
    }

    /// v2 counterpart of `build_relayed_v1`; `inner` must be signed with no gas limit
    pub async fn build_relayed_v2(
        &mut self,
        relayer: &TestUser,
        inner: &PendingTransaction,
        inner_gas_limit: u64,
    ) -> Result<PendingTransaction> {
        let nonce = self.nonces.get_nonce(relayer)?;
        let tx = self
            .factory
            .relayed_v2(inner, &relayer.address(), nonce, inner_gas_limit)?;
        self.nonces.get_nonce_then_increment(relayer)?;
        self.sign(relayer, tx).await
    }

    /// Native transfer with the next nonce of `sender`
    pub async fn build_transfer(
        &mut self,
        sender: &TestUser,
        receiver: &Address,
        value: u128,
    ) -> Result<PendingTransaction> {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let tx = self
            .factory
            .transfer(&sender.address(), receiver, nonce, value, Vec::new());
        self.sign(sender, tx).await
    }

    /// Native transfer carrying arbitrary data
    pub async fn build_transfer_with_data(
        &mut self,
        sender: &TestUser,
        receiver: &Address,
        value: u128,
        data: Vec<u8>,
    ) -> Result<PendingTransaction> {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let tx = self.factory.transfer(&sender.address(), receiver, nonce, value, data);
        self.sign(sender, tx).await
    }

    pub async fn build_token_transfer(
        &mut self,
        sender: &TestUser,
        receiver: &Address,
        payment: &TokenPayment,
    ) -> Result<PendingTransaction> {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let tx = self
            .factory
            .token_transfer(&sender.address(), receiver, nonce, payment);
        self.sign(sender, tx).await
    }

    pub async fn build_call(
        &mut self,
        sender: &TestUser,
        call: &ContractCall,
    ) -> Result<PendingTransaction> {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let tx = self.factory.contract_call(&sender.address(), nonce, call);
        self.sign(sender, tx).await
    }

    /// Deployment transaction and the future contract address
    pub async fn build_deploy(
        &mut self,
        sender: &TestUser,
        deploy: &ContractDeploy,
    ) -> Result<(PendingTransaction, Address)> {
        let nonce = self.nonces.get_nonce_then_increment(sender)?;
        let (tx, contract) = self.factory.contract_deploy(&sender.address(), nonce, deploy);
        Ok((self.sign(sender, tx).await?, contract))
    }

    /// Broadcast one transaction
    ///
    /// # Errors
    ///
    /// `HarnessError::TransactionRejected` if the network refuses it; the
    /// attempt and its rejection are audited all the same.
    pub async fn send(&mut self, pending: &PendingTransaction) -> Result<Hash> {
        self.audit.on_transaction_sent(pending)?;
        match self.provider.send_transaction(&pending.tx).await {
            Ok(hash) => Ok(hash),
            Err(ProviderError::Rejected(reason)) => {
                warn!("Transaction {} rejected: {}", pending.hash, reason);
                let outcome = TransactionOutcome::rejected(reason.clone());
                self.audit.on_contract_outcome(&pending.hash, &outcome)?;
                Err(HarnessError::TransactionRejected {
                    hash: pending.hash.clone(),
                    reason,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Broadcast, wait for completion and decode the outcome.
    /// A broadcast rejection is returned as a `Rejected` failure.
    pub async fn send_and_await(
        &mut self,
        pending: &PendingTransaction,
    ) -> Result<TransactionOutcome> {
        match self.send(pending).await {
            Ok(hash) => self.await_outcome(&hash).await,
            Err(HarnessError::TransactionRejected { reason, .. }) => {
                Ok(TransactionOutcome::rejected(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for a transaction sent earlier and audit its completion
    pub async fn await_outcome(&mut self, hash: &Hash) -> Result<TransactionOutcome> {
        let tx = self.watcher.await_completed(hash).await?;
        self.audit.on_transaction_completed(&tx)?;
        let outcome = ResultsParser::parse(&tx);
        self.audit.on_contract_outcome(hash, &outcome)?;
        Ok(outcome)
    }

    /// Bulk submit, auditing every entry as sent and every rejection
    pub async fn submit_batch(
        &mut self,
        txs: &[PendingTransaction],
        options: &DispatchOptions,
    ) -> Result<BatchReceipt> {
        for pending in txs {
            self.audit.on_transaction_sent(pending)?;
        }
        let receipt = self.dispatcher.submit_in_chunks(txs, options).await?;
        for (index, reason) in &receipt.rejected {
            if let Some(pending) = txs.get(*index) {
                let outcome = TransactionOutcome::rejected(reason.clone());
                self.audit.on_contract_outcome(&pending.hash, &outcome)?;
            }
        }
        Ok(receipt)
    }

    pub async fn query(&self, query: &ContractQuery) -> Result<QueryResponse> {
        Ok(self.provider.query_contract(query).await?)
    }

    /// Query a view function returning one unsigned integer
    ///
    /// # Errors
    ///
    /// `HarnessError::Assertion` if the query does not succeed.
    pub async fn query_biguint(&self, query: &ContractQuery) -> Result<u128> {
        let response = self.query(query).await?;
        if !response.is_success() {
            return Err(HarnessError::Assertion(format!(
                "query '{}' failed: {} {}",
                query.func_name, response.return_code, response.return_message
            )));
        }
        Ok(response.first_as_biguint()?)
    }

    pub fn snapshot(
        &mut self,
        name: &str,
        state: Value,
        comparable_to: Option<&str>,
    ) -> Result<Option<SnapshotComparison>> {
        self.audit.on_snapshot(name, state, comparable_to)
    }

    pub async fn generate_report(&self) -> Result<Report> {
        self.audit.generate_report().await
    }

    /// Close the audit trail and the store; allowed once
    pub async fn destroy(&mut self) -> Result<()> {
        self.audit.close().await?;
        self.session.destroy().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use crate::session::{IndividualEntry, SessionProfile, UsersConfig};
    use crate::testnet::TestNetworkBuilder;
    use shardnet_common::{config::COIN_VALUE, crypto::KeyPair};
    use tempfile::TempDir;

    pub(crate) async fn setup(
        dir: &TempDir,
        funded: bool,
    ) -> (Arc<crate::testnet::TestNetwork>, TestSession) {
        let alice = KeyPair::from_seed([1; 32]);
        SessionProfile {
            proxy_url: "http://localhost:7950".to_string(),
            chain_id: None,
            users: UsersConfig {
                individuals: vec![IndividualEntry {
                    name: "alice".to_string(),
                    secret_key: hex::encode([1u8; 32]),
                }],
                groups: Vec::new(),
            },
        }
        .save(dir.path(), "local")
        .await
        .unwrap();

        let mut builder = TestNetworkBuilder::new();
        if funded {
            builder = builder.with_account(alice.address(), COIN_VALUE);
        }
        let network = Arc::new(builder.build());
        let session = TestSessionBuilder::new("local", dir.path())
            .with_provider(network.clone())
            .with_clock(Arc::new(PausedClock))
            .build()
            .await
            .unwrap();
        (network, session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_and_await_audits_lifecycle() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        let alice = session.user("alice").unwrap();
        session.sync_users(&[alice.clone()]).await.unwrap();

        session.set_step("transfer");
        let pending = session
            .build_transfer(&alice, &Address::new([7; 32]), 5)
            .await
            .unwrap();
        let outcome = session.send_and_await(&pending).await.unwrap();
        assert!(outcome.is_success());

        let kinds: Vec<_> = session
            .audit()
            .events()
            .unwrap()
            .into_iter()
            .map(|e| (e.step, e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("transfer".to_string(), crate::audit::AuditKind::Sent),
                ("transfer".to_string(), crate::audit::AuditKind::Completed),
                ("transfer".to_string(), crate::audit::AuditKind::ContractOutcome),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_an_outcome_and_audited() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, false).await;
        let alice = session.user("alice").unwrap();
        session.sync_users(&[alice.clone()]).await.unwrap();

        let pending = session
            .build_transfer(&alice, &Address::new([7; 32]), 5)
            .await
            .unwrap();
        let outcome = session.send_and_await(&pending).await.unwrap();
        assert_eq!(outcome.failure_code(), Some(crate::outcome::FailureCode::Rejected));

        let events = session.audit().events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].payload["result"]["message"], "insufficient funds");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsynced_user_cannot_build() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        let alice = session.user("alice").unwrap();
        let err = session
            .build_transfer(&alice, &Address::new([7; 32]), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::NotSynced(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_once() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        session.destroy().await.unwrap();
        assert!(matches!(session.user("alice"), Err(HarnessError::SessionClosed)));
        assert!(matches!(session.destroy().await, Err(HarnessError::SessionClosed)));
    }
}
