// File: testing-framework/src/transactions.rs
//
// Transaction construction and signing.
//
// The factory turns an intent (transfer, token payment, contract call,
// deployment, token management, relaying) into an unsigned `Transaction`
// with the network's chain id, gas price and a gas limit; `sign` hands the
// signing bytes to the sender's signer. The factory never holds key material.

use log::trace;
use shardnet_common::{
    api::NetworkConfig,
    config::{
        ADDITIONAL_GAS_FOR_NFT_TRANSFER, ADDITIONAL_GAS_FOR_RELAYED_V3,
        ADDITIONAL_GAS_FOR_TOKEN_TRANSFER, BUILTIN_RELAYED_V1, BUILTIN_RELAYED_V2,
        GAS_LIMIT_CHANGE_OWNER, GAS_LIMIT_CLAIM_DEVELOPER_REWARDS, GAS_LIMIT_NFT_CREATE,
        GAS_LIMIT_SET_SPECIAL_ROLE, GAS_LIMIT_TOKEN_ISSUE, GAS_LIMIT_TOKEN_TRANSFER,
        TOKEN_ISSUE_COST, TRANSACTION_VERSION,
    },
    crypto::{Address, CryptoError, Hash, Signer},
    transaction::{
        args::deploy_data,
        management::{
            change_owner_data, claim_developer_rewards_data, issue_fungible_data,
            issue_non_fungible_data, issue_semi_fungible_data, set_special_role_data,
        },
        payment::{multi_transfer_data, nft_transfer_data, token_transfer_data},
        CallData, CodeMetadata, ContractArg, NftCreate, TokenPayment, TokenProperties, Transaction,
    },
};

use crate::error::{HarnessError, Result};

/// A signed transaction and its content hash, ready to broadcast
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx: Transaction,
    pub hash: Hash,
}

impl PendingTransaction {
    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    pub fn sender(&self) -> Address {
        self.tx.sender
    }

    pub fn is_cross_shard(&self, num_shards: u32) -> bool {
        self.tx.sender.shard(num_shards) != self.tx.receiver.shard(num_shards)
    }
}

/// Call of a contract endpoint
#[derive(Clone, Debug)]
pub struct ContractCall {
    pub contract: Address,
    pub data: CallData,
    pub value: u128,
    pub gas_limit: u64,
}

impl ContractCall {
    pub fn new(contract: Address, function: impl Into<String>, gas_limit: u64) -> Self {
        Self {
            contract,
            data: CallData::new(function),
            value: 0,
            gas_limit,
        }
    }

    pub fn arg(mut self, arg: impl Into<ContractArg>) -> Self {
        self.data = self.data.arg(arg);
        self
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// Deployment of contract code
#[derive(Clone, Debug)]
pub struct ContractDeploy {
    pub code: Vec<u8>,
    pub metadata: CodeMetadata,
    pub args: Vec<ContractArg>,
    pub value: u128,
    pub gas_limit: u64,
}

impl ContractDeploy {
    pub fn new(code: impl Into<Vec<u8>>, gas_limit: u64) -> Self {
        Self {
            code: code.into(),
            metadata: CodeMetadata::default(),
            args: Vec::new(),
            value: 0,
            gas_limit,
        }
    }

    pub fn arg(mut self, arg: impl Into<ContractArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_metadata(mut self, metadata: CodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

pub struct TransactionFactory {
    config: NetworkConfig,
    chain_id: String,
}

impl TransactionFactory {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            chain_id: config.chain_id.clone(),
            config,
        }
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn create(
        &self,
        sender: &Address,
        receiver: &Address,
        nonce: u64,
        value: u128,
        data: Vec<u8>,
        gas_limit: u64,
    ) -> Transaction {
        Transaction {
            nonce,
            value,
            receiver: *receiver,
            sender: *sender,
            gas_price: self.config.min_gas_price,
            gas_limit,
            data,
            chain_id: self.chain_id.clone(),
            version: TRANSACTION_VERSION,
            signature: None,
            relayer: None,
            relayer_signature: None,
        }
    }

    /// Native value transfer; the data field is arbitrary bytes
    pub fn transfer(
        &self,
        sender: &Address,
        receiver: &Address,
        nonce: u64,
        value: u128,
        data: Vec<u8>,
    ) -> Transaction {
        let gas_limit = self.config.move_balance_gas(data.len());
        self.create(sender, receiver, nonce, value, data, gas_limit)
    }

    /// Transfer of one payment; native payments become value transfers
    pub fn token_transfer(
        &self,
        sender: &Address,
        receiver: &Address,
        nonce: u64,
        payment: &TokenPayment,
    ) -> Transaction {
        if payment.is_native() {
            return self.transfer(sender, receiver, nonce, payment.amount, Vec::new());
        }

        if payment.is_fungible() {
            let data = token_transfer_data(payment).to_bytes();
            let gas_limit = self.config.move_balance_gas(data.len()) + GAS_LIMIT_TOKEN_TRANSFER;
            return self.create(sender, receiver, nonce, 0, data, gas_limit);
        }

        // NFT and SFT transfers are sent to self, the receiver travels in the data
        let data = nft_transfer_data(payment, receiver).to_bytes();
        let gas_limit = self.config.move_balance_gas(data.len())
            + GAS_LIMIT_TOKEN_TRANSFER
            + ADDITIONAL_GAS_FOR_NFT_TRANSFER;
        self.create(sender, sender, nonce, 0, data, gas_limit)
    }

    /// Several token payments in one transaction, sent to self
    pub fn multi_token_transfer(
        &self,
        sender: &Address,
        receiver: &Address,
        nonce: u64,
        payments: &[TokenPayment],
    ) -> Transaction {
        let data = multi_transfer_data(receiver, payments).to_bytes();
        let per_payment: u64 = payments
            .iter()
            .map(|p| {
                if p.is_native() || p.is_fungible() {
                    ADDITIONAL_GAS_FOR_TOKEN_TRANSFER
                } else {
                    ADDITIONAL_GAS_FOR_NFT_TRANSFER
                }
            })
            .sum();
        let gas_limit =
            self.config.move_balance_gas(data.len()) + GAS_LIMIT_TOKEN_TRANSFER + per_payment;
        self.create(sender, sender, nonce, 0, data, gas_limit)
    }

    pub fn contract_call(&self, sender: &Address, nonce: u64, call: &ContractCall) -> Transaction {
        let data = call.data.to_bytes();
        self.create(sender, &call.contract, nonce, call.value, data, call.gas_limit)
    }

    /// Deployment transaction and the address the contract will get.
    ///
    /// The address only depends on the sender and the nonce, so it can be
    /// saved before the transaction is even broadcast.
    pub fn contract_deploy(
        &self,
        sender: &Address,
        nonce: u64,
        deploy: &ContractDeploy,
    ) -> (Transaction, Address) {
        let data = deploy_data(&deploy.code, deploy.metadata, &deploy.args).to_bytes();
        let tx = self.create(sender, &Address::zero(), nonce, deploy.value, data, deploy.gas_limit);
        (tx, Address::compute_contract_address(sender, nonce))
    }

    /// Issue a fungible token; the whole supply goes to the sender.
    /// The identifier is returned by the token issuer once executed.
    pub fn issue_fungible(
        &self,
        sender: &Address,
        nonce: u64,
        name: &str,
        ticker: &str,
        initial_supply: u128,
        decimals: u32,
        properties: &TokenProperties,
    ) -> Transaction {
        let data = issue_fungible_data(name, ticker, initial_supply, decimals, properties);
        self.token_issuer_call(sender, nonce, TOKEN_ISSUE_COST, data, GAS_LIMIT_TOKEN_ISSUE)
    }

    pub fn issue_non_fungible(
        &self,
        sender: &Address,
        nonce: u64,
        name: &str,
        ticker: &str,
        properties: &TokenProperties,
    ) -> Transaction {
        let data = issue_non_fungible_data(name, ticker, properties);
        self.token_issuer_call(sender, nonce, TOKEN_ISSUE_COST, data, GAS_LIMIT_TOKEN_ISSUE)
    }

    pub fn issue_semi_fungible(
        &self,
        sender: &Address,
        nonce: u64,
        name: &str,
        ticker: &str,
        properties: &TokenProperties,
    ) -> Transaction {
        let data = issue_semi_fungible_data(name, ticker, properties);
        self.token_issuer_call(sender, nonce, TOKEN_ISSUE_COST, data, GAS_LIMIT_TOKEN_ISSUE)
    }

    /// Grant roles on an issued token, sent by its owner
    pub fn set_special_roles(
        &self,
        sender: &Address,
        nonce: u64,
        identifier: &str,
        user: &Address,
        roles: &[&str],
    ) -> Transaction {
        let data = set_special_role_data(identifier, user, roles);
        self.token_issuer_call(sender, nonce, 0, data, GAS_LIMIT_SET_SPECIAL_ROLE)
    }

    fn token_issuer_call(
        &self,
        sender: &Address,
        nonce: u64,
        value: u128,
        data: CallData,
        gas_limit: u64,
    ) -> Transaction {
        self.create(sender, &Address::token_issuer(), nonce, value, data.to_bytes(), gas_limit)
    }

    /// Create an NFT or SFT nonce; needs the create role, sent to self
    pub fn nft_create(&self, sender: &Address, nonce: u64, create: &NftCreate) -> Transaction {
        let data = create.to_call_data().to_bytes();
        let gas_limit = self.config.move_balance_gas(data.len()) + GAS_LIMIT_NFT_CREATE;
        self.create(sender, sender, nonce, 0, data, gas_limit)
    }

    /// Hand a contract over to `new_owner`, sent by the current owner
    pub fn change_owner(
        &self,
        sender: &Address,
        nonce: u64,
        contract: &Address,
        new_owner: &Address,
    ) -> Transaction {
        let data = change_owner_data(new_owner).to_bytes();
        self.create(sender, contract, nonce, 0, data, GAS_LIMIT_CHANGE_OWNER)
    }

    pub fn claim_developer_rewards(
        &self,
        sender: &Address,
        nonce: u64,
        contract: &Address,
    ) -> Transaction {
        let data = claim_developer_rewards_data().to_bytes();
        self.create(sender, contract, nonce, 0, data, GAS_LIMIT_CLAIM_DEVELOPER_REWARDS)
    }

    /// Have `relayer` pay the fee of an unsigned transaction (v3).
    ///
    /// Both the sender and the relayer sign the result, in any order:
    /// `sign` then `sign_as_relayer`.
    pub fn relayed_v3(&self, mut tx: Transaction, relayer: &Address) -> Transaction {
        tx.relayer = Some(*relayer);
        tx.gas_limit += ADDITIONAL_GAS_FOR_RELAYED_V3;
        tx
    }

    /// Wrap a signed transaction into `relayedTx@<json>`, sent by `relayer`
    /// to the inner sender. The relayer signs it with `sign`.
    ///
    /// # Errors
    ///
    /// `HarnessError::InvalidRelay` if the inner transaction carries a
    /// relayer or an outer payload, or is unsigned.
    pub fn relayed_v1(
        &self,
        inner: &PendingTransaction,
        relayer: &Address,
        relayer_nonce: u64,
    ) -> Result<Transaction> {
        check_relayable(&inner.tx)?;
        let data = CallData::new(BUILTIN_RELAYED_V1)
            .raw_arg(serde_json::to_vec(&inner.tx)?)
            .to_bytes();
        let gas_limit = self.config.move_balance_gas(data.len()) + inner.tx.gas_limit;
        Ok(self.create(relayer, &inner.tx.sender, relayer_nonce, 0, data, gas_limit))
    }

    /// Wrap a signed transaction into
    /// `relayedTxV2@<receiver>@<nonce>@<data>@<signature>`, sent by `relayer`
    /// to the inner sender.
    ///
    /// The inner transaction is signed with a zero gas limit, no value and
    /// runs on `inner_gas_limit` paid by the relayer.
    ///
    /// # Errors
    ///
    /// `HarnessError::InvalidRelay` if the inner transaction has a gas
    /// limit, value, a relayer, or no signature.
    pub fn relayed_v2(
        &self,
        inner: &PendingTransaction,
        relayer: &Address,
        relayer_nonce: u64,
        inner_gas_limit: u64,
    ) -> Result<Transaction> {
        check_relayable(&inner.tx)?;
        if inner.tx.gas_limit != 0 || inner.tx.value != 0 {
            return Err(HarnessError::InvalidRelay(
                "relayed v2 needs an inner transaction without gas limit and value".to_string(),
            ));
        }
        let signature = inner
            .tx
            .signature
            .as_ref()
            .ok_or_else(|| HarnessError::InvalidRelay("inner transaction is not signed".into()))?;
        let data = CallData::new(BUILTIN_RELAYED_V2)
            .arg(inner.tx.receiver)
            .arg(inner.tx.nonce)
            .raw_arg(inner.tx.data.clone())
            .raw_arg(signature.as_bytes().to_vec())
            .to_bytes();
        let gas_limit = self.config.move_balance_gas(data.len()) + inner_gas_limit;
        Ok(self.create(relayer, &inner.tx.sender, relayer_nonce, 0, data, gas_limit))
    }

    /// Sign through the sender's signer and compute the hash
    ///
    /// # Errors
    ///
    /// Fails if the signer does not sign for the transaction sender or if
    /// the signer itself fails.
    pub async fn sign(
        &self,
        signer: &dyn Signer,
        mut tx: Transaction,
    ) -> Result<PendingTransaction> {
        if signer.address() != tx.sender {
            return Err(CryptoError::SigningFailed(format!(
                "signer {} cannot sign for sender {}",
                signer.address(),
                tx.sender
            ))
            .into());
        }

        let signature = signer.sign(&tx.signing_bytes()).await?;
        tx.apply_signature(signature);
        let hash = tx.hash();
        trace!("Signed transaction {} (nonce {})", hash, tx.nonce);
        Ok(PendingTransaction { tx, hash })
    }

    /// Add the relayer's signature to a v3 transaction; the hash changes.
    ///
    /// # Errors
    ///
    /// Fails if the transaction has no relayer or `signer` is not it.
    pub async fn sign_as_relayer(
        &self,
        signer: &dyn Signer,
        pending: PendingTransaction,
    ) -> Result<PendingTransaction> {
        let mut tx = pending.tx;
        if tx.relayer != Some(signer.address()) {
            return Err(CryptoError::SigningFailed(format!(
                "signer {} is not the relayer of the transaction",
                signer.address()
            ))
            .into());
        }

        let signature = signer.sign(&tx.signing_bytes()).await?;
        tx.apply_relayer_signature(signature);
        let hash = tx.hash();
        trace!("Relayer signed transaction {} (nonce {})", hash, tx.nonce);
        Ok(PendingTransaction { tx, hash })
    }
}

fn check_relayable(tx: &Transaction) -> Result<()> {
    if tx.relayer.is_some() {
        return Err(HarnessError::InvalidRelay("inner transaction has a relayer".into()));
    }
    let nested = CallData::parse(&tx.data)
        .map(|d| d.function() == BUILTIN_RELAYED_V1 || d.function() == BUILTIN_RELAYED_V2)
        .unwrap_or(false);
    if nested {
        return Err(HarnessError::InvalidRelay("inner transaction is relayed".into()));
    }
    if !tx.is_signed() {
        return Err(HarnessError::InvalidRelay("inner transaction is not signed".into()));
    }
    Ok(())
}
