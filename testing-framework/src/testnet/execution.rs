// Admission and round processing of the in-process network.
//
// Fee model: the payer (sender, or relayer of a relayed transaction) locks
// gas limit * gas price at source and the sender locks the value. A
// successful execution costs the move-balance fee plus the execution gas
// at a discounted price; a failed contract call costs the move-balance fee
// only. Whatever is left of the locked fee goes back to the payer, and the
// value of a failed execution back to the sender.

use log::{debug, trace};
use shardnet_common::{
    api::{LogEvent, ReturnCode, SmartContractResult, TransactionStatus},
    config::{
        ADDITIONAL_GAS_FOR_RELAYED_V3, BUILTIN_CHANGE_OWNER, BUILTIN_CLAIM_DEVELOPER_REWARDS,
        BUILTIN_MULTI_TRANSFER, BUILTIN_NFT_CREATE, BUILTIN_NFT_TRANSFER, BUILTIN_TOKEN_TRANSFER,
        DEVELOPER_FEES_PERCENTAGE, METACHAIN_ID, VM_TYPE_WASM,
    },
    crypto::{hash, Address, Hash},
    transaction::{
        args::{top_decode_biguint, top_decode_u64},
        CallData, CodeMetadata, Transaction,
    },
};

use super::programs::{CallContext, ContractError, ContractStorage};
use super::relayed::{self, Relaying};
use super::{Account, Action, ContractAccount, NetworkState, Stage, TxEntry};

pub(crate) const SIGNAL_ERROR_EVENT: &str = "signalError";
const DEPLOY_EVENT: &str = "SCDeploy";

// Successful execution: returned values and execution gas (on top of move-balance gas)
pub(super) struct Executed {
    pub(super) values: Vec<Vec<u8>>,
    pub(super) gas_used: u64,
}

fn signal_error(emitter: Address, sender: &Address, error: &ContractError) -> LogEvent {
    LogEvent {
        address: emitter,
        identifier: SIGNAL_ERROR_EVENT.to_string(),
        topics: vec![sender.to_hex(), hex::encode(&error.message)],
        data: Some(format!("@{}", hex::encode(error.code.to_string()))),
    }
}

fn utf8_arg(bytes: &[u8]) -> Option<String> {
    String::from_utf8(bytes.to_vec()).ok()
}

// Decode built-in token transfers; None if the data is not a well-formed one
fn parse_token_transfer(tx: &Transaction) -> Option<Action> {
    let data = CallData::parse(&tx.data).ok()?;
    let args = data.args();
    match data.function() {
        BUILTIN_TOKEN_TRANSFER if args.len() >= 2 => Some(Action::TokenTransfer {
            receiver: tx.receiver,
            transfers: vec![(utf8_arg(&args[0])?, 0, top_decode_biguint(&args[1]).ok()?)],
        }),
        BUILTIN_NFT_TRANSFER if args.len() >= 4 && tx.sender == tx.receiver => {
            Some(Action::TokenTransfer {
                receiver: Address::from_slice(&args[3]).ok()?,
                transfers: vec![(
                    utf8_arg(&args[0])?,
                    top_decode_u64(&args[1]).ok()?,
                    top_decode_biguint(&args[2]).ok()?,
                )],
            })
        }
        BUILTIN_MULTI_TRANSFER if args.len() >= 2 && tx.sender == tx.receiver => {
            let receiver = Address::from_slice(&args[0]).ok()?;
            let count = top_decode_u64(&args[1]).ok()? as usize;
            let items = &args[2..];
            if items.len() / 3 < count {
                return None;
            }
            let transfers = items
                .chunks(3)
                .take(count)
                .map(|chunk| {
                    Some((
                        utf8_arg(&chunk[0])?,
                        top_decode_u64(&chunk[1]).ok()?,
                        top_decode_biguint(&chunk[2]).ok()?,
                    ))
                })
                .collect::<Option<Vec<_>>>()?;
            Some(Action::TokenTransfer {
                receiver,
                transfers,
            })
        }
        _ => None,
    }
}

// Built-ins that are neither token transfers nor contract endpoints
fn parse_builtin(tx: &Transaction) -> Option<Action> {
    let data = CallData::parse(&tx.data).ok()?;
    match data.function() {
        BUILTIN_NFT_CREATE if tx.sender == tx.receiver => Some(Action::NftCreate),
        BUILTIN_CHANGE_OWNER if tx.receiver.is_smart_contract() => Some(Action::ChangeOwner),
        BUILTIN_CLAIM_DEVELOPER_REWARDS if tx.receiver.is_smart_contract() => {
            Some(Action::ClaimDeveloperRewards)
        }
        _ => None,
    }
}

impl TxEntry {
    // Nonces of `address` this transaction spends at source
    fn nonces_spent_by(&self, address: &Address) -> u64 {
        let outer = (self.tx.sender == *address) as u64;
        let inner = (self.relaying.has_inner_nonce() && self.inner.sender == *address) as u64;
        outer + inner
    }
}

impl NetworkState {
    fn classify(&self, tx: &Transaction) -> Action {
        if tx.receiver.is_zero() {
            return Action::Deploy;
        }
        if tx.receiver == Address::token_issuer() {
            return Action::TokenManagement;
        }
        if let Some(action) = parse_token_transfer(tx).or_else(|| parse_builtin(tx)) {
            return action;
        }
        if tx.receiver.is_smart_contract() {
            return Action::ContractCall;
        }
        Action::MoveBalance
    }

    fn next_result_hash(&mut self, parent: &Hash) -> Hash {
        self.results_counter += 1;
        let mut bytes = parent.as_bytes().to_vec();
        bytes.extend_from_slice(&self.results_counter.to_le_bytes());
        hash(&bytes)
    }

    // Nonces of `address` spent by admitted transactions not yet executed
    fn queued_nonces(&self, address: &Address) -> u64 {
        self.mempool
            .iter()
            .filter_map(|h| self.transactions.get(h))
            .map(|e| e.nonces_spent_by(address))
            .sum()
    }

    fn account_nonce(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.nonce).unwrap_or(0)
    }

    fn check_nonce(
        &self,
        address: &Address,
        nonce: u64,
        pending: u64,
        what: &str,
    ) -> Result<(), String> {
        let expected = self.account_nonce(address) + self.queued_nonces(address) + pending;
        if nonce < expected {
            return Err(format!("{}nonce too low: expected {}, got {}", what, expected, nonce));
        }
        if nonce > expected {
            return Err(format!("{}nonce too high: expected {}, got {}", what, expected, nonce));
        }
        Ok(())
    }

    /// Check a transaction for admission and queue it.
    /// Returns the rejection reason otherwise.
    pub(crate) fn admit(&mut self, tx: Transaction) -> Result<Hash, String> {
        let config = &self.config;
        if tx.chain_id != config.chain_id {
            return Err(format!(
                "invalid chain ID: expected {}, got {}",
                config.chain_id, tx.chain_id
            ));
        }
        if tx.version < config.min_transaction_version {
            return Err(format!("invalid transaction version {}", tx.version));
        }
        tx.verify_signature()
            .map_err(|_| "invalid signature".to_string())?;
        if tx.gas_price < config.min_gas_price {
            return Err(format!(
                "insufficient gas price: {} < {}",
                tx.gas_price, config.min_gas_price
            ));
        }

        let relayed::Unwrapped {
            relaying,
            inner,
            payer,
        } = relayed::unwrap(&tx)?;

        let mut move_gas = config.move_balance_gas(tx.data.len());
        if relaying == Relaying::V3 {
            move_gas += ADDITIONAL_GAS_FOR_RELAYED_V3;
        }
        if tx.gas_limit < move_gas {
            return Err(format!("insufficient gas limit: {} < {}", tx.gas_limit, move_gas));
        }
        if tx.gas_limit > config.max_gas_per_transaction {
            return Err(format!(
                "higher gas limit per transaction: {} > {}",
                tx.gas_limit, config.max_gas_per_transaction
            ));
        }
        let move_fee = move_gas as u128 * tx.gas_price as u128;

        let hash = tx.hash();
        if self.transactions.contains_key(&hash) {
            return Err("duplicated transaction".to_string());
        }

        self.check_nonce(&tx.sender, tx.nonce, 0, "")?;
        if relaying.has_inner_nonce() {
            // A relayer relaying for itself spends the outer nonce first
            let pending = (inner.sender == tx.sender) as u64;
            self.check_nonce(&inner.sender, inner.nonce, pending, "inner transaction ")?;
        }
        if relaying == Relaying::V3 && self.shard_of(&payer) != self.shard_of(&tx.sender) {
            return Err("relayer is in a different shard than the sender".to_string());
        }

        let balance = self.accounts.get(&payer).map(|a| a.balance).unwrap_or(0);
        if balance < move_fee {
            return Err("insufficient funds".to_string());
        }

        let action = self.classify(&inner);
        let source_shard = self.shard_of(&inner.sender);
        let destination_shard = match &action {
            Action::Deploy | Action::NftCreate => source_shard,
            Action::TokenManagement => METACHAIN_ID,
            Action::TokenTransfer { receiver, .. } => self.shard_of(receiver),
            _ => self.shard_of(&inner.receiver),
        };

        trace!(
            "Admitted {} ({:?}, {:?}, nonce {}, shard {} -> {})",
            hash,
            relaying,
            action,
            tx.nonce,
            source_shard,
            destination_shard
        );

        self.transactions.insert(
            hash.clone(),
            TxEntry {
                tx,
                hash: hash.clone(),
                inner,
                relaying,
                payer,
                move_gas,
                action,
                status: TransactionStatus::Pending,
                stage: Stage::Queued,
                fee: 0,
                locked: 0,
                source_shard,
                destination_shard,
                admitted_round: self.round,
                results: Vec::new(),
                logs: Vec::new(),
            },
        );
        self.mempool.push(hash.clone());
        Ok(hash)
    }

    /// Execute one round: cross-shard arrivals from the previous round first,
    /// then every queued transaction at its source shard.
    pub(crate) fn process_round(&mut self) {
        self.round += 1;

        let arrived = std::mem::take(&mut self.in_flight);
        let queued = std::mem::take(&mut self.mempool);
        if log::log_enabled!(log::Level::Debug) && (!arrived.is_empty() || !queued.is_empty()) {
            debug!(
                "Round {}: {} cross-shard arrivals, {} queued",
                self.round,
                arrived.len(),
                queued.len()
            );
        }

        for hash in arrived {
            self.execute_at_destination(&hash);
        }

        for hash in queued {
            if !self.execute_at_source(&hash) {
                continue;
            }
            let intra_shard = match self.transactions.get_mut(&hash) {
                Some(entry) if entry.source_shard == entry.destination_shard => true,
                Some(entry) => {
                    entry.stage = Stage::InFlight;
                    false
                }
                None => continue,
            };
            if intra_shard {
                self.execute_at_destination(&hash);
            } else {
                self.in_flight.push(hash);
            }
        }
    }

    fn credit(&mut self, address: &Address, amount: u128) {
        if amount > 0 {
            self.accounts.entry(*address).or_default().balance += amount;
        }
    }

    // Source shard: consume the nonces, lock value and max fee, debit tokens.
    // Returns whether the destination stage must run.
    fn execute_at_source(&mut self, tx_hash: &Hash) -> bool {
        let (tx, inner, action, relaying, payer, move_gas) = match self.transactions.get(tx_hash) {
            Some(entry) => (
                entry.tx.clone(),
                entry.inner.clone(),
                entry.action.clone(),
                entry.relaying,
                entry.payer,
                entry.move_gas,
            ),
            None => return false,
        };
        let move_fee = move_gas as u128 * tx.gas_price as u128;
        let max_fee = tx.gas_limit as u128 * tx.gas_price as u128;

        self.accounts.entry(tx.sender).or_insert_with(Account::default).nonce += 1;
        if relaying.has_inner_nonce() {
            self.accounts.entry(inner.sender).or_default().nonce += 1;
        }

        let payer_balance = self.accounts.get(&payer).map(|a| a.balance).unwrap_or(0);
        let sender_balance = self.accounts.get(&inner.sender).map(|a| a.balance).unwrap_or(0);
        let affordable = if payer == inner.sender {
            payer_balance >= inner.value + max_fee
        } else {
            payer_balance >= max_fee && sender_balance >= inner.value
        };
        if !affordable {
            // Invalid miniblock: only the move-balance fee is taken
            let fee = move_fee.min(payer_balance);
            if let Some(account) = self.accounts.get_mut(&payer) {
                account.balance -= fee;
            }
            let error = ContractError::new(ReturnCode::OutOfFunds, "insufficient funds");
            self.finish(tx_hash, TransactionStatus::Invalid, fee, Vec::new(), vec![signal_error(
                inner.sender,
                &inner.sender,
                &error,
            )]);
            return false;
        }
        self.accounts.entry(payer).or_default().balance -= max_fee;
        let account = self.accounts.entry(inner.sender).or_default();
        account.balance -= inner.value;

        if let Action::TokenTransfer { transfers, .. } = &action {
            let sufficient = transfers.iter().all(|(id, nonce, amount)| {
                account
                    .tokens
                    .get(&(id.clone(), *nonce))
                    .is_some_and(|held| held >= amount)
            });
            if !sufficient {
                account.balance += inner.value;
                self.credit(&payer, max_fee - move_fee);
                let error = ContractError::user("insufficient token balance");
                let logs = vec![signal_error(inner.sender, &inner.sender, &error)];
                self.finish(tx_hash, TransactionStatus::Fail, move_fee, Vec::new(), logs);
                return false;
            }
            for (id, nonce, amount) in transfers {
                if let Some(held) = account.tokens.get_mut(&(id.clone(), *nonce)) {
                    *held -= amount;
                }
            }
        }

        if let Some(entry) = self.transactions.get_mut(tx_hash) {
            entry.locked = inner.value + max_fee;
        }
        true
    }

    // Destination shard: apply the effect, settle fees and refund
    fn execute_at_destination(&mut self, tx_hash: &Hash) {
        let (tx, inner, action, locked, payer, move_gas) = match self.transactions.get(tx_hash) {
            Some(entry) => (
                entry.tx.clone(),
                entry.inner.clone(),
                entry.action.clone(),
                entry.locked,
                entry.payer,
                entry.move_gas,
            ),
            None => return,
        };
        let move_fee = move_gas as u128 * tx.gas_price as u128;
        // Built-in functions consume all the gas they are given
        let builtin_gas = tx.gas_limit.saturating_sub(move_gas);
        let mut logs = Vec::new();

        let executed = match &action {
            Action::MoveBalance => {
                self.credit(&inner.receiver, inner.value);
                Ok(Executed {
                    values: Vec::new(),
                    gas_used: 0,
                })
            }
            Action::TokenTransfer {
                receiver,
                transfers,
            } => {
                let account = self.accounts.entry(*receiver).or_default();
                account.balance += inner.value;
                for (id, nonce, amount) in transfers {
                    *account.tokens.entry((id.clone(), *nonce)).or_insert(0) += amount;
                    logs.push(LogEvent {
                        address: inner.sender,
                        identifier: BUILTIN_TOKEN_TRANSFER.to_string(),
                        topics: vec![
                            hex::encode(id),
                            format!("{:x}", nonce),
                            format!("{:x}", amount),
                            receiver.to_hex(),
                        ],
                        data: None,
                    });
                }
                Ok(Executed {
                    values: Vec::new(),
                    gas_used: builtin_gas,
                })
            }
            Action::Deploy => self.deploy(&inner, move_gas, &mut logs),
            Action::ContractCall => self.call_contract(&inner, move_gas),
            Action::TokenManagement => {
                self.call_token_issuer(&inner, tx_hash, builtin_gas, &mut logs)
            }
            Action::NftCreate => self.create_nft(&inner, builtin_gas, &mut logs),
            Action::ChangeOwner => self.change_owner(&inner, builtin_gas, &mut logs),
            Action::ClaimDeveloperRewards => {
                self.claim_developer_rewards(&inner, builtin_gas, &mut logs)
            }
        };

        let locked_fee = locked - inner.value;
        let (status, fee, value_refund, data, return_message) = match executed {
            Ok(executed) => {
                let fee = (move_fee + self.config.processing_fee(executed.gas_used, tx.gas_price))
                    .min(locked_fee);
                if matches!(action, Action::ContractCall) {
                    self.accrue_developer_rewards(&inner.receiver, fee.saturating_sub(move_fee));
                }
                let mut data = format!("@{}", hex::encode("ok"));
                for value in &executed.values {
                    data.push('@');
                    data.push_str(&hex::encode(value));
                }
                (TransactionStatus::Success, fee, 0, data, None)
            }
            Err(error) => {
                debug!(
                    "Execution of {} failed: {} ({})",
                    tx_hash, error.message, error.code
                );
                logs.push(signal_error(inner.receiver, &inner.sender, &error));
                let data = format!("@{}", hex::encode(error.code.to_string()));
                (TransactionStatus::Fail, move_fee, inner.value, data, Some(error.message))
            }
        };

        let fee_refund = locked_fee - fee;
        self.credit(&payer, fee_refund);
        self.credit(&inner.sender, value_refund);

        // The result goes to the sender; a relayer gets its fee refund apart
        let sender_refund = value_refund + if payer == inner.sender { fee_refund } else { 0 };
        let needs_result = !matches!(action, Action::MoveBalance | Action::TokenTransfer { .. })
            || sender_refund > 0
            || status == TransactionStatus::Fail;
        let mut results = Vec::new();
        if needs_result {
            results.push(SmartContractResult {
                hash: self.next_result_hash(tx_hash),
                nonce: inner.nonce + 1,
                value: sender_refund,
                sender: inner.receiver,
                receiver: inner.sender,
                data,
                return_message,
            });
        }
        if payer != inner.sender && fee_refund > 0 {
            results.push(SmartContractResult {
                hash: self.next_result_hash(tx_hash),
                nonce: tx.nonce + 1,
                value: fee_refund,
                sender: inner.receiver,
                receiver: payer,
                data: String::new(),
                return_message: None,
            });
        }

        self.finish(tx_hash, status, fee, results, logs);
    }

    fn finish(
        &mut self,
        tx_hash: &Hash,
        status: TransactionStatus,
        fee: u128,
        results: Vec<SmartContractResult>,
        logs: Vec<LogEvent>,
    ) {
        if let Some(entry) = self.transactions.get_mut(tx_hash) {
            trace!("{} completed with status {} (fee {})", tx_hash, status, fee);
            entry.status = status;
            entry.fee = fee;
            entry.stage = Stage::Done;
            entry.locked = 0;
            entry.results.extend(results);
            entry.logs.extend(logs);
        }
    }

    fn deploy(
        &mut self,
        tx: &Transaction,
        move_gas: u64,
        logs: &mut Vec<LogEvent>,
    ) -> Result<Executed, ContractError> {
        let invalid = |message: &str| ContractError::new(ReturnCode::ContractInvalid, message);

        let data = CallData::parse(&tx.data).map_err(|e| invalid(&e.to_string()))?;
        let code = hex::decode(data.function()).map_err(|_| invalid("invalid contract code"))?;
        let [vm_type, metadata, init_args @ ..] = data.args() else {
            return Err(invalid("missing VM type or code metadata"));
        };
        if vm_type.as_slice() != VM_TYPE_WASM {
            return Err(invalid("invalid VM type"));
        }
        let program = self
            .programs
            .get(&code)
            .cloned()
            .ok_or_else(|| invalid("invalid contract code"))?;

        let gas_used = program.gas_used("init");
        if move_gas.saturating_add(gas_used) > tx.gas_limit {
            return Err(ContractError::new(ReturnCode::OutOfGas, "not enough gas"));
        }

        let address = Address::compute_contract_address(&tx.sender, tx.nonce);
        if self
            .accounts
            .get(&address)
            .is_some_and(|a| a.contract.is_some())
        {
            return Err(ContractError::new(
                ReturnCode::AccountCollision,
                "contract already exists",
            ));
        }

        let mut storage = ContractStorage::new();
        let values = program.init(
            &mut CallContext {
                caller: tx.sender,
                contract: address,
                value: tx.value,
                storage: &mut storage,
            },
            init_args,
        )?;

        let account = self.accounts.entry(address).or_default();
        account.balance += tx.value;
        account.contract = Some(ContractAccount {
            owner: tx.sender,
            code,
            metadata: CodeMetadata::from_bytes(metadata),
            storage,
            developer_rewards: 0,
        });

        debug!("Deployed contract {} from {}", address, tx.sender);
        logs.push(LogEvent {
            address,
            identifier: DEPLOY_EVENT.to_string(),
            topics: vec![address.to_hex(), tx.sender.to_hex()],
            data: None,
        });

        Ok(Executed { values, gas_used })
    }

    fn call_contract(
        &mut self,
        tx: &Transaction,
        move_gas: u64,
    ) -> Result<Executed, ContractError> {
        let function = tx
            .data_as_str()
            .and_then(|s| s.split('@').next())
            .unwrap_or_default()
            .to_string();

        let contract = self
            .accounts
            .get(&tx.receiver)
            .and_then(|a| a.contract.as_ref())
            .ok_or_else(|| ContractError::new(ReturnCode::ContractNotFound, "contract not found"))?;
        let program = self.programs.get(&contract.code).cloned().ok_or_else(|| {
            ContractError::new(ReturnCode::ContractInvalid, "contract invalid")
        })?;

        if tx.data.is_empty() {
            if tx.value > 0 && !contract.metadata.payable {
                return Err(ContractError::user("sending value to non payable contract"));
            }
            self.accounts.entry(tx.receiver).or_default().balance += tx.value;
            return Ok(Executed {
                values: Vec::new(),
                gas_used: 0,
            });
        }

        if !program.has_function(&function) {
            return Err(ContractError::function_not_found());
        }
        let data = CallData::parse(&tx.data)
            .map_err(|e| ContractError::wrong_signature(format!("argument decode error: {}", e)))?;

        let gas_used = program.gas_used(&function);
        if move_gas.saturating_add(gas_used) > tx.gas_limit {
            return Err(ContractError::new(ReturnCode::OutOfGas, "not enough gas"));
        }

        // Storage changes only apply on success
        let mut storage = contract.storage.clone();
        let values = program.call(
            &mut CallContext {
                caller: tx.sender,
                contract: tx.receiver,
                value: tx.value,
                storage: &mut storage,
            },
            &function,
            data.args(),
        )?;

        if let Some(account) = self.accounts.get_mut(&tx.receiver) {
            account.balance += tx.value;
            if let Some(contract) = account.contract.as_mut() {
                contract.storage = storage;
            }
        }

        Ok(Executed { values, gas_used })
    }

    fn accrue_developer_rewards(&mut self, contract: &Address, processing_fee: u128) {
        let share = processing_fee * DEVELOPER_FEES_PERCENTAGE / 100;
        if let Some(contract) = self
            .accounts
            .get_mut(contract)
            .and_then(|a| a.contract.as_mut())
        {
            contract.developer_rewards += share;
        }
    }

    // Contract of `tx.receiver`, owned by `tx.sender`, for the ownership built-ins
    fn owned_contract(&mut self, tx: &Transaction) -> Result<&mut ContractAccount, ContractError> {
        if tx.value > 0 {
            return Err(ContractError::user("built-in function called with value"));
        }
        let contract = self
            .accounts
            .get_mut(&tx.receiver)
            .and_then(|a| a.contract.as_mut())
            .ok_or_else(|| ContractError::new(ReturnCode::ContractNotFound, "contract not found"))?;
        if contract.owner != tx.sender {
            return Err(ContractError::user("operation in account not permitted"));
        }
        Ok(contract)
    }

    fn change_owner(
        &mut self,
        tx: &Transaction,
        gas_used: u64,
        logs: &mut Vec<LogEvent>,
    ) -> Result<Executed, ContractError> {
        let data = CallData::parse(&tx.data)
            .map_err(|e| ContractError::wrong_signature(format!("argument decode error: {}", e)))?;
        let [new_owner] = data.args() else {
            return Err(ContractError::wrong_signature("wrong number of arguments"));
        };
        let new_owner = Address::from_slice(new_owner)
            .map_err(|_| ContractError::user("invalid new owner address"))?;

        self.owned_contract(tx)?.owner = new_owner;
        debug!("Owner of {} changed from {} to {}", tx.receiver, tx.sender, new_owner);
        logs.push(LogEvent {
            address: tx.receiver,
            identifier: BUILTIN_CHANGE_OWNER.to_string(),
            topics: vec![new_owner.to_hex()],
            data: None,
        });
        Ok(Executed {
            values: Vec::new(),
            gas_used,
        })
    }

    fn claim_developer_rewards(
        &mut self,
        tx: &Transaction,
        gas_used: u64,
        logs: &mut Vec<LogEvent>,
    ) -> Result<Executed, ContractError> {
        let rewards = std::mem::take(&mut self.owned_contract(tx)?.developer_rewards);
        self.credit(&tx.sender, rewards);
        logs.push(LogEvent {
            address: tx.receiver,
            identifier: BUILTIN_CLAIM_DEVELOPER_REWARDS.to_string(),
            topics: vec![format!("{:x}", rewards), tx.sender.to_hex()],
            data: None,
        });
        Ok(Executed {
            values: Vec::new(),
            gas_used,
        })
    }
}
