use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    crypto::{Address, Hash},
    utils::amount_string,
};

/// Status of a transaction as reported by the network
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    // Admitted, not executed yet (or executed in the source shard only)
    Pending,
    Success,
    // Executed, but the contract call failed: value refunded, fee charged
    Fail,
    // Executed in an invalid miniblock: fee charged, nothing else applied
    Invalid,
}

impl TransactionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    pub fn is_completed(&self) -> bool {
        !self.is_pending()
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, TransactionStatus::Success)
    }
}

/// Return code of a contract execution
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum ReturnCode {
    #[serde(rename = "ok")]
    #[strum(serialize = "ok")]
    Ok,
    #[serde(rename = "function not found")]
    #[strum(serialize = "function not found")]
    FunctionNotFound,
    #[serde(rename = "wrong signature for function")]
    #[strum(serialize = "wrong signature for function")]
    FunctionWrongSignature,
    #[serde(rename = "contract not found")]
    #[strum(serialize = "contract not found")]
    ContractNotFound,
    #[serde(rename = "user error")]
    #[strum(serialize = "user error")]
    UserError,
    #[serde(rename = "out of gas")]
    #[strum(serialize = "out of gas")]
    OutOfGas,
    #[serde(rename = "account collision")]
    #[strum(serialize = "account collision")]
    AccountCollision,
    #[serde(rename = "out of funds")]
    #[strum(serialize = "out of funds")]
    OutOfFunds,
    #[serde(rename = "contract invalid")]
    #[strum(serialize = "contract invalid")]
    ContractInvalid,
    #[serde(rename = "execution failed")]
    #[strum(serialize = "execution failed")]
    ExecutionFailed,
    #[serde(rename = "unknown")]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl ReturnCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ReturnCode::Ok)
    }

    /// Parse a textual return code, falling back to `Unknown`
    pub fn from_text(text: &str) -> Self {
        text.parse().unwrap_or(ReturnCode::Unknown)
    }
}

/// Result produced by a contract execution or a cross-shard step
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SmartContractResult {
    pub hash: Hash,
    pub nonce: u64,
    #[serde(with = "amount_string")]
    pub value: u128,
    pub sender: Address,
    pub receiver: Address,
    // `@<hex return code>@<hex value>...`
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_message: Option<String>,
}

/// Event emitted during execution (`signalError`, `ESDTTransfer`, ...)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub address: Address,
    pub identifier: String,
    // hex encoded
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl LogEvent {
    pub fn topic_bytes(&self, index: usize) -> Option<Vec<u8>> {
        self.topics.get(index).and_then(|t| hex::decode(t).ok())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOnNetwork {
    pub hash: Hash,
    pub nonce: u64,
    pub sender: Address,
    pub receiver: Address,
    #[serde(with = "amount_string")]
    pub value: u128,
    #[serde(default, with = "hex::serde")]
    pub data: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub status: TransactionStatus,
    // Fee charged so far (final once the status is completed)
    #[serde(with = "amount_string")]
    pub fee: u128,
    pub source_shard: u32,
    pub destination_shard: u32,
    #[serde(default)]
    pub contract_results: Vec<SmartContractResult>,
    #[serde(default)]
    pub logs: Vec<LogEvent>,
}

impl TransactionOnNetwork {
    pub fn is_cross_shard(&self) -> bool {
        self.source_shard != self.destination_shard
    }

    pub fn find_event(&self, identifier: &str) -> Option<&LogEvent> {
        self.logs.iter().find(|e| e.identifier == identifier)
    }
}

/// Response of a bulk submission. Indexes refer to positions in the submitted list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchReceipt {
    pub num_of_sent_txs: usize,
    #[serde(default)]
    pub txs_hashes: BTreeMap<usize, Hash>,
    #[serde(default)]
    pub rejected: BTreeMap<usize, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_return_code_text() {
        for code in ReturnCode::iter() {
            assert_eq!(ReturnCode::from_text(code.as_ref()), code);
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code));
        }
        assert_eq!(ReturnCode::from_text("something else"), ReturnCode::Unknown);
        assert!(ReturnCode::Ok.is_success());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&TransactionStatus::Fail).unwrap(), "\"fail\"");
        assert_eq!("invalid".parse::<TransactionStatus>().unwrap(), TransactionStatus::Invalid);
        assert!(TransactionStatus::Pending.is_pending());
        assert!(TransactionStatus::Invalid.is_completed());
    }

    #[test]
    fn test_batch_receipt_json() {
        let mut receipt = BatchReceipt {
            num_of_sent_txs: 1,
            ..Default::default()
        };
        receipt.txs_hashes.insert(0, Hash::zero());
        receipt.rejected.insert(1, "nonce too high".to_string());

        let json = serde_json::to_string(&receipt).unwrap();
        let back: BatchReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, receipt);
    }
}
