// File: testing-framework/src/outcome.rs
//
// Terminal classification of a transaction.
//
// Contract failures are values, not errors: the suites assert on expected
// failures (bad calls, payments to non-payable contracts) as often as on
// successes.

use serde::Serialize;
use shardnet_common::{
    api::{ReturnCode, TransactionOnNetwork, TransactionStatus},
    transaction::args::{split_result_data, top_decode_biguint},
};
use std::fmt;

const SIGNAL_ERROR: &str = "signalError";
// hex("ok")
const OK_PREFIX: &str = "@6f6b";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Refused at broadcast (nonce, signature, funds)
    Rejected,
    /// Executed in an invalid miniblock
    Invalid,
    /// Contract execution returned an error code
    Contract(ReturnCode),
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::Rejected => write!(f, "rejected"),
            FailureCode::Invalid => write!(f, "invalid"),
            FailureCode::Contract(code) => write!(f, "{}", code),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Success {
        #[serde(serialize_with = "hex_values")]
        return_data: Vec<Vec<u8>>,
    },
    Failure {
        code: FailureCode,
        message: String,
    },
}

fn hex_values<S: serde::Serializer>(values: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(hex::encode))
}

impl TransactionOutcome {
    pub fn rejected(reason: impl Into<String>) -> Self {
        TransactionOutcome::Failure {
            code: FailureCode::Rejected,
            message: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success { .. })
    }

    pub fn return_data(&self) -> &[Vec<u8>] {
        match self {
            TransactionOutcome::Success { return_data } => return_data,
            TransactionOutcome::Failure { .. } => &[],
        }
    }

    pub fn failure_code(&self) -> Option<FailureCode> {
        match self {
            TransactionOutcome::Success { .. } => None,
            TransactionOutcome::Failure { code, .. } => Some(*code),
        }
    }

    /// First returned value decoded as an unsigned integer
    pub fn first_as_biguint(&self) -> Option<u128> {
        self.return_data()
            .first()
            .and_then(|bytes| top_decode_biguint(bytes).ok())
    }

    /// First returned value as text, e.g. an issued token identifier
    pub fn first_as_string(&self) -> Option<String> {
        self.return_data()
            .first()
            .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Success { return_data } => {
                write!(f, "success ({} values)", return_data.len())
            }
            TransactionOutcome::Failure { code, message } => {
                write!(f, "failure [{}]: {}", code, message)
            }
        }
    }
}

/// Decodes a completed transaction into an outcome
pub struct ResultsParser;

impl ResultsParser {
    pub fn parse(tx: &TransactionOnNetwork) -> TransactionOutcome {
        let signal = tx.find_event(SIGNAL_ERROR);
        let signal_message = signal
            .and_then(|event| event.topic_bytes(1))
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        match tx.status {
            TransactionStatus::Pending => TransactionOutcome::Failure {
                code: FailureCode::Contract(ReturnCode::Unknown),
                message: "transaction not completed".to_string(),
            },
            TransactionStatus::Invalid => TransactionOutcome::Failure {
                code: FailureCode::Invalid,
                message: signal_message.unwrap_or_else(|| "invalid transaction".to_string()),
            },
            TransactionStatus::Fail => {
                let code = signal
                    .and_then(|event| event.data.as_deref())
                    .and_then(Self::decode_code)
                    .or_else(|| {
                        tx.contract_results
                            .iter()
                            .find_map(|scr| Self::decode_code(&scr.data))
                    })
                    .unwrap_or(ReturnCode::ExecutionFailed);
                let message = signal_message
                    .or_else(|| {
                        tx.contract_results
                            .iter()
                            .find_map(|scr| scr.return_message.clone())
                    })
                    .unwrap_or_else(|| code.to_string());
                TransactionOutcome::Failure {
                    code: FailureCode::Contract(code),
                    message,
                }
            }
            TransactionStatus::Success => {
                let return_data = tx
                    .contract_results
                    .iter()
                    .find(|scr| scr.data.starts_with(OK_PREFIX))
                    .and_then(|scr| split_result_data(&scr.data).ok())
                    .map(|mut values| {
                        values.remove(0);
                        values
                    })
                    .unwrap_or_default();
                TransactionOutcome::Success { return_data }
            }
        }
    }

    // "@<hex code text>" as found in signalError data and failed results
    fn decode_code(data: &str) -> Option<ReturnCode> {
        let first = split_result_data(data).ok()?.into_iter().next()?;
        let text = String::from_utf8(first).ok()?;
        match ReturnCode::from_text(&text) {
            ReturnCode::Unknown => None,
            code => Some(code),
        }
    }
}
