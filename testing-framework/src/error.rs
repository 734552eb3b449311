// File: testing-framework/src/error.rs
//
// Error taxonomy of the harness.
//
// Artifact and nonce errors abort the current step. Network outcomes
// (contract failures, rejections) are values of `TransactionOutcome`
// so that tests can assert on expected failures.

use std::path::PathBuf;
use std::time::Duration;

use shardnet_common::crypto::{Address, CryptoError, Hash};
use shardnet_common::transaction::{ArgsError, PaymentError};
use thiserror::Error;

use crate::network::ProviderError;

/// Kind of named entry looked up in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Address,
    Token,
    User,
    Group,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::Address => "address",
            EntryKind::Token => "token",
            EntryKind::User => "user",
            EntryKind::Group => "group",
        };
        write!(f, "{}", s)
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Cannot load session from {path}: {reason}")]
    SessionLoad { path: PathBuf, reason: String },

    #[error("Session has been destroyed")]
    SessionClosed,

    #[error("No {kind} named '{name}' in session")]
    NotFound { kind: EntryKind, name: String },

    #[error("Nonce of {0} has not been synchronized, call sync_users first")]
    NotSynced(Address),

    #[error("Network unavailable after {attempts} attempts: {last_error}")]
    NetworkTransient { attempts: u32, last_error: String },

    #[error("Transaction {hash} rejected: {reason}")]
    TransactionRejected { hash: Hash, reason: String },

    #[error("Timeout waiting for {what} after {after:?}")]
    TimedOut { what: String, after: Duration },

    #[error("Step '{step}' not retried: {hash} of the failed attempt is known to the network")]
    RetryUnsafe { step: String, hash: Hash },

    #[error("Suite aborted after step '{failed_step}' failed")]
    SuiteAborted { failed_step: String },

    #[error("Cannot relay transaction: {0}")]
    InvalidRelay(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl HarnessError {
    pub fn not_found(kind: EntryKind, name: impl Into<String>) -> Self {
        HarnessError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Whether re-running the failed step may help.
    /// Artifact, nonce and session errors abort at once.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            HarnessError::SessionLoad { .. }
                | HarnessError::SessionClosed
                | HarnessError::NotFound { .. }
                | HarnessError::NotSynced(_)
                | HarnessError::InvalidRelay(_)
                | HarnessError::RetryUnsafe { .. }
                | HarnessError::SuiteAborted { .. }
        )
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
