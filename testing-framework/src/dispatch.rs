// File: testing-framework/src/dispatch.rs
//
// Bulk submission of signed transactions.
//
// The dispatcher sends pre-built transactions with one provider call per
// chunk. It never reorders, retries or drops entries: per-sender nonce
// gaps and duplicates are reported in the logs and the network rejects
// the affected entries. Confirmation is left to the watcher.

use log::{debug, info, log_enabled, warn, Level};
use shardnet_common::{api::BatchReceipt, crypto::Address};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::DispatchOptions;
use crate::error::Result;
use crate::network::NetworkProvider;
use crate::orchestrator::clock::Clock;
use crate::transactions::PendingTransaction;

/// Per-sender nonce irregularity found before submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceIssue {
    Gap { sender: Address, after: u64, next: u64 },
    Duplicate { sender: Address, nonce: u64 },
}

/// Gaps and duplicates in the nonces of each sender, in submission order
pub fn nonce_issues(txs: &[PendingTransaction]) -> Vec<NonceIssue> {
    let mut per_sender: BTreeMap<Address, Vec<u64>> = BTreeMap::new();
    for pending in txs {
        per_sender.entry(pending.sender()).or_default().push(pending.nonce());
    }

    let mut issues = Vec::new();
    for (sender, mut nonces) in per_sender {
        nonces.sort_unstable();
        for pair in nonces.windows(2) {
            if pair[0] == pair[1] {
                issues.push(NonceIssue::Duplicate {
                    sender,
                    nonce: pair[0],
                });
            } else if pair[1] > pair[0] + 1 {
                issues.push(NonceIssue::Gap {
                    sender,
                    after: pair[0],
                    next: pair[1],
                });
            }
        }
    }
    issues
}

pub struct BatchDispatcher {
    provider: Arc<dyn NetworkProvider>,
    clock: Arc<dyn Clock>,
}

impl BatchDispatcher {
    pub fn new(provider: Arc<dyn NetworkProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    /// Submit all transactions with a single bulk call
    ///
    /// # Errors
    ///
    /// Fails only if the bulk call itself fails; per-entry rejections are
    /// part of the receipt.
    pub async fn submit_batch(&self, txs: &[PendingTransaction]) -> Result<BatchReceipt> {
        for issue in nonce_issues(txs) {
            warn!("Submitting batch with nonce issue: {:?}", issue);
        }

        let payload: Vec<_> = txs.iter().map(|pending| pending.tx.clone()).collect();
        let receipt = self.provider.send_transactions(&payload).await?;

        if log_enabled!(Level::Debug) {
            for (index, reason) in &receipt.rejected {
                if let Some(pending) = txs.get(*index) {
                    debug!(
                        "Batch entry #{} (nonce {} from {}) rejected: {}",
                        index,
                        pending.nonce(),
                        pending.sender(),
                        reason
                    );
                }
            }
        }
        info!(
            "Batch of {} transactions submitted, {} accepted",
            txs.len(),
            receipt.num_of_sent_txs
        );
        Ok(receipt)
    }

    /// Submit in chunks of `chunk_size`, pausing between chunks.
    /// Indexes of the merged receipt refer to `txs`.
    pub async fn submit_in_chunks(
        &self,
        txs: &[PendingTransaction],
        options: &DispatchOptions,
    ) -> Result<BatchReceipt> {
        let mut merged = BatchReceipt::default();
        let chunk_size = options.chunk_size.max(1);

        for (chunk_index, chunk) in txs.chunks(chunk_size).enumerate() {
            if chunk_index > 0 && !options.wait_between_chunks.is_zero() {
                self.clock.sleep(options.wait_between_chunks).await;
            }

            let offset = chunk_index * chunk_size;
            let receipt = self.submit_batch(chunk).await?;
            merged.num_of_sent_txs += receipt.num_of_sent_txs;
            merged
                .txs_hashes
                .extend(receipt.txs_hashes.into_iter().map(|(i, hash)| (offset + i, hash)));
            merged
                .rejected
                .extend(receipt.rejected.into_iter().map(|(i, reason)| (offset + i, reason)));
        }

        Ok(merged)
    }
}
