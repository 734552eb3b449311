// File: testing-framework/src/airdrop.rs
//
// Fan-out of payments from one funder: one transaction per
// (recipient, payment) pair, with sequential nonces from the tracker,
// delivered with one bulk call or one by one.

use log::{info, warn};
use serde::Serialize;
use shardnet_common::{
    crypto::{Address, Hash},
    transaction::TokenPayment,
};

use crate::config::DispatchOptions;
use crate::error::{HarnessError, Result};
use crate::orchestrator::TestSession;
use crate::outcome::TransactionOutcome;
use crate::users::TestUser;

#[derive(Debug, Clone)]
pub enum DeliveryMode {
    Batch(DispatchOptions),
    Individually,
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Batch(DispatchOptions::default())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AirdropEntry {
    pub recipient: Address,
    pub payment: TokenPayment,
    pub hash: Hash,
    // Set when the network refused the transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

impl AirdropEntry {
    pub fn is_accepted(&self) -> bool {
        self.rejection.is_none()
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AirdropReport {
    pub entries: Vec<AirdropEntry>,
    pub accepted: usize,
}

impl AirdropReport {
    pub fn accepted_hashes(&self) -> Vec<Hash> {
        self.entries
            .iter()
            .filter(|e| e.is_accepted())
            .map(|e| e.hash.clone())
            .collect()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &AirdropEntry> {
        self.entries.iter().filter(|e| !e.is_accepted())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AirdropService {
    mode: DeliveryMode,
}

impl AirdropService {
    pub fn new(mode: DeliveryMode) -> Self {
        Self { mode }
    }

    /// Send every payment to every recipient
    ///
    /// The funder must be synced. Rejected entries are reported, never resent.
    pub async fn send_to_each_user(
        &self,
        session: &mut TestSession,
        funder: &TestUser,
        recipients: &[Address],
        payments: &[TokenPayment],
    ) -> Result<AirdropReport> {
        let mut pairs = Vec::with_capacity(recipients.len() * payments.len());
        let mut txs = Vec::with_capacity(pairs.capacity());
        for recipient in recipients {
            for payment in payments {
                txs.push(session.build_token_transfer(funder, recipient, payment).await?);
                pairs.push((*recipient, payment.clone()));
            }
        }

        let mut rejections = vec![None; txs.len()];
        match &self.mode {
            DeliveryMode::Batch(options) => {
                let receipt = session.submit_batch(&txs, options).await?;
                for (index, reason) in receipt.rejected {
                    if let Some(slot) = rejections.get_mut(index) {
                        *slot = Some(reason);
                    }
                }
            }
            DeliveryMode::Individually => {
                for (slot, pending) in rejections.iter_mut().zip(&txs) {
                    match session.send(pending).await {
                        Ok(_) => {}
                        Err(HarnessError::TransactionRejected { reason, .. }) => {
                            *slot = Some(reason)
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        let entries: Vec<AirdropEntry> = pairs
            .into_iter()
            .zip(txs)
            .zip(rejections)
            .map(|(((recipient, payment), pending), rejection)| AirdropEntry {
                recipient,
                payment,
                hash: pending.hash,
                rejection,
            })
            .collect();
        let accepted = entries.iter().filter(|e| e.is_accepted()).count();

        if accepted < entries.len() {
            warn!(
                "Airdrop from {}: {} of {} transactions rejected",
                funder.name(),
                entries.len() - accepted,
                entries.len()
            );
        }
        info!(
            "Airdrop from {} to {} recipients: {} transactions accepted",
            funder.name(),
            recipients.len(),
            accepted
        );

        Ok(AirdropReport { entries, accepted })
    }

    /// Wait for every accepted entry
    pub async fn await_delivery(
        &self,
        session: &mut TestSession,
        report: &AirdropReport,
    ) -> Result<Vec<TransactionOutcome>> {
        let mut outcomes = Vec::with_capacity(report.accepted);
        for hash in report.accepted_hashes() {
            outcomes.push(session.await_outcome(&hash).await?);
        }
        Ok(outcomes)
    }
}
