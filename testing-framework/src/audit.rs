// File: testing-framework/src/audit.rs
//
// Audit trail: append-only events tagged with the active step label.
//
// Events live in the session database (one sled tree, keyed by a
// big-endian sequence number) so that phases run in separate processes
// append to the same trail. The report is the ordered event list.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shardnet_common::{api::TransactionOnNetwork, crypto::Hash};
use sled::Tree;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{HarnessError, Result};
use crate::outcome::TransactionOutcome;
use crate::transactions::PendingTransaction;

pub const NO_STEP: &str = "<none>";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Sent,
    Completed,
    ContractOutcome,
    Snapshot,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub sequence: u64,
    pub step: String,
    pub kind: AuditKind,
    pub timestamp: String,
    pub payload: Value,
}

/// Structural comparison of two snapshots, for diagnostics only
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotComparison {
    pub against: String,
    pub equal: bool,
    // JSON pointers of the differing values
    pub differences: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub profile: String,
    pub events: Vec<AuditEvent>,
}

pub fn report_path(base_dir: &Path, profile: &str) -> PathBuf {
    base_dir.join(format!("{}.report.json", profile))
}

fn diff_values(path: &str, before: &Value, after: &Value, out: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child = format!("{}/{}", path, key);
                match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => diff_values(&child, x, y, out),
                    _ => out.push(child),
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for index in 0..a.len().max(b.len()) {
                let child = format!("{}/{}", path, index);
                match (a.get(index), b.get(index)) {
                    (Some(x), Some(y)) => diff_values(&child, x, y, out),
                    _ => out.push(child),
                }
            }
        }
        (x, y) if x != y => {
            out.push(if path.is_empty() { "/".to_string() } else { path.to_string() })
        }
        _ => {}
    }
}

pub struct AuditTrail {
    profile: String,
    report_path: PathBuf,
    // None once the session is destroyed
    tree: Option<Tree>,
    step: String,
    next_sequence: u64,
}

impl AuditTrail {
    pub fn new(tree: Tree, base_dir: &Path, profile: &str) -> Result<Self> {
        let next_sequence = match tree.last()? {
            Some((key, _)) => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&key[..8]);
                u64::from_be_bytes(bytes) + 1
            }
            None => 0,
        };
        debug!("Audit trail of '{}' resumes at event {}", profile, next_sequence);

        Ok(Self {
            profile: profile.to_string(),
            report_path: report_path(base_dir, profile),
            tree: Some(tree),
            step: NO_STEP.to_string(),
            next_sequence,
        })
    }

    fn tree(&self) -> Result<&Tree> {
        self.tree.as_ref().ok_or(HarnessError::SessionClosed)
    }

    /// Label attached to every following event
    pub fn set_step(&mut self, label: impl Into<String>) {
        self.step = label.into();
        debug!("Step '{}'", self.step);
    }

    pub fn current_step(&self) -> &str {
        &self.step
    }

    /// Sequence number the next event will get
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    fn append(&mut self, kind: AuditKind, payload: Value) -> Result<u64> {
        let event = AuditEvent {
            sequence: self.next_sequence,
            step: self.step.clone(),
            kind,
            timestamp: chrono::Utc::now().to_rfc3339(),
            payload,
        };
        self.tree()?
            .insert(event.sequence.to_be_bytes(), serde_json::to_vec(&event)?)?;
        trace!("Audit #{} {:?} in step '{}'", event.sequence, kind, event.step);
        self.next_sequence += 1;
        Ok(event.sequence)
    }

    pub fn on_transaction_sent(&mut self, pending: &PendingTransaction) -> Result<u64> {
        let tx = &pending.tx;
        self.append(
            AuditKind::Sent,
            json!({
                "hash": pending.hash,
                "sender": tx.sender,
                "receiver": tx.receiver,
                "nonce": tx.nonce,
                "value": tx.value.to_string(),
                "data": String::from_utf8_lossy(&tx.data),
                "gasLimit": tx.gas_limit,
            }),
        )
    }

    pub fn on_transaction_completed(&mut self, tx: &TransactionOnNetwork) -> Result<u64> {
        self.append(
            AuditKind::Completed,
            json!({
                "hash": tx.hash,
                "status": tx.status,
                "fee": tx.fee.to_string(),
                "sourceShard": tx.source_shard,
                "destinationShard": tx.destination_shard,
            }),
        )
    }

    pub fn on_contract_outcome(
        &mut self,
        hash: &Hash,
        outcome: &TransactionOutcome,
    ) -> Result<u64> {
        self.append(
            AuditKind::ContractOutcome,
            json!({ "hash": hash, "result": outcome }),
        )
    }

    /// Record a named state capture; with `comparable_to`, compare it to the
    /// latest snapshot of that name. A difference is recorded, never raised.
    pub fn on_snapshot(
        &mut self,
        name: &str,
        state: Value,
        comparable_to: Option<&str>,
    ) -> Result<Option<SnapshotComparison>> {
        let comparison = match comparable_to {
            Some(previous) => {
                let before = self.latest_snapshot(previous)?.ok_or_else(|| {
                    let message = format!("no snapshot named '{}' to compare with", previous);
                    HarnessError::Assertion(message)
                })?;
                let mut differences = Vec::new();
                diff_values("", &before, &state, &mut differences);
                Some(SnapshotComparison {
                    against: previous.to_string(),
                    equal: differences.is_empty(),
                    differences,
                })
            }
            None => None,
        };

        self.append(
            AuditKind::Snapshot,
            json!({ "name": name, "state": state, "comparison": comparison }),
        )?;
        Ok(comparison)
    }

    fn latest_snapshot(&self, name: &str) -> Result<Option<Value>> {
        for entry in self.tree()?.iter().rev() {
            let (_, bytes) = entry?;
            let event: AuditEvent = serde_json::from_slice(&bytes)?;
            if event.kind == AuditKind::Snapshot && event.payload["name"] == name {
                return Ok(Some(event.payload["state"].clone()));
            }
        }
        Ok(None)
    }

    /// All events, in order
    pub fn events(&self) -> Result<Vec<AuditEvent>> {
        self.tree()?
            .iter()
            .values()
            .map(|bytes| -> Result<AuditEvent> { Ok(serde_json::from_slice(&bytes?)?) })
            .collect()
    }

    /// Hashes recorded as sent from event `sequence` on
    pub fn sent_hashes_since(&self, sequence: u64) -> Result<Vec<Hash>> {
        let mut hashes = Vec::new();
        for entry in self.tree()?.range(sequence.to_be_bytes()..) {
            let (_, bytes) = entry?;
            let event: AuditEvent = serde_json::from_slice(&bytes)?;
            if event.kind == AuditKind::Sent {
                hashes.push(serde_json::from_value(event.payload["hash"].clone())?);
            }
        }
        Ok(hashes)
    }

    /// Write the ordered events to `<base_dir>/<profile>.report.json`.
    /// Calling it again without new events produces the same report.
    pub async fn generate_report(&self) -> Result<Report> {
        let report = Report {
            profile: self.profile.clone(),
            events: self.events()?,
        };

        if let Some(parent) = self.report_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&report)?;
        let mut file = fs::File::create(&self.report_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        debug!(
            "Report with {} events written to {}",
            report.events.len(),
            self.report_path.display()
        );
        Ok(report)
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub async fn load_report(path: impl AsRef<Path>) -> Result<Report> {
        let content = fs::read_to_string(path.as_ref()).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub(crate) async fn close(&mut self) -> Result<()> {
        let tree = self.tree.take().ok_or(HarnessError::SessionClosed)?;
        tree.flush_async().await?;
        Ok(())
    }
}
