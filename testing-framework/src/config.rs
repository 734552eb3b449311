// File: testing-framework/src/config.rs
//
// Tunables of the watcher, the step runner and the batch dispatcher.
// All of them deserialize from JSON with defaults for missing fields,
// durations being expressed in milliseconds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Defaults match a local network with ~1s rounds
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_TRANSIENT_ERRORS: u32 = 8;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Polling behavior of the transaction watcher
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AwaitingOptions {
    #[serde(with = "duration_ms")]
    pub polling_interval: Duration,
    // Total budget of one wait
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    // Consecutive transient or "not found" answers tolerated before giving up
    pub max_transient_errors: u32,
}

impl Default for AwaitingOptions {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            max_transient_errors: DEFAULT_MAX_TRANSIENT_ERRORS,
        }
    }
}

impl AwaitingOptions {
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_transient_errors(mut self, max: u32) -> Self {
        self.max_transient_errors = max;
        self
    }
}

/// Budget of one test step
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct StepOptions {
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    // Additional attempts after a failure, each preceded by a reconciliation
    pub retries: u32,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
        }
    }
}

/// Bulk submission settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DispatchOptions {
    pub chunk_size: usize,
    #[serde(with = "duration_ms")]
    pub wait_between_chunks: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            wait_between_chunks: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let options: AwaitingOptions = serde_json::from_str(r#"{"pollingInterval": 250}"#).unwrap();
        assert_eq!(options.polling_interval, Duration::from_millis(250));
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert_eq!(options.max_transient_errors, 8);

        let step: StepOptions = serde_json::from_str(r#"{"retries": 2}"#).unwrap();
        assert_eq!(step.retries, 2);
        assert_eq!(step.timeout, Duration::from_secs(300));

        let dispatch: DispatchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(dispatch, DispatchOptions::default());
    }

    #[test]
    fn test_durations_serialize_as_millis() {
        let json = serde_json::to_value(AwaitingOptions::default()).unwrap();
        assert_eq!(json["pollingInterval"], 1000);
        assert_eq!(json["timeout"], 300_000);
    }
}
