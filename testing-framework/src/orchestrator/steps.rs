// File: testing-framework/src/orchestrator/steps.rs
//
// Step runner
//
// Steps of a suite run strictly one after the other and the first failure
// aborts the rest. Each attempt has a wall-clock budget; running out of it
// cancels the step, not the transactions it already broadcast.
//
// A retry re-runs the whole step body with fresh nonces, which would
// double-submit if the failed attempt's transactions were accepted. Before
// retrying, every hash the attempt recorded as sent is looked up: if the
// network knows any of them (or cannot tell), the retry is refused.

use futures::future::BoxFuture;
use log::{debug, info, warn};

use crate::config::StepOptions;
use crate::error::{HarnessError, Result};

use super::TestSession;

pub struct StepRunner {
    options: StepOptions,
    failed: Option<String>,
}

impl StepRunner {
    pub fn new(options: StepOptions) -> Self {
        Self {
            options,
            failed: None,
        }
    }

    pub fn options(&self) -> &StepOptions {
        &self.options
    }

    /// Label of the step that aborted the suite
    pub fn failed_step(&self) -> Option<&str> {
        self.failed.as_deref()
    }

    /// Run one step under `label`
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let sum = runner
    ///     .run(&mut session, "query sum", |s| {
    ///         async move { s.query_biguint(&ContractQuery::new(adder, "getSum")).await }.boxed()
    ///     })
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - `HarnessError::SuiteAborted` if an earlier step failed
    /// - `HarnessError::TimedOut` if the last attempt ran out of budget
    /// - `HarnessError::RetryUnsafe` if a retry could double-submit
    /// - the error of the last attempt otherwise
    pub async fn run<T, F>(
        &mut self,
        session: &mut TestSession,
        label: &str,
        mut step: F,
    ) -> Result<T>
    where
        F: for<'a> FnMut(&'a mut TestSession) -> BoxFuture<'a, Result<T>>,
    {
        if let Some(failed) = &self.failed {
            debug!("Skipping step '{}', suite aborted at '{}'", label, failed);
            return Err(HarnessError::SuiteAborted {
                failed_step: failed.clone(),
            });
        }

        session.set_step(label);
        let mut attempt = 0u32;

        loop {
            let mark = session.audit().next_sequence();
            let result = match tokio::time::timeout(self.options.timeout, step(session)).await {
                Ok(result) => result,
                Err(_) => Err(HarnessError::TimedOut {
                    what: format!("step '{}'", label),
                    after: self.options.timeout,
                }),
            };

            let error = match result {
                Ok(value) => {
                    info!("Step '{}' passed", label);
                    return Ok(value);
                }
                Err(e) => e,
            };

            if attempt >= self.options.retries || !error.is_retryable() {
                warn!("Step '{}' failed: {}", label, error);
                self.failed = Some(label.to_string());
                return Err(error);
            }

            attempt += 1;
            warn!(
                "Step '{}' failed ({}), retry {}/{}",
                label, error, attempt, self.options.retries
            );
            if let Err(e) = Self::reconcile(session, label, mark).await {
                warn!("Step '{}' not retried: {}", label, e);
                self.failed = Some(label.to_string());
                return Err(e);
            }
        }
    }

    // Refuse the retry if the failed attempt may have landed, else resync nonces
    async fn reconcile(session: &mut TestSession, label: &str, since: u64) -> Result<()> {
        for hash in session.audit().sent_hashes_since(since)? {
            match session.provider().get_transaction(&hash).await {
                Err(e) if e.is_not_found() => {
                    debug!("{} from the failed attempt is unknown to the network", hash);
                }
                Ok(_) => {
                    return Err(HarnessError::RetryUnsafe {
                        step: label.to_string(),
                        hash,
                    })
                }
                Err(e) => {
                    debug!("Cannot tell whether {} landed: {}", hash, e);
                    return Err(HarnessError::RetryUnsafe {
                        step: label.to_string(),
                        hash,
                    });
                }
            }
        }
        session.resync_tracked().await
    }
}

impl Default for StepRunner {
    fn default() -> Self {
        Self::new(StepOptions::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use crate::orchestrator::tests::setup;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_aborts_suite() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        let mut runner = StepRunner::default();

        let value = runner
            .run(&mut session, "first", |_| async { Ok::<_, HarnessError>(1) }.boxed())
            .await
            .unwrap();
        assert_eq!(value, 1);

        let err = runner
            .run(&mut session, "second", |_| {
                async { Err::<(), _>(HarnessError::Assertion("boom".to_string())) }.boxed()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Assertion(_)));
        assert_eq!(runner.failed_step(), Some("second"));

        let err = runner
            .run(&mut session, "third", |_| async { Ok::<_, HarnessError>(3) }.boxed())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SuiteAborted { failed_step } if failed_step == "second"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_budget() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        let mut runner = StepRunner::new(StepOptions {
            timeout: Duration::from_secs(30),
            retries: 0,
        });

        let err = runner
            .run(&mut session, "slow", |_| {
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<(), HarnessError>(())
                }
                .boxed()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::TimedOut { what, .. } if what == "step 'slow'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_without_sent_transactions() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        let mut runner = StepRunner::new(StepOptions {
            timeout: Duration::from_secs(30),
            retries: 2,
        });
        let attempts = AtomicU32::new(0);

        let value = runner
            .run(&mut session, "flaky", |_| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(HarnessError::Assertion("not yet".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
                .boxed()
            })
            .await
            .unwrap();
        assert_eq!(value, 1);
        assert!(runner.failed_step().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonce_errors_are_not_retried() {
        let dir = TempDir::new().unwrap();
        let (_network, mut session) = setup(&dir, true).await;
        let mut runner = StepRunner::new(StepOptions {
            timeout: Duration::from_secs(30),
            retries: 3,
        });
        let attempts = AtomicU32::new(0);

        let err = runner
            .run(&mut session, "unsynced", |s| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    let alice = s.user("alice")?;
                    s.nonces_mut().get_nonce_then_increment(&alice)
                }
                .boxed()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::NotSynced(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
