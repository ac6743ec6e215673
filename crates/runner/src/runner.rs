use crate::adapter::RemoteAdapter;
use crate::error::{Result, RunnerError};
use crate::record::{CandidateRecord, ResolvedFragment};
use crate::request::{FragmentTarget, RunRequest};
use crate::scripts;
use crate::wait::{Attempt, RetryPolicy, WaitState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

/// Final state of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitReport {
    pub satisfied: bool,
    pub attempts: u32,
    pub waited: Duration,
}

/// Drives fragments inside one remote context.
///
/// Calls are expected one at a time per context; nothing here serializes them.
pub struct Runner<A> {
    adapter: A,
    policy: RetryPolicy,
}

impl<A: RemoteAdapter> Runner<A> {
    pub fn new(adapter: A, policy: RetryPolicy) -> Result<Self> {
        policy.validate().map_err(RunnerError::InvalidConfig)?;
        Ok(Self { adapter, policy })
    }

    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Install the namespaced store in a freshly loaded context
    pub async fn bootstrap(&self) -> Result<()> {
        self.adapter.evaluate(scripts::BOOTSTRAP, Value::Null).await?;
        Ok(())
    }

    /// Wait for the file's module, resolve the fragment and invoke it with `data`
    pub async fn run(&self, request: RunRequest) -> Result<Value> {
        let RunRequest {
            content_hash,
            target,
            data,
        } = request;

        let report = self
            .wait_for_condition_and_reload(scripts::HAS_ENTRY, json!(content_hash))
            .await?;
        if !report.satisfied {
            return Err(RunnerError::RegistryTimeout {
                content_hash,
                attempts: report.attempts,
                waited: report.waited,
            });
        }

        let record = self.load_record(&content_hash).await?;
        let Some(ResolvedFragment { section, key }) = record.resolve(&target) else {
            return Err(RunnerError::UnmatchedFunction {
                requested: target.describe(),
                preview: target.preview(),
                content_hash,
                candidates: record,
            });
        };

        log::debug!("{content_hash}: invoking {} '{key}'", section.as_str());
        let result = self
            .adapter
            .evaluate(
                scripts::INVOKE,
                json!({
                    "hash": content_hash,
                    "section": section.as_str(),
                    "key": key,
                    "data": data,
                }),
            )
            .await?;
        Ok(result)
    }

    /// Typed wrapper around [`Runner::run`]
    pub async fn call<T, R>(&self, content_hash: &str, target: FragmentTarget, data: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let data = serde_json::to_value(data)?;
        let value = self
            .run(RunRequest::new(content_hash, target, data))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Poll `predicate(arg)` remotely with growing timeouts, reloading the context
    /// between attempts, until it holds or the policy's ceiling is reached
    pub async fn wait_for_condition_and_reload(
        &self,
        predicate: &str,
        arg: Value,
    ) -> Result<WaitReport> {
        let mut state = WaitState::start(&self.policy);

        loop {
            match state {
                WaitState::AwaitingRegistry {
                    attempts, timeout: limit, ..
                } => {
                    if attempts > 0 {
                        log::warn!(
                            "condition not met after attempt {attempts}; reloading remote context"
                        );
                        if let Err(e) = self.adapter.reload().await {
                            log::warn!("reload failed: {e}");
                        }
                    }

                    let started = Instant::now();
                    let outcome =
                        match timeout(limit, self.adapter.wait_for_function(predicate, arg.clone()))
                            .await
                        {
                            Ok(Ok(())) => Attempt::Satisfied,
                            Ok(Err(e)) => {
                                log::debug!("attempt {} failed remotely: {e}", attempts + 1);
                                // An early remote failure still occupies the whole attempt.
                                sleep(limit.saturating_sub(started.elapsed())).await;
                                Attempt::Missed
                            }
                            Err(_) => Attempt::Missed,
                        };
                    state = state.advance(outcome, started.elapsed(), &self.policy);
                }
                WaitState::Loaded { attempts, waited } => {
                    return Ok(WaitReport {
                        satisfied: true,
                        attempts,
                        waited,
                    })
                }
                WaitState::Failed { attempts, waited } => {
                    return Ok(WaitReport {
                        satisfied: false,
                        attempts,
                        waited,
                    })
                }
            }
        }
    }

    async fn load_record(&self, content_hash: &str) -> Result<CandidateRecord> {
        let value = self
            .adapter
            .evaluate(scripts::LOAD_RECORD, json!({ "hash": content_hash }))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Registry that never learns about anything
    #[derive(Default)]
    struct EmptyContext {
        attempts: Mutex<Vec<Instant>>,
        reloads: Mutex<u32>,
    }

    #[async_trait]
    impl RemoteAdapter for EmptyContext {
        async fn evaluate(&self, _script: &str, _arg: Value) -> std::result::Result<Value, RemoteError> {
            Err(RemoteError::Evaluation("not loaded".into()))
        }

        async fn wait_for_function(
            &self,
            _predicate: &str,
            _arg: Value,
        ) -> std::result::Result<(), RemoteError> {
            self.attempts.lock().unwrap().push(Instant::now());
            std::future::pending().await
        }

        async fn reload(&self) -> std::result::Result<(), RemoteError> {
            *self.reloads.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_grow_strictly_until_timeout() {
        let runner = Runner::new(EmptyContext::default(), RetryPolicy::default()).unwrap();
        let err = runner
            .run(RunRequest::new(
                "0123456789ab",
                FragmentTarget::label("x"),
                Value::Null,
            ))
            .await
            .unwrap_err();

        match err {
            RunnerError::RegistryTimeout {
                content_hash,
                attempts,
                waited,
            } => {
                assert_eq!(content_hash, "0123456789ab");
                assert_eq!(attempts, 6);
                assert!(waited >= Duration::from_secs(5));
            }
            other => panic!("unexpected {other}"),
        }

        let starts = runner.adapter().attempts.lock().unwrap().clone();
        let gaps: Vec<Duration> = starts.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.windows(2).all(|w| w[1] > w[0]), "{gaps:?}");
        assert_eq!(*runner.adapter().reloads.lock().unwrap(), 5);
    }

    /// Context whose polling throws at once, as while a reloaded page is still loading
    #[derive(Default)]
    struct DestroyedContext {
        reloads: Mutex<u32>,
    }

    #[async_trait]
    impl RemoteAdapter for DestroyedContext {
        async fn evaluate(&self, _: &str, _: Value) -> std::result::Result<Value, RemoteError> {
            Err(RemoteError::Closed)
        }
        async fn wait_for_function(&self, _: &str, _: Value) -> std::result::Result<(), RemoteError> {
            Err(RemoteError::Evaluation("Execution context was destroyed".into()))
        }
        async fn reload(&self) -> std::result::Result<(), RemoteError> {
            *self.reloads.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_remote_failures_still_wait_out_each_attempt() {
        let runner = Runner::new(DestroyedContext::default(), RetryPolicy::default()).unwrap();
        let started = Instant::now();
        let report = runner
            .wait_for_condition_and_reload(scripts::HAS_ENTRY, json!("h"))
            .await
            .unwrap();

        assert!(!report.satisfied);
        assert_eq!(report.attempts, 6);
        assert!(started.elapsed() >= Duration::from_secs(5), "{:?}", started.elapsed());
        assert_eq!(started.elapsed(), report.waited);
        assert_eq!(*runner.adapter().reloads.lock().unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_reports_success_without_reload() {
        struct Ready;
        #[async_trait]
        impl RemoteAdapter for Ready {
            async fn evaluate(&self, _: &str, _: Value) -> std::result::Result<Value, RemoteError> {
                Ok(Value::Null)
            }
            async fn wait_for_function(&self, _: &str, _: Value) -> std::result::Result<(), RemoteError> {
                Ok(())
            }
            async fn reload(&self) -> std::result::Result<(), RemoteError> {
                panic!("no reload expected")
            }
        }

        let runner = Runner::new(Ready, RetryPolicy::default()).unwrap();
        let report = runner
            .wait_for_condition_and_reload(scripts::HAS_ENTRY, json!("h"))
            .await
            .unwrap();
        assert_eq!(
            report,
            WaitReport {
                satisfied: true,
                attempts: 1,
                waited: Duration::ZERO
            }
        );
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = RetryPolicy {
            initial_timeout_ms: 0,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            Runner::new(EmptyContext::default(), policy),
            Err(RunnerError::InvalidConfig(_))
        ));
    }
}
