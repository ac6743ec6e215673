use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff for the registry wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Timeout of the first attempt (milliseconds)
    pub initial_timeout_ms: u64,

    /// Each further attempt waits this many times longer
    pub backoff_factor: u32,

    /// Give up once the attempts together waited this long (milliseconds)
    pub ceiling_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_timeout_ms: 100,
            backoff_factor: 2,
            ceiling_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_millis(self.initial_timeout_ms)
    }

    #[must_use]
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.ceiling_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_timeout_ms == 0 {
            return Err("initial_timeout_ms must be > 0".to_string());
        }
        if self.backoff_factor < 2 {
            return Err("backoff_factor must be >= 2".to_string());
        }
        if self.ceiling_ms < self.initial_timeout_ms {
            return Err("ceiling_ms must be >= initial_timeout_ms".to_string());
        }
        Ok(())
    }
}

/// How one bounded wait attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The condition held
    Satisfied,
    /// The attempt timed out or the remote side failed
    Missed,
}

/// Registry wait as a state machine; the runner performs the I/O between transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState {
    AwaitingRegistry {
        /// Attempts already made
        attempts: u32,
        /// Timeout of the next attempt
        timeout: Duration,
        waited: Duration,
    },
    Loaded {
        attempts: u32,
        waited: Duration,
    },
    Failed {
        attempts: u32,
        waited: Duration,
    },
}

impl WaitState {
    #[must_use]
    pub fn start(policy: &RetryPolicy) -> Self {
        Self::AwaitingRegistry {
            attempts: 0,
            timeout: policy.initial_timeout(),
            waited: Duration::ZERO,
        }
    }

    /// Apply the outcome of one attempt that took `elapsed`
    #[must_use]
    pub fn advance(self, attempt: Attempt, elapsed: Duration, policy: &RetryPolicy) -> Self {
        let Self::AwaitingRegistry {
            attempts,
            timeout,
            waited,
        } = self
        else {
            return self;
        };
        let attempts = attempts + 1;
        let waited = waited + elapsed;

        match attempt {
            Attempt::Satisfied => Self::Loaded { attempts, waited },
            Attempt::Missed if waited >= policy.ceiling() => Self::Failed { attempts, waited },
            Attempt::Missed => Self::AwaitingRegistry {
                attempts,
                timeout: timeout.saturating_mul(policy.backoff_factor),
                waited,
            },
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::AwaitingRegistry { .. })
    }
}
