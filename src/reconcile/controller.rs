//! Throttling and failure-streak circuit breaker.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pipeline pacing and failure handling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Delay after each successful reviewer call
    #[serde(default = "default_steady_delay_ms")]
    pub steady_delay_ms: u64,
    /// Delay after a failed reviewer call
    #[serde(default = "default_failure_cooldown_ms")]
    pub failure_cooldown_ms: u64,
    /// Consecutive failures that halt the run
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Treat stored error records as pending on the next run
    #[serde(default)]
    pub retry_errors: bool,
}

fn default_steady_delay_ms() -> u64 {
    1000
}

fn default_failure_cooldown_ms() -> u64 {
    6000
}

fn default_max_consecutive_failures() -> u32 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            steady_delay_ms: default_steady_delay_ms(),
            failure_cooldown_ms: default_failure_cooldown_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            retry_errors: false,
        }
    }
}

/// What the pipeline should do after a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Wait, then continue with the next page.
    Cooldown(Duration),
    /// The failure streak reached the threshold; stop the run.
    Halt { consecutive: u32 },
}

/// Counts consecutive failures and decides delays.
///
/// State lives on the instance; every run gets a fresh controller.
#[derive(Debug, Clone)]
pub struct RetryController {
    steady_delay: Duration,
    failure_cooldown: Duration,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
}

impl RetryController {
    pub fn new(steady_delay: Duration, failure_cooldown: Duration, max_consecutive_failures: u32) -> Self {
        Self {
            steady_delay,
            failure_cooldown,
            max_consecutive_failures: max_consecutive_failures.max(1),
            consecutive_failures: 0,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Duration::from_millis(config.steady_delay_ms),
            Duration::from_millis(config.failure_cooldown_ms),
            config.max_consecutive_failures,
        )
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Reset the streak; returns the steady-state delay.
    pub fn record_success(&mut self) -> Duration {
        self.consecutive_failures = 0;
        self.steady_delay
    }

    /// Extend the streak; returns the cooldown or a halt.
    pub fn record_failure(&mut self) -> FailureAction {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.max_consecutive_failures {
            FailureAction::Halt {
                consecutive: self.consecutive_failures,
            }
        } else {
            FailureAction::Cooldown(self.failure_cooldown)
        }
    }
}
