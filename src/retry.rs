// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry utilities with exponential backoff for external commands.
///
/// The retry counter is not owned by the executor: callers thread a
/// [`RetryBudget`] through every call belonging to one run, so the total
/// number of retries is bounded across the whole run rather than per command.
use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    command::{CommandRunner, ExternalCommand},
    error::Error,
};

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy
{
    /// Maximum number of retries shared by a whole run (default: 3).
    pub max_retries:         u32,
    /// Exponent offset of the first delay in seconds (default: 3, i.e. 8s).
    pub base_delay_exponent: u32,
}

impl Default for RetryPolicy
{
    fn default() -> Self
    {
        Self {
            max_retries: 3, base_delay_exponent: 3,
        }
    }
}

impl RetryPolicy
{
    /// Delay before the retry that follows `count` earlier retries.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use formulae_tasks::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for(0,), Duration::from_secs(8,));
    /// assert_eq!(policy.delay_for(2,), Duration::from_secs(32,));
    /// ```
    pub fn delay_for(&self, count: u32,) -> Duration
    {
        Duration::from_secs(1u64 << (count + self.base_delay_exponent),)
    }

    /// Rejects policies whose largest delay would not fit in a `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `max_retries + base_delay_exponent`
    /// exceeds 32.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        match self.max_retries.checked_add(self.base_delay_exponent,) {
            Some(total,) if total <= 32 => Ok((),),
            _ => Err(Error::validation(
                "retry.max_retries + retry.base_delay_exponent must not exceed 32",
            ),),
        }
    }
}

/// Retries consumed so far by one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq,)]
pub struct RetryBudget
{
    used: u32,
}

impl RetryBudget
{
    /// Number of retries already spent.
    pub fn used(&self,) -> u32
    {
        self.used
    }
}

/// Suspends the current task between attempts.
pub trait Sleeper
{
    /// Completes once `duration` has elapsed.
    fn sleep(&self, duration: Duration,) -> impl Future<Output = (),>;
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy,)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper
{
    fn sleep(&self, duration: Duration,) -> impl Future<Output = (),>
    {
        tokio::time::sleep(duration,)
    }
}

/// Wraps a [`CommandRunner`] with bounded exponential backoff.
#[derive(Debug,)]
pub struct RetryingExecutor<R, S,>
{
    runner:  R,
    sleeper: S,
    policy:  RetryPolicy,
}

impl<R, S,> RetryingExecutor<R, S,>
where
    R: CommandRunner,
    S: Sleeper,
{
    /// Creates an executor running commands through `runner`.
    pub fn new(runner: R, sleeper: S, policy: RetryPolicy,) -> Self
    {
        Self {
            runner,
            sleeper,
            policy,
        }
    }

    /// Underlying runner, for commands that must not be retried.
    pub fn runner(&self,) -> &R
    {
        &self.runner
    }

    /// Runs `command`, retrying failures while `budget` has retries left.
    ///
    /// Each retry sleeps for [`RetryPolicy::delay_for`] of the retries spent
    /// so far and then charges one retry to `budget`.
    ///
    /// # Errors
    ///
    /// Returns the last failure once the budget is exhausted.
    pub async fn execute(
        &self,
        command: &ExternalCommand,
        budget: &mut RetryBudget,
    ) -> Result<(), Error,>
    {
        let mut attempt = 1u32;

        loop {
            match self.runner.run(command,).await {
                Ok((),) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", command, attempt);
                    }
                    return Ok((),);
                }
                Err(error,) => {
                    if budget.used >= self.policy.max_retries {
                        warn!(
                            "{} failed with no retries left ({} of {} used): {}",
                            command, budget.used, self.policy.max_retries, error
                        );
                        return Err(error,);
                    }

                    let delay = self.policy.delay_for(budget.used,);
                    warn!(
                        "{} failed on attempt {} ({} of {} retries used): {}. Retrying in {}s...",
                        command,
                        attempt,
                        budget.used,
                        self.policy.max_retries,
                        error,
                        delay.as_secs()
                    );

                    self.sleeper.sleep(delay,).await;
                    budget.used += 1;
                    attempt += 1;
                }
            }
        }
    }
}
