/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::retries::token_bucket::TokenBucket;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::retries::{RetryAction, RetryState, RetryStrategy, ShouldAttempt};
use invoke_types::retry::{RetryConfig, RetryMode};
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;
use tracing::debug;

/// Retry strategy with exponential backoff, max attempts and a retry quota.
///
/// The delay before retry `n` (counting from one) is a random fraction of
/// `initial_backoff * 2^(n - 1)`, capped at `max_backoff`.
#[derive(Debug)]
pub struct StandardRetryStrategy {
    config: RetryConfig,
    token_bucket: Option<TokenBucket>,
}

impl Default for StandardRetryStrategy {
    fn default() -> Self {
        Self::new(RetryConfig::standard())
    }
}

impl StandardRetryStrategy {
    /// Create a new standard retry strategy with the given config.
    pub fn new(config: RetryConfig) -> Self {
        let token_bucket = config.use_retry_quota().then(|| match config.mode() {
            // throttled attempts are free in legacy mode
            RetryMode::Legacy => TokenBucket::builder().throttling_retry_cost(0).build(),
            _ => TokenBucket::default(),
        });
        Self {
            config,
            token_bucket,
        }
    }

    /// Use `token_bucket` as the retry quota instead of a bucket of the default size.
    pub fn with_token_bucket(mut self, token_bucket: TokenBucket) -> Self {
        self.token_bucket = Some(token_bucket);
        self
    }

    /// The configuration this strategy was built from.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The retry quota, if one is used.
    pub fn token_bucket(&self) -> Option<&TokenBucket> {
        self.token_bucket.as_ref()
    }

    fn backoff(&self, attempts: u32) -> Duration {
        calculate_exponential_backoff(
            fastrand::f64(),
            self.config.initial_backoff().as_secs_f64(),
            attempts.saturating_sub(1),
            self.config.max_backoff(),
        )
    }
}

/// Tokens held by one call for its most recent retry.
///
/// Tokens go back to the bucket only when a retry succeeds. Dropping the permit for any other
/// reason (another failure, the call giving up, the call being cancelled) spends them.
#[derive(Debug)]
struct RetryPermit(Option<OwnedSemaphorePermit>);

impl RetryPermit {
    fn release(mut self) {
        drop(self.0.take());
    }
}

impl Drop for RetryPermit {
    fn drop(&mut self) {
        if let Some(permit) = self.0.take() {
            permit.forget();
        }
    }
}

impl RetryStrategy for StandardRetryStrategy {
    fn should_attempt_initial_request(
        &self,
        _state: &mut RetryState,
    ) -> Result<ShouldAttempt, BoxError> {
        Ok(ShouldAttempt::Yes)
    }

    fn should_attempt_retry(
        &self,
        state: &mut RetryState,
        action: &RetryAction,
    ) -> Result<ShouldAttempt, BoxError> {
        let attempts = state.attempts();
        let Some(kind) = action.retry_kind() else {
            debug!("attempt #{attempts} classified as {action}, not retrying");
            return Ok(ShouldAttempt::No);
        };

        if attempts >= self.config.max_attempts() {
            debug!(
                attempts,
                max_attempts = self.config.max_attempts(),
                "not retrying because we are out of attempts"
            );
            return Ok(ShouldAttempt::No);
        }

        if let Some(token_bucket) = &self.token_bucket {
            match token_bucket.acquire(&kind) {
                Some(permit) => {
                    // storing replaces the previous retry's permit, which spends its tokens
                    state.store(RetryPermit(Some(permit)));
                }
                None => {
                    debug!("attempt #{attempts} failed with {kind:?}; however, not enough retry quota is available for another attempt so no retry will be attempted.");
                    return Ok(ShouldAttempt::No);
                }
            }
        }

        let backoff = self.backoff(attempts);
        debug!(
            "attempt #{attempts} failed with {kind:?}; retrying after {:?}",
            backoff
        );
        Ok(ShouldAttempt::YesAfterDelay(backoff))
    }

    fn on_success(&self, state: &mut RetryState) {
        if let Some(token_bucket) = &self.token_bucket {
            if let Some(permit) = state.take::<RetryPermit>() {
                permit.release();
            }
            token_bucket.regenerate_a_token();
        }
    }
}

fn calculate_exponential_backoff(
    base: f64,
    initial_backoff: f64,
    retry_attempts: u32,
    max_backoff: Duration,
) -> Duration {
    let ceiling = match 2_u32
        .checked_pow(retry_attempts)
        .map(|power| (power as f64) * initial_backoff)
    {
        Some(backoff) => match Duration::try_from_secs_f64(backoff) {
            Ok(result) => result.min(max_backoff),
            Err(e) => {
                tracing::warn!("falling back to {max_backoff:?} as `Duration` could not be created for exponential backoff: {e}");
                max_backoff
            }
        },
        None => max_backoff,
    };

    // `base` is the jitter, in 0..1
    ceiling.mul_f64(base.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_types::retry::ErrorKind;

    fn retry(
        strategy: &StandardRetryStrategy,
        state: &mut RetryState,
        kind: ErrorKind,
    ) -> ShouldAttempt {
        state.increment_attempts();
        strategy
            .should_attempt_retry(state, &RetryAction::Retry(kind))
            .unwrap()
    }

    #[test]
    fn no_retry_for_unretryable_failures() {
        let strategy = StandardRetryStrategy::default();
        let mut state = RetryState::new();
        state.increment_attempts();
        strategy
            .should_attempt_retry(&mut state, &RetryAction::NoRetry)
            .unwrap()
            .expect_no();
    }

    #[test]
    fn stops_at_max_attempts() {
        let strategy = StandardRetryStrategy::new(RetryConfig::standard().with_max_attempts(3));
        let mut state = RetryState::new();
        assert!(matches!(
            retry(&strategy, &mut state, ErrorKind::ServerError),
            ShouldAttempt::YesAfterDelay(_)
        ));
        assert!(matches!(
            retry(&strategy, &mut state, ErrorKind::ServerError),
            ShouldAttempt::YesAfterDelay(_)
        ));
        retry(&strategy, &mut state, ErrorKind::ServerError).expect_no();
    }

    #[test]
    fn backoff_is_capped() {
        let strategy = StandardRetryStrategy::new(
            RetryConfig::standard()
                .with_max_attempts(10)
                .with_initial_backoff(Duration::from_secs(1))
                .with_max_backoff(Duration::from_secs(3))
                .with_retry_quota(false),
        );
        let mut state = RetryState::new();
        for _ in 0..9 {
            let delay = retry(&strategy, &mut state, ErrorKind::ThrottlingError).expect_delay();
            assert!(delay <= Duration::from_secs(3), "{delay:?}");
        }
    }

    #[test]
    fn exponential_backoff_doubles() {
        let max = Duration::from_secs(20);
        assert_eq!(calculate_exponential_backoff(1.0, 0.1, 0, max), Duration::from_millis(100));
        assert_eq!(calculate_exponential_backoff(1.0, 0.1, 1, max), Duration::from_millis(200));
        assert_eq!(calculate_exponential_backoff(1.0, 0.1, 3, max), Duration::from_millis(800));
        assert_eq!(calculate_exponential_backoff(0.5, 0.1, 3, max), Duration::from_millis(400));
        assert_eq!(calculate_exponential_backoff(1.0, 0.1, 40, max), max);
    }

    #[test]
    fn failed_retries_spend_quota_and_success_refunds_the_last() {
        let strategy = StandardRetryStrategy::new(RetryConfig::standard().with_max_attempts(5))
            .with_token_bucket(TokenBucket::new(20));
        let bucket = strategy.token_bucket().unwrap().clone();
        let mut state = RetryState::new();

        retry(&strategy, &mut state, ErrorKind::ServerError).expect_delay();
        assert_eq!(bucket.available_permits(), 15);
        retry(&strategy, &mut state, ErrorKind::ServerError).expect_delay();
        assert_eq!(bucket.available_permits(), 10);

        strategy.on_success(&mut state);
        // the first retry's tokens were spent, the second's are refunded, plus one regenerated
        assert_eq!(bucket.available_permits(), 16);
    }

    #[test]
    fn exhausted_quota_stops_retries() {
        let strategy = StandardRetryStrategy::new(RetryConfig::standard().with_max_attempts(10))
            .with_token_bucket(TokenBucket::new(10));
        let mut state = RetryState::new();
        retry(&strategy, &mut state, ErrorKind::TransientError).expect_delay();
        retry(&strategy, &mut state, ErrorKind::TransientError).expect_no();
    }

    #[test]
    fn abandoned_calls_spend_their_permit() {
        let strategy = StandardRetryStrategy::new(RetryConfig::standard())
            .with_token_bucket(TokenBucket::new(10));
        let bucket = strategy.token_bucket().unwrap().clone();
        let mut state = RetryState::new();
        retry(&strategy, &mut state, ErrorKind::ServerError).expect_delay();
        drop(state);
        assert_eq!(bucket.available_permits(), 5);
    }

    #[test]
    fn legacy_mode_does_not_charge_throttling() {
        let strategy = StandardRetryStrategy::new(RetryConfig::for_mode(RetryMode::Legacy));
        let bucket = strategy.token_bucket().unwrap().clone();
        let mut state = RetryState::new();
        for _ in 0..3 {
            retry(&strategy, &mut state, ErrorKind::ThrottlingError).expect_delay();
        }
        assert_eq!(bucket.available_permits(), 500);
    }

    #[test]
    fn success_without_retries_regenerates_up_to_capacity() {
        let strategy = StandardRetryStrategy::default();
        let bucket = strategy.token_bucket().unwrap().clone();
        strategy.on_success(&mut RetryState::new());
        assert_eq!(bucket.available_permits(), 500);
    }
}
