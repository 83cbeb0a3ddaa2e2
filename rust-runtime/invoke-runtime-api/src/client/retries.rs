/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Retry handling and token bucket.
//!
//! This code defines when and how failed requests should be retried. The execution engine
//! never computes backoff itself: after each failed attempt it asks a [`ClassifyRetry`] what
//! kind of failure occurred, then asks the [`RetryStrategy`] whether, and when, to try again.

use crate::box_error::BoxError;
use crate::client::result::ConnectorError;
use crate::impl_shared_conversions;
use invoke_types::error::ErrorMetadata;
use invoke_types::retry::{ErrorKind, RetryConfig};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An answer to the question "should I make a request attempt?"
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShouldAttempt {
    /// Yes, an attempt should be made
    Yes,
    /// No, no attempt should be made
    No,
    /// Yes, an attempt should be made, but only after the given amount of time has passed
    YesAfterDelay(Duration),
}

impl ShouldAttempt {
    /// Returns the delay duration if this is a `YesAfterDelay` variant.
    pub fn expect_delay(self) -> Duration {
        match self {
            ShouldAttempt::YesAfterDelay(delay) => delay,
            _ => panic!("Expected this to be the `YesAfterDelay` variant but it was the `{self:?}` variant instead"),
        }
    }

    /// If this isn't a `No` variant, panic.
    pub fn expect_no(self) {
        if ShouldAttempt::No == self {
            return;
        }

        panic!("Expected this to be the `No` variant but it was the `{self:?}` variant instead");
    }
}

/// The result of running a [`ClassifyRetry`] on a failed attempt.
#[non_exhaustive]
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RetryAction {
    /// When an error is received that should be retried, this action is returned.
    Retry(ErrorKind),
    /// When a response should not be retried, this action is returned.
    NoRetry,
}

impl RetryAction {
    /// The error kind, if this action asks for a retry.
    pub fn retry_kind(&self) -> Option<ErrorKind> {
        match self {
            RetryAction::Retry(kind) => Some(*kind),
            RetryAction::NoRetry => None,
        }
    }
}

impl fmt::Display for RetryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry(kind) => write!(f, "retry ({kind})"),
            Self::NoRetry => write!(f, "don't retry"),
        }
    }
}

/// What went wrong with one request attempt.
///
/// Construction failures never reach a classifier: they are not retryable.
#[non_exhaustive]
#[derive(Debug)]
pub enum AttemptFailure<'a> {
    /// The transport failed before a response was received.
    Connector(&'a ConnectorError),
    /// The attempt ran past its attempt timeout.
    Timeout,
    /// A response was received but could not be parsed.
    Response {
        /// HTTP status of the response.
        status: u16,
        /// The parse failure.
        source: &'a (dyn std::error::Error + Send + Sync + 'static),
    },
    /// The service responded with an error.
    Service {
        /// HTTP status of the response.
        status: u16,
        /// The error code and message carried by the response.
        meta: &'a ErrorMetadata,
    },
}

/// Classifies what kind of retry is needed for a failed attempt.
pub trait ClassifyRetry: Send + Sync + fmt::Debug {
    /// Returns a [`RetryAction`] for `failure`.
    fn classify_retry(&self, failure: &AttemptFailure<'_>) -> RetryAction;

    /// The name of this retry classifier.
    ///
    /// Used for debugging purposes
    fn name(&self) -> &'static str;
}

/// Retry classifier used by the retry strategy to classify responses as retryable or not.
#[derive(Debug, Clone)]
pub struct SharedRetryClassifier(Arc<dyn ClassifyRetry>);

impl SharedRetryClassifier {
    /// Given a [`ClassifyRetry`] trait object, create a new `SharedRetryClassifier`.
    pub fn new(retry_classifier: impl ClassifyRetry + 'static) -> Self {
        Self(Arc::new(retry_classifier))
    }
}

impl ClassifyRetry for SharedRetryClassifier {
    fn classify_retry(&self, failure: &AttemptFailure<'_>) -> RetryAction {
        self.0.classify_retry(failure)
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl_shared_conversions!(convert SharedRetryClassifier from ClassifyRetry using SharedRetryClassifier::new);

/// Per-call retry bookkeeping.
///
/// A retry strategy is shared by every call a client makes. Anything it needs to remember
/// about one call (how many attempts were made, a retry permit it acquired) lives here, and
/// is dropped when the call ends.
#[derive(Default)]
pub struct RetryState {
    attempts: u32,
    slot: Option<Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for RetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryState")
            .field("attempts", &self.attempts)
            .field("slot", &self.slot.is_some())
            .finish()
    }
}

impl RetryState {
    /// Creates state for a call that has not made any attempt yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record that another attempt is starting.
    pub fn increment_attempts(&mut self) {
        self.attempts += 1;
    }

    /// Store strategy-private data for this call, replacing whatever was stored before.
    pub fn store<T: Any + Send + Sync>(&mut self, value: T) {
        self.slot = Some(Box::new(value));
    }

    /// Remove strategy-private data for this call.
    pub fn take<T: Any + Send + Sync>(&mut self) -> Option<T> {
        match self.slot.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                self.slot = Some(other);
                None
            }
        }
    }
}

/// Decides whether, and when, a call should make another attempt.
pub trait RetryStrategy: Send + Sync + fmt::Debug {
    /// Decides if the initial attempt should be made.
    fn should_attempt_initial_request(
        &self,
        state: &mut RetryState,
    ) -> Result<ShouldAttempt, BoxError>;

    /// Decides if a retry should be done after a failed attempt classified as `action`.
    ///
    /// `state.attempts()` counts every attempt made so far, including the one that failed.
    fn should_attempt_retry(
        &self,
        state: &mut RetryState,
        action: &RetryAction,
    ) -> Result<ShouldAttempt, BoxError>;

    /// Called when an attempt succeeds.
    fn on_success(&self, state: &mut RetryState) {
        let _ = state;
    }
}

/// A shared retry strategy.
#[derive(Clone, Debug)]
pub struct SharedRetryStrategy(Arc<dyn RetryStrategy>);

impl SharedRetryStrategy {
    /// Creates a new [`SharedRetryStrategy`] from a retry strategy.
    pub fn new(retry_strategy: impl RetryStrategy + 'static) -> Self {
        Self(Arc::new(retry_strategy))
    }

    /// Returns true if both handles point at the same strategy.
    pub fn ptr_eq(&self, other: &SharedRetryStrategy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl RetryStrategy for SharedRetryStrategy {
    fn should_attempt_initial_request(
        &self,
        state: &mut RetryState,
    ) -> Result<ShouldAttempt, BoxError> {
        self.0.should_attempt_initial_request(state)
    }

    fn should_attempt_retry(
        &self,
        state: &mut RetryState,
        action: &RetryAction,
    ) -> Result<ShouldAttempt, BoxError> {
        self.0.should_attempt_retry(state, action)
    }

    fn on_success(&self, state: &mut RetryState) {
        self.0.on_success(state)
    }
}

impl_shared_conversions!(convert SharedRetryStrategy from RetryStrategy using SharedRetryStrategy::new);

/// Customizes the [`RetryConfig`] a retry strategy is built from.
///
/// A configurator is the highest-precedence way to choose retry behavior for a call. It is
/// applied on top of the preset of the configured retry mode.
#[derive(Clone)]
pub struct SharedRetryConfigurator(Arc<dyn Fn(&mut RetryConfig) + Send + Sync>);

impl SharedRetryConfigurator {
    /// Creates a configurator from a closure.
    pub fn new(configure: impl Fn(&mut RetryConfig) + Send + Sync + 'static) -> Self {
        Self(Arc::new(configure))
    }

    /// Apply this configurator to `config`.
    pub fn configure(&self, config: &mut RetryConfig) {
        (self.0)(config)
    }
}

impl fmt::Debug for SharedRetryConfigurator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedRetryConfigurator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Permit(u32);

    #[test]
    fn retry_state_slot_is_typed() {
        let mut state = RetryState::new();
        state.increment_attempts();
        state.store(Permit(5));
        assert_eq!(state.take::<String>(), None);
        assert_eq!(state.take::<Permit>(), Some(Permit(5)));
        assert_eq!(state.take::<Permit>(), None);
        assert_eq!(state.attempts(), 1);
    }

    #[test]
    fn configurator_mutates_config() {
        let configurator = SharedRetryConfigurator::new(|config| {
            config.set_max_attempts(7);
        });
        let mut config = RetryConfig::standard();
        configurator.configure(&mut config);
        assert_eq!(config.max_attempts(), 7);
    }
}
