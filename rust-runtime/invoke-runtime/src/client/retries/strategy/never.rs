/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::retries::{RetryAction, RetryState, RetryStrategy, ShouldAttempt};

/// A retry strategy that never retries.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct NeverRetryStrategy;

impl NeverRetryStrategy {
    /// Creates a new `NeverRetryStrategy`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetryStrategy for NeverRetryStrategy {
    fn should_attempt_initial_request(
        &self,
        _state: &mut RetryState,
    ) -> Result<ShouldAttempt, BoxError> {
        Ok(ShouldAttempt::Yes)
    }

    fn should_attempt_retry(
        &self,
        _state: &mut RetryState,
        _action: &RetryAction,
    ) -> Result<ShouldAttempt, BoxError> {
        Ok(ShouldAttempt::No)
    }
}
