/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_types::retry::ErrorKind;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

const DEFAULT_CAPACITY: usize = 500;
const DEFAULT_RETRY_COST: u32 = 5;
const DEFAULT_RETRY_TIMEOUT_COST: u32 = DEFAULT_RETRY_COST * 2;
const PERMIT_REGENERATION_AMOUNT: usize = 1;

/// Retry quota shared by every call made through one retry strategy.
///
/// Each retry takes tokens out of the bucket; a successful call returns the tokens its last
/// retry took and regenerates one more. When a service fails persistently the bucket runs
/// dry and calls stop retrying until it refills.
#[derive(Clone, Debug)]
pub struct TokenBucket {
    semaphore: Arc<Semaphore>,
    max_permits: usize,
    timeout_retry_cost: u32,
    retry_cost: u32,
    throttling_retry_cost: u32,
}

impl Default for TokenBucket {
    fn default() -> Self {
        TokenBucketBuilder::default().build()
    }
}

impl TokenBucket {
    /// Creates a new `TokenBucket` with the given initial quota.
    pub fn new(initial_quota: usize) -> Self {
        TokenBucketBuilder::default().capacity(initial_quota).build()
    }

    /// A token bucket with unlimited capacity that allows retries at no cost.
    pub fn unlimited() -> Self {
        TokenBucketBuilder::default()
            .capacity(Semaphore::MAX_PERMITS)
            .retry_cost(0)
            .timeout_retry_cost(0)
            .throttling_retry_cost(0)
            .build()
    }

    /// Creates a builder for constructing a `TokenBucket`.
    pub fn builder() -> TokenBucketBuilder {
        TokenBucketBuilder::default()
    }

    pub(crate) fn acquire(&self, err: &ErrorKind) -> Option<OwnedSemaphorePermit> {
        let retry_cost = match err {
            ErrorKind::TransientError => self.timeout_retry_cost,
            ErrorKind::ThrottlingError => self.throttling_retry_cost,
            _ => self.retry_cost,
        };

        self.semaphore
            .clone()
            .try_acquire_many_owned(retry_cost)
            .ok()
    }

    pub(crate) fn regenerate_a_token(&self) {
        let available = self.semaphore.available_permits();
        if available >= self.max_permits {
            return;
        }
        let tokens_to_add = PERMIT_REGENERATION_AMOUNT.min(self.max_permits - available);
        trace!("adding {tokens_to_add} back into the bucket");
        self.semaphore.add_permits(tokens_to_add);
    }

    /// Tokens currently available for retries.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Builder for constructing a `TokenBucket`.
#[derive(Clone, Debug, Default)]
pub struct TokenBucketBuilder {
    capacity: Option<usize>,
    retry_cost: Option<u32>,
    timeout_retry_cost: Option<u32>,
    throttling_retry_cost: Option<u32>,
}

impl TokenBucketBuilder {
    /// Creates a new `TokenBucketBuilder` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum bucket capacity for the builder.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the cost of retrying a server error.
    pub fn retry_cost(mut self, retry_cost: u32) -> Self {
        self.retry_cost = Some(retry_cost);
        self
    }

    /// Sets the cost of retrying a transient error such as a timeout.
    pub fn timeout_retry_cost(mut self, timeout_retry_cost: u32) -> Self {
        self.timeout_retry_cost = Some(timeout_retry_cost);
        self
    }

    /// Sets the cost of retrying a throttling error. Defaults to the server error cost.
    pub fn throttling_retry_cost(mut self, throttling_retry_cost: u32) -> Self {
        self.throttling_retry_cost = Some(throttling_retry_cost);
        self
    }

    /// Builds a `TokenBucket`.
    pub fn build(self) -> TokenBucket {
        let capacity = self.capacity.unwrap_or(DEFAULT_CAPACITY);
        let retry_cost = self.retry_cost.unwrap_or(DEFAULT_RETRY_COST);
        TokenBucket {
            semaphore: Arc::new(Semaphore::new(capacity)),
            max_permits: capacity,
            retry_cost,
            timeout_retry_cost: self
                .timeout_retry_cost
                .unwrap_or(DEFAULT_RETRY_TIMEOUT_COST),
            throttling_retry_cost: self.throttling_retry_cost.unwrap_or(retry_cost),
        }
    }
}
