/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Classifiers deciding whether a failed attempt is retryable.
pub mod classifiers;

/// Retry strategies.
pub mod strategy;

mod token_bucket;

pub use token_bucket::{TokenBucket, TokenBucketBuilder};
