/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_runtime_api::client::retries::{AttemptFailure, ClassifyRetry, RetryAction};
use invoke_types::retry::ErrorKind;
use std::borrow::Cow;

/// Error codes that mean the service is asking the client to slow down.
pub const THROTTLING_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "TransactionInProgressException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "LimitExceededException",
    "RequestThrottled",
    "SlowDown",
    "PriorRequestNotComplete",
    "EC2ThrottledException",
];

/// Error codes for failures that are expected to go away on their own.
pub const TRANSIENT_ERROR_CODES: &[&str] =
    &["RequestTimeout", "RequestTimeoutException", "InternalError"];

const TRANSIENT_ERROR_STATUS_CODES: &[u16] = &[500, 502, 503, 504];

const TOO_MANY_REQUESTS: u16 = 429;

/// The retry classifier used when a client does not configure one.
///
/// - connector I/O and timeout failures, attempt timeouts, and unparseable responses are
///   transient errors
/// - a 429 status or a throttling error code is a throttling error
/// - a transient error code is a transient error
/// - a 500, 502, 503 or 504 status is a server error
///
/// Anything else is not retried.
#[derive(Debug)]
pub struct DefaultRetryClassifier {
    throttling_codes: Cow<'static, [&'static str]>,
    transient_codes: Cow<'static, [&'static str]>,
    retryable_status_codes: Cow<'static, [u16]>,
}

impl Default for DefaultRetryClassifier {
    fn default() -> Self {
        Self {
            throttling_codes: Cow::Borrowed(THROTTLING_ERROR_CODES),
            transient_codes: Cow::Borrowed(TRANSIENT_ERROR_CODES),
            retryable_status_codes: Cow::Borrowed(TRANSIENT_ERROR_STATUS_CODES),
        }
    }
}

impl DefaultRetryClassifier {
    /// Create the default classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat the given status codes as retryable server errors instead of 500, 502, 503 and 504.
    pub fn with_retryable_status_codes(
        mut self,
        retryable_status_codes: impl Into<Cow<'static, [u16]>>,
    ) -> Self {
        self.retryable_status_codes = retryable_status_codes.into();
        self
    }

    fn classify_service_error(&self, status: u16, code: Option<&str>) -> RetryAction {
        if status == TOO_MANY_REQUESTS {
            return RetryAction::Retry(ErrorKind::ThrottlingError);
        }
        if let Some(code) = code {
            if self.throttling_codes.contains(&code) {
                return RetryAction::Retry(ErrorKind::ThrottlingError);
            }
            if self.transient_codes.contains(&code) {
                return RetryAction::Retry(ErrorKind::TransientError);
            }
        }
        if self.retryable_status_codes.contains(&status) {
            return RetryAction::Retry(ErrorKind::ServerError);
        }
        RetryAction::NoRetry
    }
}

impl ClassifyRetry for DefaultRetryClassifier {
    fn classify_retry(&self, failure: &AttemptFailure<'_>) -> RetryAction {
        match failure {
            AttemptFailure::Connector(err) => {
                if err.is_io() || err.is_timeout() {
                    RetryAction::Retry(ErrorKind::TransientError)
                } else {
                    err.is_other()
                        .map(RetryAction::Retry)
                        .unwrap_or(RetryAction::NoRetry)
                }
            }
            AttemptFailure::Timeout | AttemptFailure::Response { .. } => {
                RetryAction::Retry(ErrorKind::TransientError)
            }
            AttemptFailure::Service { status, meta } => {
                self.classify_service_error(*status, meta.code())
            }
            _ => RetryAction::NoRetry,
        }
    }

    fn name(&self) -> &'static str {
        "Default"
    }
}
