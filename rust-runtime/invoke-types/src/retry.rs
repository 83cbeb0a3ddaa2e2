/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! This module defines types that describe when to retry given a response.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Type of error that occurred when making a request.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// This is a connection level error such as a socket timeout, socket connect error,
    /// tls negotiation timeout etc...
    ///
    /// Typically these should never be applied for non-idempotent request types
    /// since in this scenario, it's impossible to know whether the operation had
    /// a side effect on the server.
    ///
    /// TransientErrors are not currently modeled. They are determined based on specific provider
    /// level errors & response status code.
    TransientError,

    /// An error where the server explicitly told the client to back off, such as a 429 HTTP error.
    ThrottlingError,

    /// Server error that isn't explicitly throttling but is considered by the client
    /// to be something that should be retried.
    ServerError,

    /// Doesn't count against any budgets. This could be something like a 401 challenge in Http.
    ClientError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientError => write!(f, "transient error"),
            Self::ThrottlingError => write!(f, "throttling error"),
            Self::ServerError => write!(f, "server error"),
            Self::ClientError => write!(f, "client error"),
        }
    }
}

/// Trait that provides an `ErrorKind` and an error code.
pub trait ProvideErrorKind {
    /// Returns the `ErrorKind` when the error is modeled as retryable
    ///
    /// If the error kind cannot be determined (e.g. the error is unmodeled and the error kind
    /// depends on an HTTP status code), return `None`.
    fn retryable_error_kind(&self) -> Option<ErrorKind>;

    /// Returns the `code` for this error if one exists
    fn code(&self) -> Option<&str>;
}

/// Named retry behavior that a client can be configured with.
///
/// A mode selects a preset of the standard retry strategy. A mode is the lowest-precedence
/// way of choosing retry behavior: an explicit strategy or strategy customizer wins over it.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RetryMode {
    /// The default retry behavior: three attempts with exponential backoff and a retry quota.
    Standard,

    /// The behavior of older clients: four attempts, with throttled attempts not counted
    /// against the retry quota.
    Legacy,
}

impl RetryMode {
    /// Returns the number of attempts, including the initial one, that the mode allows.
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryMode::Standard => 3,
            RetryMode::Legacy => 4,
        }
    }
}

impl fmt::Display for RetryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryMode::Standard => f.write_str("standard"),
            RetryMode::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for RetryMode {
    type Err = RetryModeParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let string = string.trim();
        // eq_ignore_ascii_case is OK here because the only strings we need to check for are ASCII
        if string.eq_ignore_ascii_case("standard") {
            Ok(RetryMode::Standard)
        } else if string.eq_ignore_ascii_case("legacy") {
            Ok(RetryMode::Legacy)
        } else {
            Err(RetryModeParseError::new(string))
        }
    }
}

/// Failure to parse a `RetryMode` from string.
#[derive(Debug)]
pub struct RetryModeParseError {
    message: String,
}

impl RetryModeParseError {
    pub(super) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RetryModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error parsing string '{}' as RetryMode, valid options are: \"standard\", \"legacy\"",
            self.message
        )
    }
}

impl std::error::Error for RetryModeParseError {}

/// Retry configuration for the standard retry strategy.
///
/// ```rust
/// use invoke_types::retry::{RetryConfig, RetryMode};
/// use std::time::Duration;
///
/// let config = RetryConfig::for_mode(RetryMode::Standard)
///     .with_max_attempts(5)
///     .with_initial_backoff(Duration::from_millis(50));
/// assert_eq!(config.max_attempts(), 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    mode: RetryMode,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    use_retry_quota: bool,
}

impl RetryConfig {
    /// Creates the preset configuration of a retry mode.
    pub fn for_mode(mode: RetryMode) -> Self {
        Self {
            mode,
            max_attempts: mode.max_attempts(),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(20),
            use_retry_quota: true,
        }
    }

    /// Creates the default standard retry configuration.
    pub fn standard() -> Self {
        Self::for_mode(RetryMode::Standard)
    }

    /// Creates a configuration that never retries.
    pub fn disabled() -> Self {
        Self::standard().with_max_attempts(1)
    }

    /// Set the number of attempts, including the first one. Values below one are treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.set_max_attempts(max_attempts);
        self
    }

    /// Set the number of attempts, including the first one. Values below one are treated as one.
    pub fn set_max_attempts(&mut self, max_attempts: u32) -> &mut Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base of the exponential backoff.
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.set_initial_backoff(initial_backoff);
        self
    }

    /// Set the base of the exponential backoff.
    pub fn set_initial_backoff(&mut self, initial_backoff: Duration) -> &mut Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Set the upper bound of any single backoff.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.set_max_backoff(max_backoff);
        self
    }

    /// Set the upper bound of any single backoff.
    pub fn set_max_backoff(&mut self, max_backoff: Duration) -> &mut Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Enable or disable the retry quota (token bucket) that limits retries when a service is
    /// failing persistently.
    pub fn with_retry_quota(mut self, use_retry_quota: bool) -> Self {
        self.set_retry_quota(use_retry_quota);
        self
    }

    /// Enable or disable the retry quota.
    pub fn set_retry_quota(&mut self, use_retry_quota: bool) -> &mut Self {
        self.use_retry_quota = use_retry_quota;
        self
    }

    /// The mode this configuration was derived from.
    pub fn mode(&self) -> RetryMode {
        self.mode
    }

    /// Number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base of the exponential backoff.
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Upper bound of any single backoff.
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Whether retries draw from a retry quota.
    pub fn use_retry_quota(&self) -> bool {
        self.use_retry_quota
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::standard()
    }
}
