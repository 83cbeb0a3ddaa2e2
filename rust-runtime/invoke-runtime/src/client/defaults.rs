/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Base-level defaults filled into a client configuration.
//!
//! These are the defaults of last resort. A generated client, or a plugin, can replace any of
//! them before a call is made.

use crate::client::retries::classifiers::DefaultRetryClassifier;
use crate::client::retries::strategy::StandardRetryStrategy;
use invoke_async::rt::sleep::default_async_sleep;
use invoke_runtime_api::client::config::{BuildError, ClientConfiguration};
use invoke_runtime_api::client::retries::{SharedRetryClassifier, SharedRetryStrategy};
use invoke_types::retry::RetryConfig;

/// Fill in whatever `config` leaves unset.
///
/// - the [`DefaultRetryClassifier`]
/// - the default sleep implementation of the enabled async runtime
/// - a [`StandardRetryStrategy`] built from the configured [`RetryConfig`], or from the
///   standard preset when none is configured
///
/// A configuration that already has all of these is returned as-is.
pub fn apply_defaults(config: ClientConfiguration) -> Result<ClientConfiguration, BuildError> {
    if config.retry_classifier().is_some()
        && config.sleep_impl().is_some()
        && config.retry_strategy().is_some()
    {
        return Ok(config);
    }

    let mut builder = config.to_builder();
    if config.retry_classifier().is_none() {
        builder.set_retry_classifier(Some(SharedRetryClassifier::new(
            DefaultRetryClassifier::new(),
        )));
    }
    if config.sleep_impl().is_none() {
        builder.set_sleep_impl(default_async_sleep());
    }
    if config.retry_strategy().is_none() {
        let retry_config = config
            .retry_config()
            .cloned()
            .unwrap_or_else(default_retry_config);
        tracing::trace!(?retry_config, "materializing the standard retry strategy");
        builder = builder.resolved_retry_strategy(SharedRetryStrategy::new(
            StandardRetryStrategy::new(retry_config),
        ));
    }
    builder.build()
}

/// The retry configuration a client uses when it does not configure one.
pub fn default_retry_config() -> RetryConfig {
    RetryConfig::standard()
}
