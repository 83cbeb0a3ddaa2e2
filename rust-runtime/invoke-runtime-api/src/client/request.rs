/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Per-request override configuration.
//!
//! Requests are immutable. Attaching an override produces a new request value through
//! [`SdkRequest::with_override_configuration`]; the original is left untouched.

use crate::client::auth::SharedSigner;
use crate::client::config::{ClientConfigurationView, TimeoutConfig};
use crate::client::metrics::SharedMetricPublisher;
use crate::client::plugin::{Plugin, SharedPlugin};
use crate::client::retries::SharedRetryStrategy;
use crate::shared::IntoShared;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use invoke_types::retry::RetryMode;

/// Configuration attached to a single request that overrides the client's configuration.
#[derive(Clone, Debug, Default)]
pub struct RequestOverrideConfiguration {
    plugins: Vec<SharedPlugin>,
    signer: Option<SharedSigner>,
    metric_publishers: Vec<SharedMetricPublisher>,
    headers: HeaderMap,
    timeout_config: TimeoutConfig,
}

impl RequestOverrideConfiguration {
    /// Creates a new builder.
    pub fn builder() -> RequestOverrideConfigurationBuilder {
        RequestOverrideConfigurationBuilder::default()
    }

    /// Creates a builder holding a copy of this configuration.
    pub fn to_builder(&self) -> RequestOverrideConfigurationBuilder {
        RequestOverrideConfigurationBuilder {
            inner: self.clone(),
        }
    }

    /// Plugins to run against the client configuration, in order.
    pub fn plugins(&self) -> &[SharedPlugin] {
        &self.plugins
    }

    /// Signer to use instead of the client's signer.
    pub fn signer(&self) -> Option<&SharedSigner> {
        self.signer.as_ref()
    }

    /// Metric publishers to use instead of the client's publishers.
    pub fn metric_publishers(&self) -> &[SharedMetricPublisher] {
        &self.metric_publishers
    }

    /// Headers added to every attempt, replacing marshalled headers of the same name.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Timeouts replacing the client's for this call.
    pub fn timeout_config(&self) -> &TimeoutConfig {
        &self.timeout_config
    }
}

/// Builder for [`RequestOverrideConfiguration`].
#[derive(Clone, Debug, Default)]
pub struct RequestOverrideConfigurationBuilder {
    inner: RequestOverrideConfiguration,
}

impl RequestOverrideConfigurationBuilder {
    /// Add a plugin. Plugins run in the order they are added.
    pub fn plugin(mut self, plugin: impl IntoShared<SharedPlugin>) -> Self {
        self.inner.plugins.push(plugin.into_shared());
        self
    }

    /// Use `retry_strategy` for this call.
    ///
    /// This is shorthand for a plugin that sets the retry strategy.
    pub fn retry_strategy(self, retry_strategy: impl IntoShared<SharedRetryStrategy>) -> Self {
        self.plugin(RetryOverridePlugin::Strategy(retry_strategy.into_shared()))
    }

    /// Use the preset retry behavior of `mode` for this call.
    ///
    /// This is shorthand for a plugin that sets the retry mode.
    pub fn retry_mode(self, mode: RetryMode) -> Self {
        self.plugin(RetryOverridePlugin::Mode(mode))
    }

    /// Sign this call with `signer`.
    pub fn signer(mut self, signer: impl IntoShared<SharedSigner>) -> Self {
        self.inner.signer = Some(signer.into_shared());
        self
    }

    /// Publish this call's metrics to `publisher` instead of the client's publishers.
    pub fn metric_publisher(mut self, publisher: impl IntoShared<SharedMetricPublisher>) -> Self {
        self.inner.metric_publishers.push(publisher.into_shared());
        self
    }

    /// Add a header to every attempt.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.inner.headers.append(name, value);
        self
    }

    /// Replace the whole-call timeout for this call.
    pub fn operation_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.inner
            .timeout_config
            .set_operation_timeout(Some(timeout));
        self
    }

    /// Replace the per-attempt timeout for this call.
    pub fn operation_attempt_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.inner
            .timeout_config
            .set_operation_attempt_timeout(Some(timeout));
        self
    }

    /// Builds the override configuration.
    pub fn build(self) -> RequestOverrideConfiguration {
        self.inner
    }
}

/// Plugin registered by the retry shorthands on [`RequestOverrideConfigurationBuilder`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum RetryOverridePlugin {
    /// Use an explicit retry strategy.
    Strategy(SharedRetryStrategy),
    /// Use the preset of a retry mode.
    Mode(RetryMode),
}

impl Plugin for RetryOverridePlugin {
    fn configure_client(&self, config: &mut ClientConfigurationView<'_>) {
        match self {
            RetryOverridePlugin::Strategy(strategy) => {
                config.set_retry_strategy(strategy.clone());
            }
            RetryOverridePlugin::Mode(mode) => {
                config.set_retry_mode(*mode);
            }
        }
    }
}

/// A modeled request that can carry a [`RequestOverrideConfiguration`].
pub trait SdkRequest: Sized {
    /// The override configuration attached to this request, if any.
    fn override_configuration(&self) -> Option<&RequestOverrideConfiguration>;

    /// Returns a copy of this request carrying `config` instead of its current override.
    fn with_override_configuration(self, config: RequestOverrideConfiguration) -> Self;
}

/// Attach `signer` to `request` unless the request already carries a signer.
///
/// The request is returned unchanged when it already has a signer, so an explicitly chosen
/// signer is never replaced. Otherwise a new override configuration is derived from the
/// existing one with only the signer changed.
pub fn apply_signer_override<R: SdkRequest>(request: R, signer: &SharedSigner) -> R {
    if request
        .override_configuration()
        .and_then(RequestOverrideConfiguration::signer)
        .is_some()
    {
        return request;
    }
    let config = request
        .override_configuration()
        .map(RequestOverrideConfiguration::to_builder)
        .unwrap_or_default()
        .signer(signer.clone())
        .build();
    request.with_override_configuration(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::box_error::BoxError;
    use crate::client::auth::{Signer, SigningContext};
    use crate::client::http::HttpRequest;

    #[derive(Debug)]
    struct NamedSigner;

    impl Signer for NamedSigner {
        fn sign(&self, _request: &mut HttpRequest, _context: &SigningContext<'_>) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Input {
        override_config: Option<RequestOverrideConfiguration>,
    }

    impl SdkRequest for Input {
        fn override_configuration(&self) -> Option<&RequestOverrideConfiguration> {
            self.override_config.as_ref()
        }

        fn with_override_configuration(self, config: RequestOverrideConfiguration) -> Self {
            Self {
                override_config: Some(config),
            }
        }
    }

    #[test]
    fn signer_override_is_attached_when_absent() {
        let signer = SharedSigner::new(NamedSigner);
        let request = apply_signer_override(Input::default(), &signer);
        let attached = request.override_configuration().unwrap().signer().unwrap();
        assert!(attached.ptr_eq(&signer));
    }

    #[test]
    fn signer_override_keeps_explicit_signer() {
        let explicit = SharedSigner::new(NamedSigner);
        let request = Input::default().with_override_configuration(
            RequestOverrideConfiguration::builder()
                .signer(explicit.clone())
                .build(),
        );
        let request = apply_signer_override(request, &SharedSigner::new(NamedSigner));
        let kept = request.override_configuration().unwrap().signer().unwrap();
        assert!(kept.ptr_eq(&explicit));
    }

    #[test]
    fn signer_override_preserves_other_fields() {
        let original = RequestOverrideConfiguration::builder()
            .retry_mode(RetryMode::Legacy)
            .header(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_static("abc"),
            )
            .build();
        let request = Input::default().with_override_configuration(original.clone());
        let request = apply_signer_override(request, &SharedSigner::new(NamedSigner));
        let derived = request.override_configuration().unwrap();
        assert_eq!(derived.plugins().len(), 1);
        assert_eq!(derived.headers().get("x-trace").unwrap(), "abc");
        // the value the override was derived from is untouched
        assert!(original.signer().is_none());
    }

    #[test]
    fn retry_shorthands_register_plugins() {
        let config = RequestOverrideConfiguration::builder()
            .retry_mode(RetryMode::Standard)
            .build();
        assert_eq!(config.plugins().len(), 1);
    }
}
