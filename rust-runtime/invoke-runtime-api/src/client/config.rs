/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::auth::{CredentialType, SharedSigner};
use crate::client::http::{SharedAsyncHttpClient, SharedHttpClient};
use crate::client::metrics::SharedMetricPublisher;
use crate::client::retries::{SharedRetryClassifier, SharedRetryConfigurator, SharedRetryStrategy};
use crate::shared::IntoShared;
use http::Uri;
use invoke_async::rt::sleep::SharedAsyncSleep;
use invoke_types::retry::{RetryConfig, RetryMode};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A client configuration snapshot shared between every call a client makes.
pub type SharedClientConfiguration = Arc<ClientConfiguration>;

/// Timeouts enforced by the async engine.
///
/// Both timeouts are disabled by default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimeoutConfig {
    operation_timeout: Option<Duration>,
    operation_attempt_timeout: Option<Duration>,
}

impl TimeoutConfig {
    /// A configuration with no timeouts.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Limit the duration of the whole call, including retries and backoff.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Limit the duration of the whole call, including retries and backoff.
    pub fn set_operation_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.operation_timeout = timeout;
        self
    }

    /// Limit the duration of each attempt.
    pub fn with_operation_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.operation_attempt_timeout = Some(timeout);
        self
    }

    /// Limit the duration of each attempt.
    pub fn set_operation_attempt_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.operation_attempt_timeout = timeout;
        self
    }

    /// The whole-call timeout.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// The per-attempt timeout.
    pub fn operation_attempt_timeout(&self) -> Option<Duration> {
        self.operation_attempt_timeout
    }

    /// Returns a copy where every timeout set in `other` replaces the one in `self`.
    pub fn overridden_by(self, other: &TimeoutConfig) -> Self {
        Self {
            operation_timeout: other.operation_timeout.or(self.operation_timeout),
            operation_attempt_timeout: other
                .operation_attempt_timeout
                .or(self.operation_attempt_timeout),
        }
    }
}

/// Immutable snapshot of everything the engine needs to make calls to one service.
///
/// A snapshot is never changed once built. Per-call customization produces a new snapshot
/// through [`ClientConfiguration::to_builder`].
#[derive(Clone, Debug)]
pub struct ClientConfiguration {
    service_id: String,
    endpoint: Uri,
    credential_type: CredentialType,
    signer: Option<SharedSigner>,
    signer_overridden: bool,
    retry_strategy: Option<SharedRetryStrategy>,
    retry_config: Option<RetryConfig>,
    retry_classifier: Option<SharedRetryClassifier>,
    metric_publishers: Vec<SharedMetricPublisher>,
    http_client: Option<SharedHttpClient>,
    async_http_client: Option<SharedAsyncHttpClient>,
    sleep_impl: Option<SharedAsyncSleep>,
    timeout_config: TimeoutConfig,
    http2_enabled: bool,
}

impl ClientConfiguration {
    /// Creates a new builder.
    pub fn builder() -> ClientConfigurationBuilder {
        ClientConfigurationBuilder::default()
    }

    /// Creates a builder holding a copy of this snapshot.
    pub fn to_builder(&self) -> ClientConfigurationBuilder {
        ClientConfigurationBuilder {
            service_id: Some(self.service_id.clone()),
            endpoint: Some(self.endpoint.clone()),
            credential_type: self.credential_type,
            signer: self.signer.clone(),
            signer_overridden: self.signer_overridden,
            retry_strategy: self.retry_strategy.clone(),
            retry_config: self.retry_config.clone(),
            retry_classifier: self.retry_classifier.clone(),
            metric_publishers: self.metric_publishers.clone(),
            http_client: self.http_client.clone(),
            async_http_client: self.async_http_client.clone(),
            sleep_impl: self.sleep_impl.clone(),
            timeout_config: self.timeout_config,
            http2_enabled: self.http2_enabled,
            configured_retry_mode: None,
            configured_retry_strategy: None,
            configured_retry_configurator: None,
        }
    }

    /// Name of the service, as used in metrics and signing.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Base URI requests are sent to.
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// The kind of credentials requests are authenticated with.
    pub fn credential_type(&self) -> CredentialType {
        self.credential_type
    }

    /// The client's signer.
    pub fn signer(&self) -> Option<&SharedSigner> {
        self.signer.as_ref()
    }

    /// Returns true if the signer was explicitly chosen by the user rather than defaulted.
    pub fn signer_overridden(&self) -> bool {
        self.signer_overridden
    }

    /// The retry strategy, once one has been materialized.
    pub fn retry_strategy(&self) -> Option<&SharedRetryStrategy> {
        self.retry_strategy.as_ref()
    }

    /// The retry configuration a standard strategy should be built from when no explicit
    /// strategy is set.
    pub fn retry_config(&self) -> Option<&RetryConfig> {
        self.retry_config.as_ref()
    }

    /// Classifier used to decide whether failed attempts are retryable.
    pub fn retry_classifier(&self) -> Option<&SharedRetryClassifier> {
        self.retry_classifier.as_ref()
    }

    /// Metric publishers for calls that do not override them.
    pub fn metric_publishers(&self) -> &[SharedMetricPublisher] {
        &self.metric_publishers
    }

    /// Blocking transport.
    pub fn http_client(&self) -> Option<&SharedHttpClient> {
        self.http_client.as_ref()
    }

    /// Non-blocking transport.
    pub fn async_http_client(&self) -> Option<&SharedAsyncHttpClient> {
        self.async_http_client.as_ref()
    }

    /// Sleep implementation for backoff and timeouts in async calls.
    pub fn sleep_impl(&self) -> Option<&SharedAsyncSleep> {
        self.sleep_impl.as_ref()
    }

    /// Timeouts enforced by async calls.
    pub fn timeout_config(&self) -> &TimeoutConfig {
        &self.timeout_config
    }

    /// Returns true if the transport speaks HTTP/2. HTTP/2 has no chunked transfer encoding.
    pub fn http2_enabled(&self) -> bool {
        self.http2_enabled
    }
}

/// Error returned when a [`ClientConfiguration`] cannot be built.
#[derive(Debug)]
pub struct BuildError {
    field: &'static str,
}

impl BuildError {
    fn missing_field(field: &'static str) -> Self {
        Self { field }
    }

    /// The field that was not set.
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` was not specified but it is required when building ClientConfiguration", self.field)
    }
}

impl Error for BuildError {}

/// Builder for [`ClientConfiguration`].
///
/// Retry behavior can be chosen three ways: a [`RetryMode`], an explicit retry strategy, or a
/// configurator that customizes the [`RetryConfig`]. These are held as "configured" settings
/// until [`build`](ClientConfigurationBuilder::build) reconciles them. From highest
/// precedence to lowest:
/// 1. a retry configurator, applied on top of the configured (or inherited) mode's preset
/// 2. an explicit retry strategy
/// 3. a retry mode
/// 4. whatever the builder already held
#[derive(Clone, Debug, Default)]
pub struct ClientConfigurationBuilder {
    service_id: Option<String>,
    endpoint: Option<Uri>,
    credential_type: CredentialType,
    signer: Option<SharedSigner>,
    signer_overridden: bool,
    retry_strategy: Option<SharedRetryStrategy>,
    retry_config: Option<RetryConfig>,
    retry_classifier: Option<SharedRetryClassifier>,
    metric_publishers: Vec<SharedMetricPublisher>,
    http_client: Option<SharedHttpClient>,
    async_http_client: Option<SharedAsyncHttpClient>,
    sleep_impl: Option<SharedAsyncSleep>,
    timeout_config: TimeoutConfig,
    http2_enabled: bool,

    configured_retry_mode: Option<RetryMode>,
    configured_retry_strategy: Option<SharedRetryStrategy>,
    configured_retry_configurator: Option<SharedRetryConfigurator>,
}

impl ClientConfigurationBuilder {
    /// Set the service name.
    pub fn service_id(mut self, service_id: impl Into<String>) -> Self {
        self.set_service_id(service_id);
        self
    }

    /// Set the service name.
    pub fn set_service_id(&mut self, service_id: impl Into<String>) -> &mut Self {
        self.service_id = Some(service_id.into());
        self
    }

    /// Set the base URI requests are sent to.
    pub fn endpoint(mut self, endpoint: Uri) -> Self {
        self.set_endpoint(endpoint);
        self
    }

    /// Set the base URI requests are sent to.
    pub fn set_endpoint(&mut self, endpoint: Uri) -> &mut Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the kind of credentials requests are authenticated with.
    pub fn credential_type(mut self, credential_type: CredentialType) -> Self {
        self.set_credential_type(credential_type);
        self
    }

    /// Set the kind of credentials requests are authenticated with.
    pub fn set_credential_type(&mut self, credential_type: CredentialType) -> &mut Self {
        self.credential_type = credential_type;
        self
    }

    /// Set the default signer for the service.
    pub fn signer(mut self, signer: impl IntoShared<SharedSigner>) -> Self {
        self.set_signer(Some(signer.into_shared()));
        self
    }

    /// Set the default signer for the service.
    pub fn set_signer(&mut self, signer: Option<SharedSigner>) -> &mut Self {
        self.signer = signer;
        self
    }

    /// Set a signer chosen by the user, replacing the service's default signer.
    ///
    /// Operations that would otherwise attach their own signer leave an overridden signer alone.
    pub fn signer_override(mut self, signer: impl IntoShared<SharedSigner>) -> Self {
        self.set_signer_override(signer.into_shared());
        self
    }

    /// Set a signer chosen by the user, replacing the service's default signer.
    pub fn set_signer_override(&mut self, signer: SharedSigner) -> &mut Self {
        self.signer = Some(signer);
        self.signer_overridden = true;
        self
    }

    /// Choose retry behavior by mode.
    pub fn retry_mode(mut self, mode: RetryMode) -> Self {
        self.set_retry_mode(Some(mode));
        self
    }

    /// Choose retry behavior by mode.
    pub fn set_retry_mode(&mut self, mode: Option<RetryMode>) -> &mut Self {
        self.configured_retry_mode = mode;
        self
    }

    /// Use an explicit retry strategy.
    pub fn retry_strategy(mut self, retry_strategy: impl IntoShared<SharedRetryStrategy>) -> Self {
        self.set_retry_strategy(Some(retry_strategy.into_shared()));
        self
    }

    /// Use an explicit retry strategy.
    pub fn set_retry_strategy(&mut self, retry_strategy: Option<SharedRetryStrategy>) -> &mut Self {
        self.configured_retry_strategy = retry_strategy;
        self
    }

    /// Set the strategy built from the current retry configuration.
    ///
    /// Unlike [`retry_strategy`](Self::retry_strategy) this is not a configured setting: it
    /// takes effect as-is and keeps the retry configuration it was built from.
    pub fn resolved_retry_strategy(mut self, retry_strategy: SharedRetryStrategy) -> Self {
        self.retry_strategy = Some(retry_strategy);
        self
    }

    /// Customize the retry configuration the standard strategy is built from.
    pub fn retry_configurator(mut self, configurator: SharedRetryConfigurator) -> Self {
        self.set_retry_configurator(Some(configurator));
        self
    }

    /// Customize the retry configuration the standard strategy is built from.
    pub fn set_retry_configurator(
        &mut self,
        configurator: Option<SharedRetryConfigurator>,
    ) -> &mut Self {
        self.configured_retry_configurator = configurator;
        self
    }

    /// Set the classifier used to decide whether failed attempts are retryable.
    pub fn retry_classifier(mut self, classifier: impl IntoShared<SharedRetryClassifier>) -> Self {
        self.set_retry_classifier(Some(classifier.into_shared()));
        self
    }

    /// Set the classifier used to decide whether failed attempts are retryable.
    pub fn set_retry_classifier(&mut self, classifier: Option<SharedRetryClassifier>) -> &mut Self {
        self.retry_classifier = classifier;
        self
    }

    /// Add a metric publisher.
    pub fn metric_publisher(mut self, publisher: impl IntoShared<SharedMetricPublisher>) -> Self {
        self.push_metric_publisher(publisher.into_shared());
        self
    }

    /// Add a metric publisher.
    pub fn push_metric_publisher(&mut self, publisher: SharedMetricPublisher) -> &mut Self {
        self.metric_publishers.push(publisher);
        self
    }

    /// Replace every metric publisher.
    pub fn set_metric_publishers(&mut self, publishers: Vec<SharedMetricPublisher>) -> &mut Self {
        self.metric_publishers = publishers;
        self
    }

    /// Set the blocking transport.
    pub fn http_client(mut self, http_client: impl IntoShared<SharedHttpClient>) -> Self {
        self.set_http_client(Some(http_client.into_shared()));
        self
    }

    /// Set the blocking transport.
    pub fn set_http_client(&mut self, http_client: Option<SharedHttpClient>) -> &mut Self {
        self.http_client = http_client;
        self
    }

    /// Set the non-blocking transport.
    pub fn async_http_client(
        mut self,
        http_client: impl IntoShared<SharedAsyncHttpClient>,
    ) -> Self {
        self.set_async_http_client(Some(http_client.into_shared()));
        self
    }

    /// Set the non-blocking transport.
    pub fn set_async_http_client(
        &mut self,
        http_client: Option<SharedAsyncHttpClient>,
    ) -> &mut Self {
        self.async_http_client = http_client;
        self
    }

    /// Set the sleep implementation used for backoff and timeouts.
    pub fn sleep_impl(mut self, sleep_impl: SharedAsyncSleep) -> Self {
        self.set_sleep_impl(Some(sleep_impl));
        self
    }

    /// Set the sleep implementation used for backoff and timeouts.
    pub fn set_sleep_impl(&mut self, sleep_impl: Option<SharedAsyncSleep>) -> &mut Self {
        self.sleep_impl = sleep_impl;
        self
    }

    /// Set the timeouts enforced by async calls.
    pub fn timeout_config(mut self, timeout_config: TimeoutConfig) -> Self {
        self.set_timeout_config(timeout_config);
        self
    }

    /// Set the timeouts enforced by async calls.
    pub fn set_timeout_config(&mut self, timeout_config: TimeoutConfig) -> &mut Self {
        self.timeout_config = timeout_config;
        self
    }

    /// Declare whether the transport speaks HTTP/2.
    pub fn http2_enabled(mut self, enabled: bool) -> Self {
        self.set_http2_enabled(enabled);
        self
    }

    /// Declare whether the transport speaks HTTP/2.
    pub fn set_http2_enabled(&mut self, enabled: bool) -> &mut Self {
        self.http2_enabled = enabled;
        self
    }

    /// The retry mode set on this builder and not yet reconciled.
    pub fn configured_retry_mode(&self) -> Option<RetryMode> {
        self.configured_retry_mode
    }

    /// The retry strategy set on this builder and not yet reconciled.
    pub fn configured_retry_strategy(&self) -> Option<&SharedRetryStrategy> {
        self.configured_retry_strategy.as_ref()
    }

    /// The retry configurator set on this builder and not yet reconciled.
    pub fn configured_retry_configurator(&self) -> Option<&SharedRetryConfigurator> {
        self.configured_retry_configurator.as_ref()
    }

    /// Apply the configured retry settings by precedence, then clear them.
    fn reconcile_retry_settings(&mut self) {
        let mode = self.configured_retry_mode.take();
        let strategy = self.configured_retry_strategy.take();
        let configurator = self.configured_retry_configurator.take();

        if let Some(configurator) = configurator {
            let base_mode = mode
                .or_else(|| self.retry_config.as_ref().map(RetryConfig::mode))
                .unwrap_or(RetryMode::Standard);
            let mut config = RetryConfig::for_mode(base_mode);
            configurator.configure(&mut config);
            tracing::trace!(retry_config = ?config, "retry configurator applied");
            self.retry_config = Some(config);
            self.retry_strategy = None;
        } else if let Some(strategy) = strategy {
            self.retry_config = None;
            self.retry_strategy = Some(strategy);
        } else if let Some(mode) = mode {
            self.retry_config = Some(RetryConfig::for_mode(mode));
            self.retry_strategy = None;
        }
    }

    /// Reconcile retry settings and build an immutable snapshot.
    pub fn build(mut self) -> Result<ClientConfiguration, BuildError> {
        self.reconcile_retry_settings();
        Ok(ClientConfiguration {
            service_id: self
                .service_id
                .ok_or_else(|| BuildError::missing_field("service_id"))?,
            endpoint: self
                .endpoint
                .ok_or_else(|| BuildError::missing_field("endpoint"))?,
            credential_type: self.credential_type,
            signer: self.signer,
            signer_overridden: self.signer_overridden,
            retry_strategy: self.retry_strategy,
            retry_config: self.retry_config,
            retry_classifier: self.retry_classifier,
            metric_publishers: self.metric_publishers,
            http_client: self.http_client,
            async_http_client: self.async_http_client,
            sleep_impl: self.sleep_impl,
            timeout_config: self.timeout_config,
            http2_enabled: self.http2_enabled,
        })
    }
}

/// The part of a [`ClientConfigurationBuilder`] that plugins may change.
///
/// Options can be added or replaced, never removed: there is no way to unset the endpoint,
/// the transports, or the service name through a view.
#[derive(Debug)]
pub struct ClientConfigurationView<'a> {
    builder: &'a mut ClientConfigurationBuilder,
}

impl<'a> ClientConfigurationView<'a> {
    /// Creates a view over `builder`.
    pub fn new(builder: &'a mut ClientConfigurationBuilder) -> Self {
        Self { builder }
    }

    /// Name of the service.
    pub fn service_id(&self) -> Option<&str> {
        self.builder.service_id.as_deref()
    }

    /// Base URI requests are sent to.
    pub fn endpoint(&self) -> Option<&Uri> {
        self.builder.endpoint.as_ref()
    }

    /// Replace the endpoint.
    pub fn set_endpoint(&mut self, endpoint: Uri) -> &mut Self {
        self.builder.set_endpoint(endpoint);
        self
    }

    /// Replace the signer. A signer set by a plugin counts as chosen by the user.
    pub fn set_signer(&mut self, signer: impl IntoShared<SharedSigner>) -> &mut Self {
        self.builder.set_signer_override(signer.into_shared());
        self
    }

    /// Replace the credential type.
    pub fn set_credential_type(&mut self, credential_type: CredentialType) -> &mut Self {
        self.builder.set_credential_type(credential_type);
        self
    }

    /// Choose retry behavior by mode.
    pub fn set_retry_mode(&mut self, mode: RetryMode) -> &mut Self {
        self.builder.set_retry_mode(Some(mode));
        self
    }

    /// Use an explicit retry strategy.
    pub fn set_retry_strategy(
        &mut self,
        retry_strategy: impl IntoShared<SharedRetryStrategy>,
    ) -> &mut Self {
        self.builder
            .set_retry_strategy(Some(retry_strategy.into_shared()));
        self
    }

    /// Customize the retry configuration.
    pub fn set_retry_configurator(&mut self, configurator: SharedRetryConfigurator) -> &mut Self {
        self.builder.set_retry_configurator(Some(configurator));
        self
    }

    /// Replace the retry classifier.
    pub fn set_retry_classifier(
        &mut self,
        classifier: impl IntoShared<SharedRetryClassifier>,
    ) -> &mut Self {
        self.builder
            .set_retry_classifier(Some(classifier.into_shared()));
        self
    }

    /// Add a metric publisher.
    pub fn add_metric_publisher(
        &mut self,
        publisher: impl IntoShared<SharedMetricPublisher>,
    ) -> &mut Self {
        self.builder.push_metric_publisher(publisher.into_shared());
        self
    }

    /// Metric publishers configured so far.
    pub fn metric_publishers(&self) -> &[SharedMetricPublisher] {
        &self.builder.metric_publishers
    }

    /// Replace the blocking transport.
    pub fn set_http_client(&mut self, http_client: impl IntoShared<SharedHttpClient>) -> &mut Self {
        self.builder.set_http_client(Some(http_client.into_shared()));
        self
    }

    /// Replace the non-blocking transport.
    pub fn set_async_http_client(
        &mut self,
        http_client: impl IntoShared<SharedAsyncHttpClient>,
    ) -> &mut Self {
        self.builder
            .set_async_http_client(Some(http_client.into_shared()));
        self
    }

    /// Replace the sleep implementation.
    pub fn set_sleep_impl(&mut self, sleep_impl: SharedAsyncSleep) -> &mut Self {
        self.builder.set_sleep_impl(Some(sleep_impl));
        self
    }

    /// Timeouts enforced by async calls.
    pub fn timeout_config(&self) -> &TimeoutConfig {
        &self.builder.timeout_config
    }

    /// Replace the timeouts enforced by async calls.
    pub fn set_timeout_config(&mut self, timeout_config: TimeoutConfig) -> &mut Self {
        self.builder.set_timeout_config(timeout_config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::box_error::BoxError;
    use crate::client::retries::{RetryAction, RetryState, RetryStrategy, ShouldAttempt};
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct FixedStrategy;

    impl RetryStrategy for FixedStrategy {
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

    fn base() -> ClientConfigurationBuilder {
        ClientConfiguration::builder()
            .service_id("Json Service")
            .endpoint(Uri::from_static("https://example.com"))
    }

    #[test]
    fn missing_endpoint_is_reported() {
        let err = ClientConfiguration::builder()
            .service_id("Json Service")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), "endpoint");
    }

    #[test]
    fn configurator_beats_strategy_and_mode() {
        let config = base()
            .retry_mode(RetryMode::Legacy)
            .retry_strategy(FixedStrategy)
            .retry_configurator(SharedRetryConfigurator::new(|c| {
                c.set_max_attempts(9);
            }))
            .build()
            .unwrap();
        assert!(config.retry_strategy().is_none());
        let retry_config = config.retry_config().expect("configurator applied");
        assert_eq!(retry_config.mode(), RetryMode::Legacy);
        assert_eq!(retry_config.max_attempts(), 9);
    }

    #[test]
    fn strategy_beats_mode() {
        let strategy = SharedRetryStrategy::new(FixedStrategy);
        let config = base()
            .retry_mode(RetryMode::Legacy)
            .retry_strategy(strategy.clone())
            .build()
            .unwrap();
        assert!(config.retry_config().is_none());
        assert!(config.retry_strategy().unwrap().ptr_eq(&strategy));
    }

    #[test]
    fn mode_beats_inherited_default() {
        let inherited = base().retry_strategy(FixedStrategy).build().unwrap();
        let config = inherited
            .to_builder()
            .retry_mode(RetryMode::Legacy)
            .build()
            .unwrap();
        assert!(config.retry_strategy().is_none());
        assert_eq!(config.retry_config().unwrap().max_attempts(), 4);
    }

    #[test]
    fn nothing_configured_inherits() {
        let strategy = SharedRetryStrategy::new(FixedStrategy);
        let inherited = base().retry_strategy(strategy.clone()).build().unwrap();
        let config = inherited.to_builder().build().unwrap();
        assert!(config.retry_strategy().unwrap().ptr_eq(&strategy));
    }

    #[test]
    fn configured_retry_settings_are_cleared() {
        let config = base()
            .retry_mode(RetryMode::Legacy)
            .retry_strategy(FixedStrategy)
            .build()
            .unwrap();
        let builder = config.to_builder();
        assert_eq!(builder.configured_retry_mode(), None);
        assert!(builder.configured_retry_strategy().is_none());
        assert!(builder.configured_retry_configurator().is_none());
    }

    #[test]
    fn view_signer_marks_override() {
        let mut builder = base();
        assert!(!builder.signer_overridden);
        #[derive(Debug)]
        struct NoopSigner;
        impl crate::client::auth::Signer for NoopSigner {
            fn sign(
                &self,
                _request: &mut crate::client::http::HttpRequest,
                _context: &crate::client::auth::SigningContext<'_>,
            ) -> Result<(), BoxError> {
                Ok(())
            }
        }
        ClientConfigurationView::new(&mut builder).set_signer(NoopSigner);
        let config = builder.build().unwrap();
        assert!(config.signer_overridden());
        assert!(config.signer().is_some());
    }

    #[test]
    fn request_timeouts_replace_client_timeouts() {
        let client = TimeoutConfig::disabled()
            .with_operation_timeout(Duration::from_secs(10))
            .with_operation_attempt_timeout(Duration::from_secs(2));
        let request = TimeoutConfig::disabled().with_operation_attempt_timeout(Duration::from_secs(1));
        let merged = client.overridden_by(&request);
        assert_eq!(merged.operation_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(merged.operation_attempt_timeout(), Some(Duration::from_secs(1)));
    }
}
