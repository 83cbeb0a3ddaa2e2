/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The execution engine.
//!
//! Each call goes through the same steps, whether it is made with a [`SyncClientHandler`] or
//! an [`AsyncClientHandler`]:
//!
//! 1. the request's plugins are applied to the client configuration
//! 2. per attempt, the input is marshalled, resolved against the endpoint, and signed
//! 3. the transport sends it, and the response is parsed into an output or an error
//! 4. failed attempts are classified, and the retry strategy decides if another is made
//!
//! The call's metrics are published once it ends, however it ends.

use self::endpoint::apply_endpoint;
use crate::client::metrics::MetricsScope;
use crate::client::override_resolver::{resolve, resolve_metric_publishers};
use crate::client::retries::strategy::NeverRetryStrategy;
use crate::client::transfer::{RequestBodyNotReplayable, TransferMarshaller};
use http::HeaderMap;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::auth::{
    CredentialType, PayloadSigning, SharedSigner, Signer, SigningContext,
};
use invoke_runtime_api::client::config::{SharedClientConfiguration, TimeoutConfig};
use invoke_runtime_api::client::http::{HttpRequest, HttpResponse};
use invoke_runtime_api::client::metrics::core_metrics::{
    BACKOFF_DELAY_DURATION, MARSHALLING_DURATION, RETRY_COUNT,
};
use invoke_runtime_api::client::metrics::MetricCollector;
use invoke_runtime_api::client::request::{
    apply_signer_override, RequestOverrideConfiguration, SdkRequest,
};
use invoke_runtime_api::client::result::SdkError;
use invoke_runtime_api::client::retries::{
    AttemptFailure, ClassifyRetry, RetryAction, RetryState, RetryStrategy, SharedRetryStrategy,
    ShouldAttempt,
};
use invoke_runtime_api::client::ser_de::{HandleErrorResponse, HandleResponse};
use invoke_types::error::display::DisplayErrorContext;
use invoke_types::error::ProvideErrorMetadata;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

mod async_handler;
mod endpoint;
mod host_prefix;
mod http_body;
mod params;
mod sync_handler;

pub use async_handler::{AsyncClientHandler, ExecuteFuture};
pub use host_prefix::{HostLabel, HostPrefix};
pub use params::ClientExecutionParams;
pub use sync_handler::SyncClientHandler;

/// The result of a call.
pub type CallResult<T, E> = Result<T, SdkError<E, HttpResponse>>;

/// Attach the params' signer override to the input, unless `skip`.
///
/// The override never replaces a signer the caller attached to the request.
pub(crate) fn apply_params_signer_override<I: SdkRequest, O, E>(
    mut params: ClientExecutionParams<I, O, E>,
    skip: bool,
) -> ClientExecutionParams<I, O, E> {
    if let Some(signer) = params.signer_override.take() {
        if skip {
            trace!("the client signer was overridden; not applying the operation's signer");
        } else {
            params.input = apply_signer_override(params.input, &signer);
        }
    }
    params
}

/// Resolve what a call runs with, and open its metrics scope.
///
/// The scope is opened even when resolution fails so that the failure is still published.
pub(crate) fn start_call<I: SdkRequest, O, E>(
    base: &SharedClientConfiguration,
    params: &ClientExecutionParams<I, O, E>,
) -> (MetricsScope, Result<ExecutionContext, BoxError>) {
    let request_override = params.input.override_configuration();
    let config = match resolve(base, request_override) {
        Ok(config) => config,
        Err(err) => {
            let scope = MetricsScope::open(
                base.service_id(),
                params.operation_name,
                resolve_metric_publishers(request_override, base),
            );
            return (scope, Err(err.into()));
        }
    };
    let scope = MetricsScope::open(
        config.service_id(),
        params.operation_name,
        resolve_metric_publishers(request_override, &config),
    );
    let context = ExecutionContext::new(config, params);
    (scope, context)
}

/// Per-call state that stays the same across attempts.
#[derive(Debug)]
pub(crate) struct ExecutionContext {
    operation_name: &'static str,
    config: SharedClientConfiguration,
    request_signer: Option<SharedSigner>,
    headers: HeaderMap,
    host_prefix: Option<String>,
    payload_signing: PayloadSigning,
    timeout_config: TimeoutConfig,
}

impl ExecutionContext {
    fn new<I: SdkRequest, O, E>(
        config: SharedClientConfiguration,
        params: &ClientExecutionParams<I, O, E>,
    ) -> Result<Self, BoxError> {
        let request_override = params.input.override_configuration();
        let host_prefix = params
            .host_prefix
            .as_ref()
            .map(|prefix| prefix.render(&params.input))
            .transpose()?;
        let mut timeout_config = *config.timeout_config();
        if let Some(request_override) = request_override {
            timeout_config = timeout_config.overridden_by(request_override.timeout_config());
        }
        Ok(Self {
            operation_name: params.operation_name,
            request_signer: request_override
                .and_then(RequestOverrideConfiguration::signer)
                .cloned(),
            headers: request_override
                .map(|request_override| request_override.headers().clone())
                .unwrap_or_default(),
            host_prefix,
            payload_signing: params.payload_signing(),
            timeout_config,
            config,
        })
    }

    pub(crate) fn config(&self) -> &SharedClientConfiguration {
        &self.config
    }

    pub(crate) fn timeout_config(&self) -> &TimeoutConfig {
        &self.timeout_config
    }

    pub(crate) fn retry_strategy(&self) -> SharedRetryStrategy {
        self.config
            .retry_strategy()
            .cloned()
            .unwrap_or_else(|| SharedRetryStrategy::new(NeverRetryStrategy::new()))
    }

    /// Produce the signed request for the next attempt.
    pub(crate) fn request_for_attempt<I, E>(
        &self,
        marshaller: &mut TransferMarshaller<'_, I>,
        input: &I,
        collector: &MetricCollector,
    ) -> CallResult<HttpRequest, E> {
        let start = Instant::now();
        let marshalled = marshaller.marshall(input);
        collector.report(MARSHALLING_DURATION, start.elapsed());
        let mut request = marshalled.map_err(SdkError::construction_failure)?;

        apply_endpoint(
            &mut request,
            self.config.endpoint(),
            self.host_prefix.as_deref(),
        )
        .map_err(SdkError::construction_failure)?;
        for (name, value) in &self.headers {
            request.headers_mut().insert(name, value.clone());
        }
        self.sign(&mut request)
            .map_err(SdkError::construction_failure)?;
        Ok(request)
    }

    fn sign(&self, request: &mut HttpRequest) -> Result<(), BoxError> {
        let credential_type = self.config.credential_type();
        if credential_type == CredentialType::Anonymous {
            trace!("anonymous credentials; the request is sent unsigned");
            return Ok(());
        }
        let Some(signer) = self.request_signer.as_ref().or(self.config.signer()) else {
            trace!("no signer configured; the request is sent unsigned");
            return Ok(());
        };
        let context = SigningContext::new(
            self.config.service_id(),
            self.operation_name,
            credential_type,
            self.payload_signing,
        );
        signer.sign(request, &context)
    }

    /// Ask the retry strategy whether the first attempt can be made, and after what delay.
    pub(crate) fn initial_attempt<E>(
        &self,
        strategy: &SharedRetryStrategy,
        state: &mut RetryState,
    ) -> CallResult<Duration, E> {
        match strategy.should_attempt_initial_request(state) {
            Ok(ShouldAttempt::Yes) => Ok(Duration::ZERO),
            Ok(ShouldAttempt::YesAfterDelay(delay)) => Ok(delay),
            Ok(ShouldAttempt::No) => Err(SdkError::construction_failure(
                "the retry strategy indicated that an initial request shouldn't be made",
            )),
            Err(err) => Err(SdkError::construction_failure(err)),
        }
    }

    /// Decide what follows the attempt that failed with `err`.
    ///
    /// When the body cannot be sent again only the classification is consulted, so the retry
    /// strategy never takes quota for a retry that cannot be made.
    pub(crate) fn next_attempt<E: ProvideErrorMetadata>(
        &self,
        strategy: &SharedRetryStrategy,
        state: &mut RetryState,
        err: &SdkError<E, HttpResponse>,
        can_replay: bool,
    ) -> NextAttempt {
        // construction failures are never retried
        let Some(failure) = attempt_failure(err) else {
            return NextAttempt::Stop;
        };
        let action = match self.config.retry_classifier() {
            Some(classifier) => classifier.classify_retry(&failure),
            None => RetryAction::NoRetry,
        };
        trace!(%action, "classified attempt failure");
        if !can_replay {
            return match action {
                RetryAction::Retry(_) => NextAttempt::BodyNotReplayable,
                _ => NextAttempt::Stop,
            };
        }
        match strategy.should_attempt_retry(state, &action) {
            Ok(ShouldAttempt::Yes) => NextAttempt::After(Duration::ZERO),
            Ok(ShouldAttempt::YesAfterDelay(delay)) => NextAttempt::After(delay),
            Ok(ShouldAttempt::No) => NextAttempt::Stop,
            Err(strategy_err) => {
                warn!(
                    error = %DisplayErrorContext(strategy_err.as_ref()),
                    "the retry strategy failed; the attempt will not be retried"
                );
                NextAttempt::Stop
            }
        }
    }
}

/// What follows a failed attempt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NextAttempt {
    /// Retry after the delay.
    After(Duration),
    /// The attempt's failure is the call's failure.
    Stop,
    /// A retry was indicated but the request body cannot be sent again.
    BodyNotReplayable,
}

fn attempt_failure<E: ProvideErrorMetadata>(
    err: &SdkError<E, HttpResponse>,
) -> Option<AttemptFailure<'_>> {
    match err {
        SdkError::DispatchFailure(failure) => {
            failure.as_connector_error().map(AttemptFailure::Connector)
        }
        SdkError::TimeoutError(_) => Some(AttemptFailure::Timeout),
        SdkError::ResponseError(context) => Some(AttemptFailure::Response {
            status: context.raw().status().as_u16(),
            source: context.err(),
        }),
        SdkError::ServiceError(context) => Some(AttemptFailure::Service {
            status: context.raw().status().as_u16(),
            meta: context.err().meta(),
        }),
        _ => None,
    }
}

/// True unless the response is a success whose payload streams.
pub(crate) fn response_needs_body<O>(
    response_handler: &dyn HandleResponse<O>,
    response: &HttpResponse,
) -> bool {
    !(response.status().is_success() && response_handler.is_streaming())
}

/// Turn a response into the outcome of its attempt.
///
/// The body of the response must have been read unless it is a streaming success. On success
/// the response is handed back alongside the output, still holding any unread body.
pub(crate) fn handle_response<O, E>(
    response_handler: &dyn HandleResponse<O>,
    error_handler: &dyn HandleErrorResponse<E>,
    response: HttpResponse,
) -> CallResult<(O, HttpResponse), E> {
    if response.status().is_success() {
        match response_handler.handle(&response) {
            Ok(output) => Ok((output, response)),
            Err(err) => Err(SdkError::response_error(err, response)),
        }
    } else {
        debug!(status = %response.status(), "the service responded with an error");
        match error_handler.handle(&response) {
            Ok(err) => Err(SdkError::service_error(err, response)),
            Err(err) => Err(SdkError::response_error(err, response)),
        }
    }
}

/// The failure of a call whose retry was cut short because its body cannot be sent again.
pub(crate) fn not_replayable<E>(previous: SdkError<E, HttpResponse>) -> SdkError<E, HttpResponse>
where
    E: Error + Send + Sync + 'static,
{
    debug!("a retry was indicated but the request body cannot be replayed");
    SdkError::construction_failure(RequestBodyNotReplayable::new(previous))
}

pub(crate) fn report_backoff(collector: &MetricCollector, delay: Duration) {
    debug!(?delay, "backing off before the next attempt");
    collector.report(BACKOFF_DELAY_DURATION, delay);
}

pub(crate) fn report_retry_count(collector: &MetricCollector, state: &RetryState) {
    collector.report(RETRY_COUNT, state.attempts().saturating_sub(1));
}
