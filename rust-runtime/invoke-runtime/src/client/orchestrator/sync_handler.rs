/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::http_body::{read_body_blocking, take_body};
use super::{
    apply_params_signer_override, handle_response, not_replayable, report_backoff,
    report_retry_count, response_needs_body, start_call, CallResult, ClientExecutionParams,
    ExecutionContext, NextAttempt,
};
use crate::client::defaults::apply_defaults;
use crate::client::metrics::MetricsScope;
use crate::client::transfer::TransferMarshaller;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::config::{
    BuildError, ClientConfiguration, SharedClientConfiguration,
};
use invoke_runtime_api::client::http::{HttpClient, HttpResponse, SharedHttpClient};
use invoke_runtime_api::client::metrics::core_metrics::{HTTP_STATUS_CODE, SERVICE_CALL_DURATION};
use invoke_runtime_api::client::metrics::MetricCollector;
use invoke_runtime_api::client::request::SdkRequest;
use invoke_runtime_api::client::result::SdkError;
use invoke_runtime_api::client::retries::{RetryState, RetryStrategy};
use invoke_runtime_api::client::ser_de::{HandleErrorResponse, HandleResponse};
use invoke_types::byte_stream::ByteStream;
use invoke_types::error::display::DisplayErrorContext;
use invoke_types::error::ProvideErrorMetadata;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, debug_span};

/// Executes operation calls on the caller's thread.
///
/// Calls block until the final attempt completes, backoff included.
#[derive(Clone, Debug)]
pub struct SyncClientHandler {
    config: SharedClientConfiguration,
}

impl SyncClientHandler {
    /// Create a handler for calls made with `config`.
    ///
    /// Anything the configuration leaves unset that the engine needs is filled in with its
    /// default.
    pub fn new(config: ClientConfiguration) -> Result<Self, BuildError> {
        Ok(Self {
            config: Arc::new(apply_defaults(config)?),
        })
    }

    /// The configuration calls start from.
    pub fn config(&self) -> &SharedClientConfiguration {
        &self.config
    }

    /// Execute a call and return its output.
    pub fn execute<I, O, E>(&self, params: ClientExecutionParams<I, O, E>) -> CallResult<O, E>
    where
        I: SdkRequest,
        E: Error + ProvideErrorMetadata + Send + Sync + 'static,
    {
        self.execute_streaming(params, |output, _| Ok(output))
    }

    /// Execute a call and pass its output and response body to `transformer`.
    ///
    /// The body is unread when the operation streams its response, and buffered otherwise.
    /// It is dropped once `transformer` returns. A failing transformer fails the call, which
    /// is not retried.
    pub fn execute_streaming<I, O, E, R>(
        &self,
        params: ClientExecutionParams<I, O, E>,
        transformer: impl FnOnce(O, ByteStream) -> Result<R, BoxError>,
    ) -> CallResult<R, E>
    where
        I: SdkRequest,
        E: Error + ProvideErrorMetadata + Send + Sync + 'static,
    {
        let span = debug_span!(
            "invoke",
            service = %self.config.service_id(),
            operation = params.operation_name,
        );
        let _entered = span.enter();

        let params = apply_params_signer_override(params, false);
        let (scope, context) = start_call(&self.config, &params);
        let result = match context {
            Ok(context) => invoke(&context, params, &scope).and_then(|(output, mut response)| {
                let body = take_body(&mut response);
                transformer(output, body).map_err(|err| SdkError::response_error(err, response))
            }),
            Err(err) => Err(SdkError::construction_failure(err)),
        };
        if let Err(err) = &result {
            debug!(error = %DisplayErrorContext(err), "call failed");
        }
        scope.finish(&result);
        result
    }
}

fn invoke<I, O, E>(
    context: &ExecutionContext,
    params: ClientExecutionParams<I, O, E>,
    scope: &MetricsScope,
) -> CallResult<(O, HttpResponse), E>
where
    E: Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    let ClientExecutionParams {
        input,
        marshaller,
        response_handler,
        error_handler,
        body,
        transfer_policy,
        ..
    } = params;
    let http_client = context
        .config()
        .http_client()
        .cloned()
        .ok_or_else(|| SdkError::construction_failure("no HTTP client is configured"))?;
    let mut marshaller = TransferMarshaller::new(
        marshaller.as_ref(),
        body,
        transfer_policy.with_http2(context.config().http2_enabled()),
    );
    marshaller
        .validate()
        .map_err(SdkError::construction_failure)?;

    let strategy = context.retry_strategy();
    let mut state = RetryState::new();
    let delay = context.initial_attempt(&strategy, &mut state)?;
    if !delay.is_zero() {
        thread::sleep(delay);
    }

    loop {
        state.increment_attempts();
        let collector = scope.attempt();
        let span = debug_span!("attempt", attempt = state.attempts());
        let result = span.in_scope(|| {
            make_an_attempt(
                context,
                &mut marshaller,
                &input,
                &http_client,
                response_handler.as_ref(),
                error_handler.as_ref(),
                &collector,
            )
        });
        let err = match result {
            Ok(success) => {
                strategy.on_success(&mut state);
                report_retry_count(scope.collector(), &state);
                return Ok(success);
            }
            Err(err) => err,
        };
        debug!(attempt = state.attempts(), error = %DisplayErrorContext(&err), "attempt failed");
        let can_replay = marshaller.can_replay();
        let delay = match context.next_attempt(&strategy, &mut state, &err, can_replay) {
            NextAttempt::After(delay) => delay,
            NextAttempt::Stop => {
                report_retry_count(scope.collector(), &state);
                return Err(err);
            }
            NextAttempt::BodyNotReplayable => {
                report_retry_count(scope.collector(), &state);
                return Err(not_replayable(err));
            }
        };
        report_backoff(&collector, delay);
        thread::sleep(delay);
    }
}

fn make_an_attempt<I, O, E>(
    context: &ExecutionContext,
    marshaller: &mut TransferMarshaller<'_, I>,
    input: &I,
    http_client: &SharedHttpClient,
    response_handler: &dyn HandleResponse<O>,
    error_handler: &dyn HandleErrorResponse<E>,
    collector: &MetricCollector,
) -> CallResult<(O, HttpResponse), E> {
    let request = context.request_for_attempt(marshaller, input, collector)?;

    let start = Instant::now();
    let sent = http_client.call(request);
    collector.report(SERVICE_CALL_DURATION, start.elapsed());
    let mut response = sent.map_err(SdkError::dispatch_failure)?;
    collector.report(HTTP_STATUS_CODE, response.status().as_u16());

    if response_needs_body(response_handler, &response) {
        if let Err(err) = read_body_blocking(&mut response) {
            return Err(SdkError::response_error(err, response));
        }
    }
    handle_response(response_handler, error_handler, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_runtime_api::client::http::{HttpRequest, SharedHttpClient};
    use invoke_runtime_api::client::result::ConnectorError;
    use invoke_runtime_api::client::retries::SharedRetryStrategy;
    use invoke_runtime_api::client::ser_de::MarshallingError;
    use invoke_types::body::SdkBody;
    use invoke_types::error::ErrorMetadata;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::client::retries::strategy::{NeverRetryStrategy, StandardRetryStrategy};
    use invoke_runtime_api::client::request::RequestOverrideConfiguration;

    #[derive(Debug)]
    struct Failure(ErrorMetadata);

    impl fmt::Display for Failure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "failure")
        }
    }

    impl Error for Failure {}

    impl ProvideErrorMetadata for Failure {
        fn meta(&self) -> &ErrorMetadata {
            &self.0
        }
    }

    struct Input;

    impl SdkRequest for Input {
        fn override_configuration(&self) -> Option<&RequestOverrideConfiguration> {
            None
        }

        fn with_override_configuration(self, _config: RequestOverrideConfiguration) -> Self {
            self
        }
    }

    #[derive(Debug, Default)]
    struct Flaky {
        calls: AtomicUsize,
        failures: usize,
    }

    impl HttpClient for Flaky {
        fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
            assert_eq!(request.uri(), "https://example.com/");
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(ConnectorError::io("connection reset".into()));
            }
            Ok(http::Response::builder()
                .status(200)
                .body(SdkBody::from("ok"))
                .unwrap())
        }
    }

    fn handler(client: Arc<Flaky>, standard: bool) -> SyncClientHandler {
        #[derive(Debug)]
        struct ByRef(Arc<Flaky>);
        impl HttpClient for ByRef {
            fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
                self.0.call(request)
            }
        }
        let strategy = if standard {
            SharedRetryStrategy::new(StandardRetryStrategy::new(
                crate::client::defaults::default_retry_config()
                    .with_initial_backoff(std::time::Duration::ZERO),
            ))
        } else {
            SharedRetryStrategy::new(NeverRetryStrategy::new())
        };
        let config = ClientConfiguration::builder()
            .service_id("Sample")
            .endpoint(http::Uri::from_static("https://example.com"))
            .http_client(SharedHttpClient::new(ByRef(client)))
            .retry_strategy(strategy)
            .build()
            .unwrap();
        SyncClientHandler::new(config).unwrap()
    }

    fn params() -> ClientExecutionParams<Input, String, Failure> {
        ClientExecutionParams::new(
            "Ping",
            Input,
            |_: &Input| -> Result<HttpRequest, MarshallingError> {
                Ok(http::Request::builder()
                    .uri("/")
                    .body(SdkBody::empty())
                    .unwrap())
            },
            ReadBody,
            NoErrors,
        )
    }

    struct ReadBody;

    impl HandleResponse<String> for ReadBody {
        fn handle(&self, response: &HttpResponse) -> Result<String, BoxError> {
            Ok(String::from_utf8(response.body().bytes().unwrap_or_default().to_vec())?)
        }
    }

    struct NoErrors;

    impl HandleErrorResponse<Failure> for NoErrors {
        fn handle(&self, _response: &HttpResponse) -> Result<Failure, BoxError> {
            Ok(Failure(ErrorMetadata::builder().build()))
        }
    }

    #[test]
    fn retries_transient_failures() {
        let client = Arc::new(Flaky {
            failures: 2,
            ..Default::default()
        });
        let output = handler(client.clone(), true).execute(params()).unwrap();
        assert_eq!(output, "ok");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn never_retry_makes_one_attempt() {
        let client = Arc::new(Flaky {
            failures: 1,
            ..Default::default()
        });
        let err = handler(client.clone(), false).execute(params()).unwrap_err();
        assert!(matches!(err, SdkError::DispatchFailure(_)), "{err:?}");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transformer_failures_are_not_retried() {
        let client = Arc::new(Flaky::default());
        let err = handler(client.clone(), true)
            .execute_streaming(params(), |_, _| -> Result<(), BoxError> {
                Err("no space left".into())
            })
            .unwrap_err();
        assert!(matches!(err, SdkError::ResponseError(_)), "{err:?}");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn requires_a_transport() {
        let config = ClientConfiguration::builder()
            .service_id("Sample")
            .endpoint(http::Uri::from_static("https://example.com"))
            .build()
            .unwrap();
        let err = SyncClientHandler::new(config)
            .unwrap()
            .execute(params())
            .unwrap_err();
        assert!(matches!(err, SdkError::ConstructionFailure(_)), "{err:?}");
    }
}
