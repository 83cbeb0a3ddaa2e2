/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::http_body::{read_body, take_body};
use super::{
    apply_params_signer_override, handle_response, not_replayable, report_backoff,
    report_retry_count, response_needs_body, start_call, CallResult, ClientExecutionParams,
    ExecutionContext, NextAttempt,
};
use crate::client::defaults::apply_defaults;
use crate::client::metrics::MetricsScope;
use crate::client::transfer::TransferMarshaller;
use invoke_async::future::now_or_later::{BoxFuture, NowOrLater};
use invoke_async::future::timeout::Timeout;
use invoke_async::rt::sleep::{AsyncSleep, SharedAsyncSleep};
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::config::{
    BuildError, ClientConfiguration, SharedClientConfiguration,
};
use invoke_runtime_api::client::http::{AsyncHttpClient, HttpResponse, SharedAsyncHttpClient};
use invoke_runtime_api::client::metrics::core_metrics::{HTTP_STATUS_CODE, SERVICE_CALL_DURATION};
use invoke_runtime_api::client::metrics::MetricCollector;
use invoke_runtime_api::client::request::SdkRequest;
use invoke_runtime_api::client::result::SdkError;
use invoke_runtime_api::client::retries::{RetryState, RetryStrategy};
use invoke_runtime_api::client::ser_de::{HandleErrorResponse, HandleResponse};
use invoke_types::byte_stream::ByteStream;
use invoke_types::error::display::DisplayErrorContext;
use invoke_types::error::ProvideErrorMetadata;
use pin_project_lite::pin_project;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::{debug, debug_span, Instrument};

pin_project! {
    /// The future returned by [`AsyncClientHandler`].
    ///
    /// A call that fails before anything is sent yields a future that is already complete.
    /// Dropping the future cancels the call.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct ExecuteFuture<T, E> {
        #[pin]
        inner: NowOrLater<CallResult<T, E>, BoxFuture<'static, CallResult<T, E>>>,
    }
}

impl<T, E> ExecuteFuture<T, E> {
    fn ready(result: CallResult<T, E>) -> Self {
        Self {
            inner: NowOrLater::ready(result),
        }
    }

    fn later(future: BoxFuture<'static, CallResult<T, E>>) -> Self {
        Self {
            inner: NowOrLater::new(future),
        }
    }

    /// Returns true if the call completed without being started.
    pub fn is_ready_now(&self) -> bool {
        self.inner.is_now()
    }
}

impl<T, E> Future for ExecuteFuture<T, E> {
    type Output = CallResult<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().inner.poll(cx)
    }
}

impl<T, E> fmt::Debug for ExecuteFuture<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteFuture")
            .field("ready_now", &self.is_ready_now())
            .finish()
    }
}

/// Executes operation calls without blocking the calling thread.
///
/// The returned futures are lazy: nothing is sent until they are polled. Backoff and the
/// call and attempt timeouts use the configured [`AsyncSleep`].
#[derive(Clone, Debug)]
pub struct AsyncClientHandler {
    config: SharedClientConfiguration,
}

impl AsyncClientHandler {
    /// Create a handler for calls made with `config`.
    pub fn new(config: ClientConfiguration) -> Result<Self, BuildError> {
        Ok(Self {
            config: Arc::new(apply_defaults(config)?),
        })
    }

    /// The configuration calls start from.
    pub fn config(&self) -> &SharedClientConfiguration {
        &self.config
    }

    /// Execute a call and resolve to its output.
    pub fn execute_async<I, O, E>(&self, params: ClientExecutionParams<I, O, E>) -> ExecuteFuture<O, E>
    where
        I: SdkRequest + Send + Sync + 'static,
        O: Send + 'static,
        E: Error + ProvideErrorMetadata + Send + Sync + 'static,
    {
        self.start(params, false, |output, _| std::future::ready(Ok::<_, BoxError>(output)))
    }

    /// Execute a call and pass its output and response body to `transformer`.
    ///
    /// If the client's signer was overridden, the operation's own signer override is not
    /// applied. A failing transformer fails the call, which is not retried.
    pub fn execute_async_streaming<I, O, E, R, F, Fut>(
        &self,
        params: ClientExecutionParams<I, O, E>,
        transformer: F,
    ) -> ExecuteFuture<R, E>
    where
        I: SdkRequest + Send + Sync + 'static,
        O: Send + 'static,
        E: Error + ProvideErrorMetadata + Send + Sync + 'static,
        R: Send + 'static,
        F: FnOnce(O, ByteStream) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    {
        let skip_signer_override = self.config.signer_overridden();
        self.start(params, skip_signer_override, transformer)
    }

    fn start<I, O, E, R, F, Fut>(
        &self,
        params: ClientExecutionParams<I, O, E>,
        skip_signer_override: bool,
        transformer: F,
    ) -> ExecuteFuture<R, E>
    where
        I: SdkRequest + Send + Sync + 'static,
        O: Send + 'static,
        E: Error + ProvideErrorMetadata + Send + Sync + 'static,
        R: Send + 'static,
        F: FnOnce(O, ByteStream) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    {
        let span = debug_span!(
            "invoke",
            service = %self.config.service_id(),
            operation = params.operation_name,
        );
        let params = apply_params_signer_override(params, skip_signer_override);
        let (scope, context) = span.in_scope(|| start_call(&self.config, &params));
        let started = context
            .map_err(SdkError::construction_failure)
            .and_then(|context| Started::new(context, &params));
        let started = match started {
            Ok(started) => started,
            Err(err) => {
                let result = Err(err);
                span.in_scope(|| debug!("call failed before it was started"));
                scope.finish(&result);
                return ExecuteFuture::ready(result);
            }
        };

        let future = async move {
            let result = started.run(params, &scope, transformer).await;
            if let Err(err) = &result {
                debug!(error = %DisplayErrorContext(err), "call failed");
            }
            scope.finish(&result);
            result
        };
        ExecuteFuture::later(Box::pin(future.instrument(span)))
    }
}

/// A call whose configuration checked out.
struct Started {
    context: ExecutionContext,
    http_client: SharedAsyncHttpClient,
    sleep: SharedAsyncSleep,
}

impl Started {
    fn new<I, O, E>(
        context: ExecutionContext,
        params: &ClientExecutionParams<I, O, E>,
    ) -> CallResult<Self, E> {
        let config = context.config();
        let http_client = config
            .async_http_client()
            .cloned()
            .ok_or_else(|| SdkError::construction_failure("no async HTTP client is configured"))?;
        let sleep = config
            .sleep_impl()
            .cloned()
            .ok_or_else(|| SdkError::construction_failure("no sleep implementation is configured"))?;
        params
            .transfer_policy
            .check(params.body.as_ref())
            .map_err(SdkError::construction_failure)?;
        Ok(Self {
            context,
            http_client,
            sleep,
        })
    }

    async fn run<I, O, E, R, F, Fut>(
        self,
        params: ClientExecutionParams<I, O, E>,
        scope: &MetricsScope,
        transformer: F,
    ) -> CallResult<R, E>
    where
        I: Send + Sync,
        O: Send,
        E: Error + ProvideErrorMetadata + Send + Sync + 'static,
        F: FnOnce(O, ByteStream) -> Fut,
        Fut: Future<Output = Result<R, BoxError>>,
    {
        let operation_timeout = self.context.timeout_config().operation_timeout();
        let invoke = self.invoke(params, scope);
        let (output, mut response) =
            match Timeout::maybe(invoke, self.sleep.as_ref(), operation_timeout).await {
                Ok(result) => result?,
                Err(timed_out) => {
                    debug!(%timed_out, "the call timed out");
                    return Err(SdkError::timeout_error(timed_out));
                }
            };
        let body = take_body(&mut response);
        transformer(output, body)
            .await
            .map_err(|err| SdkError::response_error(err, response))
    }

    async fn invoke<I, O, E>(
        &self,
        params: ClientExecutionParams<I, O, E>,
        scope: &MetricsScope,
    ) -> CallResult<(O, HttpResponse), E>
    where
        I: Send + Sync,
        O: Send,
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
        let context = &self.context;
        let mut marshaller = TransferMarshaller::new(
            marshaller.as_ref(),
            body,
            transfer_policy.with_http2(context.config().http2_enabled()),
        );

        let strategy = context.retry_strategy();
        let mut state = RetryState::new();
        let delay = context.initial_attempt(&strategy, &mut state)?;
        if !delay.is_zero() {
            self.sleep.sleep(delay).await;
        }

        let attempt_timeout = context.timeout_config().operation_attempt_timeout();
        loop {
            state.increment_attempts();
            let collector = scope.attempt();
            let span = debug_span!("attempt", attempt = state.attempts());
            let attempt = self.make_an_attempt(
                &mut marshaller,
                &input,
                response_handler.as_ref(),
                error_handler.as_ref(),
                &collector,
            );
            let result = match Timeout::maybe(attempt, self.sleep.as_ref(), attempt_timeout)
                .instrument(span)
                .await
            {
                Ok(result) => result,
                Err(timed_out) => Err(SdkError::timeout_error(timed_out)),
            };
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
            self.sleep.sleep(delay).await;
        }
    }

    async fn make_an_attempt<I, O, E>(
        &self,
        marshaller: &mut TransferMarshaller<'_, I>,
        input: &I,
        response_handler: &dyn HandleResponse<O>,
        error_handler: &dyn HandleErrorResponse<E>,
        collector: &MetricCollector,
    ) -> CallResult<(O, HttpResponse), E> {
        let request = self
            .context
            .request_for_attempt(marshaller, input, collector)?;

        let start = Instant::now();
        let sent = self.http_client.call(request).await;
        collector.report(SERVICE_CALL_DURATION, start.elapsed());
        let mut response = sent.map_err(SdkError::dispatch_failure)?;
        collector.report(HTTP_STATUS_CODE, response.status().as_u16());

        if response_needs_body(response_handler, &response) {
            if let Err(err) = read_body(&mut response).await {
                return Err(SdkError::response_error(err, response));
            }
        }
        handle_response(response_handler, error_handler, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::retries::strategy::NeverRetryStrategy;
    use invoke_async::test_util::InstantSleep;
    use invoke_runtime_api::client::config::TimeoutConfig;
    use invoke_runtime_api::client::http::{HttpConnectorFuture, HttpRequest};
    use invoke_runtime_api::client::request::RequestOverrideConfiguration;
    use invoke_runtime_api::client::ser_de::MarshallingError;
    use invoke_types::body::SdkBody;
    use invoke_types::error::ErrorMetadata;
    use std::time::Duration;

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

    struct Echo;

    impl HandleResponse<String> for Echo {
        fn handle(&self, response: &HttpResponse) -> Result<String, BoxError> {
            Ok(String::from_utf8(response.body().bytes().unwrap_or_default().to_vec())?)
        }
    }

    impl HandleErrorResponse<Failure> for Echo {
        fn handle(&self, _response: &HttpResponse) -> Result<Failure, BoxError> {
            Ok(Failure(ErrorMetadata::builder().code("Boom").build()))
        }
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
            Echo,
            Echo,
        )
    }

    #[derive(Debug)]
    struct Respond(u16);

    impl AsyncHttpClient for Respond {
        fn call(&self, _request: HttpRequest) -> HttpConnectorFuture {
            HttpConnectorFuture::ready(Ok(http::Response::builder()
                .status(self.0)
                .body(SdkBody::from("pong"))
                .unwrap()))
        }
    }

    #[derive(Debug)]
    struct Hang;

    impl AsyncHttpClient for Hang {
        fn call(&self, _request: HttpRequest) -> HttpConnectorFuture {
            HttpConnectorFuture::new(std::future::pending())
        }
    }

    fn handler(client: impl AsyncHttpClient + 'static) -> AsyncClientHandler {
        AsyncClientHandler::new(
            ClientConfiguration::builder()
                .service_id("Sample")
                .endpoint(http::Uri::from_static("https://example.com"))
                .async_http_client(SharedAsyncHttpClient::new(client))
                .retry_strategy(NeverRetryStrategy::new())
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_to_the_output() {
        let future = handler(Respond(200)).execute_async(params());
        assert!(!future.is_ready_now());
        assert_eq!(future.await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn service_errors_are_mapped() {
        let err = handler(Respond(400))
            .execute_async(params())
            .await
            .unwrap_err();
        assert_eq!(err.as_service_error().unwrap().0.code(), Some("Boom"));
    }

    #[tokio::test]
    async fn construction_failures_are_ready_now() {
        let config = ClientConfiguration::builder()
            .service_id("Sample")
            .endpoint(http::Uri::from_static("https://example.com"))
            .build()
            .unwrap();
        let future = AsyncClientHandler::new(config)
            .unwrap()
            .execute_async(params());
        assert!(future.is_ready_now());
        assert!(matches!(
            future.await.unwrap_err(),
            SdkError::ConstructionFailure(_)
        ));
    }

    #[tokio::test]
    async fn attempt_timeout_surfaces_as_timeout_error() {
        let handler = AsyncClientHandler::new(
            handler(Hang)
                .config()
                .to_builder()
                .timeout_config(
                    TimeoutConfig::disabled()
                        .with_operation_attempt_timeout(Duration::from_millis(10)),
                )
                .build()
                .unwrap(),
        )
        .unwrap();
        let err = handler.execute_async(params()).await.unwrap_err();
        assert!(matches!(err, SdkError::TimeoutError(_)), "{err:?}");
    }

    #[tokio::test]
    async fn streaming_transformer_sees_the_body() {
        let length = handler(Respond(200))
            .execute_async_streaming(params(), |_, body: ByteStream| async move {
                Ok::<_, BoxError>(body.collect().await?.len())
            })
            .await
            .unwrap();
        assert_eq!(length, 4);
    }

    #[tokio::test]
    async fn backoff_uses_the_sleep_impl() {
        use crate::client::retries::strategy::StandardRetryStrategy;
        use invoke_types::retry::RetryConfig;

        let sleep = InstantSleep::new();
        let handler = AsyncClientHandler::new(
            handler(Respond(503))
                .config()
                .to_builder()
                .retry_strategy(StandardRetryStrategy::new(RetryConfig::standard()))
                .sleep_impl(SharedAsyncSleep::new(sleep.clone()))
                .build()
                .unwrap(),
        )
        .unwrap();
        let err = handler.execute_async(params()).await.unwrap_err();
        assert!(matches!(err, SdkError::ServiceError(_)), "{err:?}");
        assert_eq!(sleep.logs().len(), 2);
    }
}
