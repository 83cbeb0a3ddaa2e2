/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use invoke_runtime_api::client::http::{
    AsyncHttpClient, HttpClient, HttpConnectorFuture, HttpRequest, HttpResponse,
    SharedAsyncHttpClient, SharedHttpClient,
};
use invoke_runtime_api::client::result::ConnectorError;
use invoke_types::body::SdkBody;
use invoke_types::byte_stream::ByteStream;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type ResponseFn = dyn Fn(HttpRequest) -> Result<HttpResponse, ConnectorError> + Send + Sync;

/// A transport that answers every request with `f(request)`.
///
/// The returned client works for both synchronous and asynchronous calls.
///
/// ```rust
/// use invoke_runtime::test_util::transport::infallible_client_fn;
/// let client = infallible_client_fn(|_req| http::Response::builder().status(200).body("{}").unwrap());
/// ```
pub fn infallible_client_fn<B>(
    f: impl Fn(HttpRequest) -> http::Response<B> + Send + Sync + 'static,
) -> ClientFn
where
    B: Into<SdkBody>,
{
    ClientFn(Arc::new(move |request| Ok(f(request).map(Into::into))))
}

/// Transport returned by [`infallible_client_fn`].
#[derive(Clone)]
pub struct ClientFn(Arc<ResponseFn>);

impl fmt::Debug for ClientFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientFn")
    }
}

impl ClientFn {
    /// As a blocking transport.
    pub fn into_sync(self) -> SharedHttpClient {
        SharedHttpClient::new(self)
    }

    /// As a non-blocking transport.
    pub fn into_async(self) -> SharedAsyncHttpClient {
        SharedAsyncHttpClient::new(self)
    }
}

impl HttpClient for ClientFn {
    fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
        (self.0)(request)
    }
}

impl AsyncHttpClient for ClientFn {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        HttpConnectorFuture::ready((self.0)(request))
    }
}

/// A request as a transport received it, with its body read to the end.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl RecordedRequest {
    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The full request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The value of header `name`, if it is present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The request body as a string.
    ///
    /// # Panics
    /// If the body is not valid UTF-8.
    #[track_caller]
    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).expect("request body is not UTF-8")
    }
}

fn split(request: HttpRequest) -> (RecordedRequest, SdkBody) {
    let (parts, body) = request.into_parts();
    let recorded = RecordedRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body: Bytes::new(),
    };
    (recorded, body)
}

/// A transport that replays a fixed sequence of outcomes, one per request.
///
/// Every request is recorded with its body. Requests beyond the end of the sequence fail with
/// a user error.
#[derive(Clone, Debug, Default)]
pub struct SequenceClient {
    inner: Arc<Mutex<SequenceState>>,
}

#[derive(Debug, Default)]
struct SequenceState {
    outcomes: VecDeque<Result<HttpResponse, ConnectorError>>,
    requests: Vec<RecordedRequest>,
}

impl SequenceClient {
    /// A transport that answers with `outcomes`, in order.
    pub fn new(outcomes: impl IntoIterator<Item = Result<HttpResponse, ConnectorError>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SequenceState {
                outcomes: outcomes.into_iter().collect(),
                requests: Vec::new(),
            })),
        }
    }

    /// A transport that answers with `responses`, in order.
    pub fn responses(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok))
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// The number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    /// As a blocking transport.
    pub fn into_sync(self) -> SharedHttpClient {
        SharedHttpClient::new(self)
    }

    /// As a non-blocking transport.
    pub fn into_async(self) -> SharedAsyncHttpClient {
        SharedAsyncHttpClient::new(self)
    }

    fn respond(
        &self,
        recorded: RecordedRequest,
        body: Result<Bytes, ConnectorError>,
    ) -> Result<HttpResponse, ConnectorError> {
        let mut state = self.inner.lock().unwrap();
        let body = body?;
        state.requests.push(RecordedRequest { body, ..recorded });
        state.outcomes.pop_front().unwrap_or_else(|| {
            Err(ConnectorError::user(
                "the response sequence is exhausted".into(),
            ))
        })
    }
}

impl HttpClient for SequenceClient {
    fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
        let (recorded, body) = split(request);
        let body = ByteStream::new(body)
            .collect_blocking()
            .map_err(|err| ConnectorError::io(err.into()));
        self.respond(recorded, body)
    }
}

impl AsyncHttpClient for SequenceClient {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        let this = self.clone();
        HttpConnectorFuture::new(async move {
            let (recorded, body) = split(request);
            let body = ByteStream::new(body)
                .collect()
                .await
                .map_err(|err| ConnectorError::io(err.into()));
            this.respond(recorded, body)
        })
    }
}

/// Build a response with `status` and `body`.
pub fn response(status: u16, body: impl Into<SdkBody>) -> HttpResponse {
    http::Response::builder()
        .status(status)
        .body(body.into())
        .expect("valid response")
}

/// A transport that captures a single request.
#[derive(Clone, Debug)]
pub struct CaptureRequestHandler(Arc<Mutex<CaptureState>>);

#[derive(Debug)]
struct CaptureState {
    response: Option<HttpResponse>,
    sender: Option<oneshot::Sender<HttpRequest>>,
}

impl CaptureRequestHandler {
    fn capture(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
        let mut state = self.0.lock().unwrap();
        if let Some(sender) = state.sender.take() {
            let _ = sender.send(request);
        }
        state.response.take().ok_or_else(|| {
            ConnectorError::user("the capturing transport only answers one request".into())
        })
    }

    /// As a blocking transport.
    pub fn into_sync(self) -> SharedHttpClient {
        SharedHttpClient::new(self)
    }

    /// As a non-blocking transport.
    pub fn into_async(self) -> SharedAsyncHttpClient {
        SharedAsyncHttpClient::new(self)
    }
}

impl HttpClient for CaptureRequestHandler {
    fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
        self.capture(request)
    }
}

impl AsyncHttpClient for CaptureRequestHandler {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        HttpConnectorFuture::ready(self.capture(request))
    }
}

/// Receiver for the request captured by a [`CaptureRequestHandler`].
#[derive(Debug)]
pub struct CaptureRequestReceiver {
    receiver: oneshot::Receiver<HttpRequest>,
}

impl CaptureRequestReceiver {
    /// The captured request.
    ///
    /// # Panics
    /// If no request was sent.
    #[track_caller]
    pub fn expect_request(mut self) -> HttpRequest {
        self.receiver.try_recv().expect("no request was sent")
    }

    /// Assert that nothing was sent.
    ///
    /// # Panics
    /// If a request was sent.
    #[track_caller]
    pub fn expect_no_request(mut self) {
        assert!(
            self.receiver.try_recv().is_err(),
            "expected no request to be sent"
        );
    }
}

/// A transport that captures the first request and answers it with `response`, or with an
/// empty `200 OK`.
pub fn capture_request(
    response: Option<HttpResponse>,
) -> (CaptureRequestHandler, CaptureRequestReceiver) {
    let (sender, receiver) = oneshot::channel();
    let response = response.unwrap_or_else(|| self::response(200, SdkBody::empty()));
    (
        CaptureRequestHandler(Arc::new(Mutex::new(CaptureState {
            response: Some(response),
            sender: Some(sender),
        }))),
        CaptureRequestReceiver { receiver },
    )
}
