/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! HTTP transport interfaces.
//!
//! The execution engine does not manage connections. It hands a fully marshalled and signed
//! [`HttpRequest`] to a transport and receives an [`HttpResponse`] back:
//! - synchronous clients use an [`HttpClient`], which blocks the calling thread
//! - asynchronous clients use an [`AsyncHttpClient`], which returns an [`HttpConnectorFuture`]
//!
//! Dropping an `HttpConnectorFuture` must abort the in-flight request; this is how
//! cancellation of an async call reaches the transport.

use crate::client::result::ConnectorError;
use crate::impl_shared_conversions;
use invoke_async::future::now_or_later::{BoxFuture, NowOrLater};
use invoke_types::body::SdkBody;
use pin_project_lite::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Type alias for the HTTP request type that the engine uses.
pub type HttpRequest = http::Request<SdkBody>;

/// Type alias for the HTTP response type that the engine uses.
pub type HttpResponse = http::Response<SdkBody>;

type ConnectorResult = Result<HttpResponse, ConnectorError>;

pin_project! {
    /// Future for [`AsyncHttpClient::call`].
    pub struct HttpConnectorFuture {
        #[pin]
        inner: NowOrLater<ConnectorResult, BoxFuture<'static, ConnectorResult>>,
    }
}

impl HttpConnectorFuture {
    /// Create a new `HttpConnectorFuture` with the given future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = ConnectorResult> + Send + 'static,
    {
        Self {
            inner: NowOrLater::new(Box::pin(future)),
        }
    }

    /// Create a new `HttpConnectorFuture` that is immediately ready with the given result.
    pub fn ready(result: ConnectorResult) -> Self {
        Self {
            inner: NowOrLater::ready(result),
        }
    }
}

impl Future for HttpConnectorFuture {
    type Output = ConnectorResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().inner.poll(cx)
    }
}

impl fmt::Debug for HttpConnectorFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HttpConnectorFuture")
    }
}

/// Blocking HTTP transport.
///
/// Implementations are shared across concurrent calls and synchronize their own connection
/// pools. A response body handed back to the engine is owned by the call from then on and is
/// dropped on every exit path, which returns the connection to the pool.
pub trait HttpClient: Send + Sync + fmt::Debug {
    /// Send `request` and block until response headers are available.
    fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError>;
}

/// Non-blocking HTTP transport.
pub trait AsyncHttpClient: Send + Sync + fmt::Debug {
    /// Start sending `request`. The returned future resolves once response headers are available.
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture;
}

/// Shared blocking HTTP transport.
#[derive(Clone, Debug)]
pub struct SharedHttpClient(Arc<dyn HttpClient>);

impl SharedHttpClient {
    /// Create a new `SharedHttpClient`.
    pub fn new(client: impl HttpClient + 'static) -> Self {
        Self(Arc::new(client))
    }
}

impl HttpClient for SharedHttpClient {
    fn call(&self, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
        self.0.call(request)
    }
}

impl_shared_conversions!(convert SharedHttpClient from HttpClient using SharedHttpClient::new);

/// Shared non-blocking HTTP transport.
#[derive(Clone, Debug)]
pub struct SharedAsyncHttpClient(Arc<dyn AsyncHttpClient>);

impl SharedAsyncHttpClient {
    /// Create a new `SharedAsyncHttpClient`.
    pub fn new(client: impl AsyncHttpClient + 'static) -> Self {
        Self(Arc::new(client))
    }
}

impl AsyncHttpClient for SharedAsyncHttpClient {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        self.0.call(request)
    }
}

impl_shared_conversions!(convert SharedAsyncHttpClient from AsyncHttpClient using SharedAsyncHttpClient::new);
