/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Streaming request bodies.
//!
//! Operations with a streaming input take their payload from a [`RequestBody`] (blocking
//! sources, for synchronous clients) or an [`AsyncRequestBody`] (non-blocking producers, for
//! asynchronous clients). The [`TransferMarshaller`] attaches the body to the request the
//! operation's marshaller produces, once per attempt.
//!
//! A body built from in-memory data or from a provider can be read again from the start for
//! every attempt. A body built from a single reader or stream can be sent once: a call using
//! one cannot be retried.

use bytes::Bytes;
use futures_util::stream::Stream;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::http::HttpRequest;
use invoke_runtime_api::client::ser_de::{Marshall, MarshallingError};
use invoke_types::body::{BodyRebuilder, SdkBody};
use std::io::Read;

/// The body of a request, read with blocking reads.
#[derive(Debug)]
pub struct RequestBody {
    inner: TransferBody,
}

impl RequestBody {
    /// A body holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: TransferBody::new(SdkBody::from(bytes.into())),
        }
    }

    /// A body holding `string`, sent as UTF-8.
    pub fn from_string(string: impl Into<String>) -> Self {
        Self {
            inner: TransferBody::new(SdkBody::from(string.into())),
        }
    }

    /// A body with no content.
    pub fn empty() -> Self {
        Self {
            inner: TransferBody::new(SdkBody::empty()),
        }
    }

    /// A body read from `reader`.
    ///
    /// The reader can only be read once, so a call with this body is never retried.
    pub fn from_reader(
        reader: impl Read + Send + Sync + 'static,
        content_length: Option<u64>,
    ) -> Self {
        Self {
            inner: TransferBody::new(SdkBody::from_reader(reader, content_length)),
        }
    }

    /// A body read from a fresh reader returned by `provider` for every attempt.
    ///
    /// Each reader must yield the same bytes from the first one on.
    pub fn from_provider<R>(
        content_length: Option<u64>,
        provider: impl Fn() -> R + Send + Sync + 'static,
    ) -> Self
    where
        R: Read + Send + Sync + 'static,
    {
        Self {
            inner: TransferBody::new(SdkBody::retryable(move || {
                SdkBody::from_reader(provider(), content_length)
            })),
        }
    }

    /// Send `content_type` as the `Content-Type` unless the request already has one.
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.inner.content_type = Some(HeaderValue::from_static(content_type));
        self
    }

    /// The length of the body, if it is known.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.body.content_length()
    }

    /// Returns true if the body can be sent more than once.
    pub fn is_replayable(&self) -> bool {
        self.inner.body.is_replayable()
    }
}

/// The body of a request, produced by a non-blocking stream of chunks.
///
/// The transport pulls chunks as it has capacity to send them. The body is never buffered
/// whole.
#[derive(Debug)]
pub struct AsyncRequestBody {
    inner: TransferBody,
}

impl AsyncRequestBody {
    /// A body holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: TransferBody::new(SdkBody::from(bytes.into())),
        }
    }

    /// A body with no content.
    pub fn empty() -> Self {
        Self {
            inner: TransferBody::new(SdkBody::empty()),
        }
    }

    /// A body produced by `stream`.
    ///
    /// The stream can only be consumed once, so a call with this body is never retried.
    pub fn from_stream<S, E>(stream: S, content_length: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            inner: TransferBody::new(SdkBody::from_stream(stream, content_length)),
        }
    }

    /// A body produced by a fresh stream returned by `provider` for every attempt.
    pub fn from_stream_provider<S, E>(
        content_length: Option<u64>,
        provider: impl Fn() -> S + Send + Sync + 'static,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            inner: TransferBody::new(SdkBody::retryable(move || {
                SdkBody::from_stream(provider(), content_length)
            })),
        }
    }

    /// Send `content_type` as the `Content-Type` unless the request already has one.
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.inner.content_type = Some(HeaderValue::from_static(content_type));
        self
    }

    /// The length of the body, if it is known.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.body.content_length()
    }

    /// Returns true if the body can be sent more than once.
    pub fn is_replayable(&self) -> bool {
        self.inner.body.is_replayable()
    }
}

#[derive(Debug)]
pub(crate) struct TransferBody {
    body: SdkBody,
    content_type: Option<HeaderValue>,
}

impl TransferBody {
    fn new(body: SdkBody) -> Self {
        Self {
            body,
            content_type: None,
        }
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.body.is_streaming()
    }
}

impl From<RequestBody> for TransferBody {
    fn from(body: RequestBody) -> Self {
        body.inner
    }
}

impl From<AsyncRequestBody> for TransferBody {
    fn from(body: AsyncRequestBody) -> Self {
        body.inner
    }
}

/// How the length of an attached body is communicated.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransferPolicy {
    requires_length: bool,
    transfer_encoding: bool,
    http2: bool,
}

impl TransferPolicy {
    /// The operation cannot be sent without a known payload length.
    pub fn with_requires_length(mut self, requires_length: bool) -> Self {
        self.requires_length = requires_length;
        self
    }

    /// Use chunked framing when the length is not known up front.
    pub fn with_transfer_encoding(mut self, transfer_encoding: bool) -> Self {
        self.transfer_encoding = transfer_encoding;
        self
    }

    /// The transport speaks HTTP/2, which frames bodies itself.
    pub fn with_http2(mut self, http2: bool) -> Self {
        self.http2 = http2;
        self
    }

    /// Fail if this policy requires a length that `body` does not have.
    pub(crate) fn check(&self, body: Option<&TransferBody>) -> Result<(), MarshallingError> {
        match body {
            Some(TransferBody { body, .. })
                if self.requires_length && body.content_length().is_none() =>
            {
                Err(MarshallingError::missing_content_length())
            }
            _ => Ok(()),
        }
    }
}

/// Failure to produce the request for an attempt.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransferError {
    /// The operation's marshaller, or the length policy, rejected the request.
    #[error(transparent)]
    Marshalling(#[from] MarshallingError),
    /// The body was consumed by an earlier attempt and cannot be read again.
    #[error("the request body was consumed by an earlier attempt and cannot be replayed")]
    RequestBodyNotReplayable,
}

/// A retry was indicated but the request body could not be sent again.
///
/// The failure of the attempt that would have been retried is the source.
#[derive(Debug, thiserror::Error)]
#[error("the request body is not replayable, so the failed attempt cannot be retried")]
pub struct RequestBodyNotReplayable {
    #[source]
    previous: BoxError,
}

impl RequestBodyNotReplayable {
    pub(crate) fn new(previous: impl Into<BoxError>) -> Self {
        Self {
            previous: previous.into(),
        }
    }
}

#[derive(Debug)]
enum BodyState {
    Absent,
    Fresh(TransferBody),
    // opens a copy of the original body for each later attempt
    Replayable {
        template: BodyRebuilder,
        content_type: Option<HeaderValue>,
    },
    Consumed,
}

/// Wraps an operation's marshaller to attach a request body.
///
/// A transfer marshaller belongs to one call. It hands the body out once per attempt: the
/// original body to the first attempt, and a copy starting at the first byte to every
/// later one.
pub struct TransferMarshaller<'a, I> {
    base: &'a dyn Marshall<I>,
    body: BodyState,
    policy: TransferPolicy,
}

impl<'a, I> std::fmt::Debug for TransferMarshaller<'a, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferMarshaller")
            .field("body", &self.body)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'a, I> TransferMarshaller<'a, I> {
    /// Wrap `base`, attaching `body` (if any) according to `policy`.
    pub(crate) fn new(
        base: &'a dyn Marshall<I>,
        body: Option<TransferBody>,
        policy: TransferPolicy,
    ) -> Self {
        Self {
            base,
            body: body.map(BodyState::Fresh).unwrap_or(BodyState::Absent),
            policy,
        }
    }

    /// Returns true if another attempt can be marshalled.
    pub fn can_replay(&self) -> bool {
        !matches!(self.body, BodyState::Consumed)
    }

    /// Check the length policy against the body before any attempt is made.
    pub(crate) fn validate(&self) -> Result<(), MarshallingError> {
        match &self.body {
            BodyState::Fresh(body) => self.policy.check(Some(body)),
            _ => Ok(()),
        }
    }

    /// Marshall `input` for the next attempt.
    pub fn marshall(&mut self, input: &I) -> Result<HttpRequest, TransferError> {
        let mut request = self.base.marshall(input)?;
        let (body, content_type) = match std::mem::replace(&mut self.body, BodyState::Consumed) {
            BodyState::Absent => {
                self.body = BodyState::Absent;
                return Ok(request);
            }
            BodyState::Consumed => return Err(TransferError::RequestBodyNotReplayable),
            BodyState::Fresh(TransferBody { body, content_type }) => {
                if let Some(template) = body.rebuilder() {
                    self.body = BodyState::Replayable {
                        template,
                        content_type: content_type.clone(),
                    };
                }
                (body, content_type)
            }
            BodyState::Replayable {
                template,
                content_type,
            } => {
                let body = template.rebuild();
                self.body = BodyState::Replayable {
                    template,
                    content_type: content_type.clone(),
                };
                (body, content_type)
            }
        };

        apply_length_headers(&mut request, body.content_length(), &self.policy)?;
        if let Some(content_type) = content_type {
            if !request.headers().contains_key(CONTENT_TYPE) {
                request.headers_mut().insert(CONTENT_TYPE, content_type);
            }
        }
        *request.body_mut() = body;
        Ok(request)
    }
}

fn apply_length_headers(
    request: &mut HttpRequest,
    content_length: Option<u64>,
    policy: &TransferPolicy,
) -> Result<(), MarshallingError> {
    if policy.requires_length && content_length.is_none() {
        return Err(MarshallingError::missing_content_length());
    }
    if request.headers().contains_key(CONTENT_LENGTH) {
        return Ok(());
    }
    match content_length {
        Some(length) => {
            request
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        None if policy.transfer_encoding && !policy.http2 => {
            request
                .headers_mut()
                .insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        }
        None => {}
    }
    Ok(())
}
