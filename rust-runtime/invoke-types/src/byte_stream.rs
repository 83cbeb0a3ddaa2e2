/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! ByteStream Abstractions
//!
//! When the payload of a request or response is streamed, it is represented as a `ByteStream`.
//! The bytes are read lazily: nothing is pulled from the underlying body until the stream is
//! polled, collected or read.
//!
//! ```no_run
//! use invoke_types::byte_stream::{ByteStream, error::Error};
//!
//! async fn payload_len(stream: ByteStream) -> Result<usize, Error> {
//!     let data = stream.collect().await?;
//!     Ok(data.len())
//! }
//! ```
//!
//! Dropping a `ByteStream` releases the underlying body, and with it whatever connection the
//! transport lent to the response.

use crate::body::SdkBody;
use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use pin_project_lite::pin_project;
use std::io::Read;
use std::pin::Pin;
use std::task::{Context, Poll};

pub mod error;

use error::{Error, ErrorKind};

pin_project! {
    /// Stream of binary data
    ///
    /// `ByteStream` wraps a stream of binary data for ease of use.
    #[derive(Debug)]
    pub struct ByteStream {
        #[pin]
        inner: SdkBody,
    }
}

impl ByteStream {
    /// Create a new `ByteStream` from an [`SdkBody`].
    pub fn new(body: SdkBody) -> Self {
        Self { inner: body }
    }

    /// Create a `ByteStream` from static bytes.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::new(SdkBody::from(Bytes::from_static(bytes)))
    }

    /// Returns the length of the stream, if it is known.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// Consume the `ByteStream`, returning the wrapped SdkBody.
    pub fn into_inner(self) -> SdkBody {
        self.inner
    }

    /// Return the next chunk of data, or `None` once the stream is drained.
    pub async fn next(&mut self) -> Option<Result<Bytes, Error>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Read all the data from this `ByteStream` into memory
    ///
    /// If an error in the underlying stream is encountered, `ByteStreamError` is returned.
    ///
    /// Data is read into a single contiguous buffer. Reader-backed bodies are read with
    /// blocking reads.
    pub async fn collect(mut self) -> Result<Bytes, Error> {
        let mut output = BytesMut::new();
        while let Some(chunk) = self.next().await {
            output.extend_from_slice(&chunk?);
        }
        Ok(output.freeze())
    }

    /// Read all the data from this `ByteStream` on the current thread.
    ///
    /// Intended for streams returned by synchronous calls. Async-only bodies cannot be read
    /// this way.
    pub fn collect_blocking(self) -> Result<Bytes, Error> {
        let mut output = Vec::new();
        self.into_blocking_read()
            .read_to_end(&mut output)
            .map_err(|err| Error::from(ErrorKind::IoError(err)))?;
        Ok(Bytes::from(output))
    }

    /// Convert this stream into a blocking [`Read`].
    pub fn into_blocking_read(self) -> impl Read + Send {
        self.inner.into_reader()
    }
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new(SdkBody::empty())
    }
}

impl From<SdkBody> for ByteStream {
    fn from(body: SdkBody) -> Self {
        Self::new(body)
    }
}

impl From<Bytes> for ByteStream {
    fn from(input: Bytes) -> Self {
        Self::new(SdkBody::from(input))
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(input: Vec<u8>) -> Self {
        Self::new(SdkBody::from(input))
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.project().inner.poll_next(cx) {
            Poll::Ready(Some(Err(err))) => {
                Poll::Ready(Some(Err(Error::from(ErrorKind::StreamingError(err)))))
            }
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.inner.content_length() {
            Some(0) => (0, Some(0)),
            _ => (0, None),
        }
    }
}
