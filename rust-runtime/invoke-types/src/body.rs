/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Types for representing the body of an HTTP request or response

use bytes::{Buf, Bytes};
use futures_core::Stream;
use pin_project_lite::pin_project;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// The error type of a body
pub type Error = crate::box_error::BoxError;

type BoxByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send + Sync>>;
type BoxReader = Box<dyn Read + Send + Sync>;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// SdkBody type
///
/// This is the Body used for dispatching all HTTP requests and receiving all HTTP responses.
/// A body is one of:
/// - in-memory bytes, which can always be replayed
/// - an async stream of chunks, pulled as the transport has capacity
/// - a blocking reader, used by synchronous transports
///
/// Streaming bodies can only be replayed (for example, on retry) if they were created with
/// [`SdkBody::retryable`].
pub struct SdkBody {
    inner: Inner,
    // Invariant: when set, calling `rebuild` yields a body that starts from the first byte
    rebuild: Option<Arc<dyn (Fn() -> Inner) + Send + Sync>>,
}

enum Inner {
    Once {
        inner: Option<Bytes>,
    },
    Stream {
        inner: BoxByteStream,
        content_length: Option<u64>,
    },
    Reader {
        inner: BoxReader,
        content_length: Option<u64>,
    },
    Taken,
}

impl Debug for Inner {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Inner::Once { inner } => f.debug_struct("Once").field("inner", inner).finish(),
            Inner::Stream { content_length, .. } => f
                .debug_struct("Stream")
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            Inner::Reader { content_length, .. } => f
                .debug_struct("Reader")
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            Inner::Taken => f.write_str("Taken"),
        }
    }
}

impl Debug for SdkBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkBody")
            .field("inner", &self.inner)
            .field("retryable", &self.rebuild.is_some())
            .finish()
    }
}

/// Produces copies of a replayable [`SdkBody`], each starting at the first byte.
///
/// Obtained from [`SdkBody::rebuilder`].
#[derive(Clone)]
pub struct BodyRebuilder(RebuildFrom);

#[derive(Clone)]
enum RebuildFrom {
    Bytes(Option<Bytes>),
    Source(Arc<dyn (Fn() -> Inner) + Send + Sync>),
}

impl Debug for BodyRebuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            RebuildFrom::Bytes(bytes) => f.debug_tuple("BodyRebuilder").field(bytes).finish(),
            RebuildFrom::Source(_) => f.write_str("BodyRebuilder(<source>)"),
        }
    }
}

impl BodyRebuilder {
    /// Open a fresh copy of the body.
    pub fn rebuild(&self) -> SdkBody {
        match &self.0 {
            RebuildFrom::Bytes(inner) => SdkBody::from_inner(Inner::Once {
                inner: inner.clone(),
            }),
            RebuildFrom::Source(rebuild) => SdkBody {
                inner: rebuild(),
                rebuild: Some(rebuild.clone()),
            },
        }
    }
}

impl SdkBody {
    fn from_inner(inner: Inner) -> Self {
        Self {
            inner,
            rebuild: None,
        }
    }

    /// Construct an explicitly retryable SDK body
    ///
    /// _Note: This is probably not what you want_
    ///
    /// All bodies constructed from in-memory data (`String`, `Vec<u8>`, `Bytes`, etc.) are already
    /// retryable out of the box. If you want to read data from a file, you should construct the
    /// body so that `f` opens the source again on every call.
    pub fn retryable(f: impl Fn() -> SdkBody + Send + Sync + 'static) -> Self {
        let initial = f();
        SdkBody {
            inner: initial.inner,
            rebuild: Some(Arc::new(move || f().inner)),
        }
    }

    /// When an SdkBody is read, the inner data must be consumed. In order to do this, the SdkBody
    /// is swapped with a "taken" body. This "taken" body cannot be read but aids in debugging.
    pub fn taken() -> Self {
        Self::from_inner(Inner::Taken)
    }

    /// Create an empty SdkBody for requests and responses that don't transfer any data in the body.
    pub fn empty() -> Self {
        Self::from_inner(Inner::Once { inner: None })
    }

    /// Create a body from an async stream of chunks.
    ///
    /// The stream is polled as the transport has capacity, so a producer that is faster than
    /// the transport is held back instead of being buffered. `content_length`, when known,
    /// lets the transport send a `Content-Length` rather than chunked framing.
    pub fn from_stream<S, E>(stream: S, content_length: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
        E: Into<Error> + 'static,
    {
        Self::from_inner(Inner::Stream {
            inner: Box::pin(ErrInto { inner: stream }),
            content_length,
        })
    }

    /// Create a body from a blocking reader.
    ///
    /// Reader-backed bodies are meant for synchronous transports. Polling one from an async
    /// context performs a blocking read.
    pub fn from_reader(
        reader: impl Read + Send + Sync + 'static,
        content_length: Option<u64>,
    ) -> Self {
        Self::from_inner(Inner::Reader {
            inner: Box::new(reader),
            content_length,
        })
    }

    /// If this SdkBody is NOT streaming, this will return the byte slab
    /// If this SdkBody is streaming, this will return `None`
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            Inner::Once { inner: Some(b) } => Some(b),
            Inner::Once { inner: None } => Some(&[]),
            _ => None,
        }
    }

    /// Returns true if the body is backed by a stream or a reader.
    pub fn is_streaming(&self) -> bool {
        matches!(self.inner, Inner::Stream { .. } | Inner::Reader { .. })
    }

    /// Returns true if a fresh copy of this body, starting at the first byte, can be produced.
    pub fn is_replayable(&self) -> bool {
        self.rebuild.is_some() || matches!(self.inner, Inner::Once { .. })
    }

    /// Attempt to clone this SdkBody. This will fail if the inner data is not cloneable, such as
    /// when it is a single-use stream that was not created with [`SdkBody::retryable`].
    pub fn try_clone(&self) -> Option<Self> {
        if let Some(rebuild) = &self.rebuild {
            return Some(SdkBody {
                inner: rebuild(),
                rebuild: Some(rebuild.clone()),
            });
        }
        match &self.inner {
            Inner::Once { inner } => Some(Self::from_inner(Inner::Once {
                inner: inner.clone(),
            })),
            _ => None,
        }
    }

    /// A handle that produces fresh copies of this body without holding one open.
    ///
    /// Returns `None` for the same bodies [`SdkBody::try_clone`] cannot copy. Unlike
    /// `try_clone`, nothing is opened until [`BodyRebuilder::rebuild`] is called.
    pub fn rebuilder(&self) -> Option<BodyRebuilder> {
        if let Some(rebuild) = &self.rebuild {
            return Some(BodyRebuilder(RebuildFrom::Source(rebuild.clone())));
        }
        match &self.inner {
            Inner::Once { inner } => Some(BodyRebuilder(RebuildFrom::Bytes(inner.clone()))),
            _ => None,
        }
    }

    /// Return the length, in bytes, of this SdkBody, if it is known.
    pub fn content_length(&self) -> Option<u64> {
        match &self.inner {
            Inner::Once { inner: None } => Some(0),
            Inner::Once { inner: Some(bytes) } => Some(bytes.len() as u64),
            Inner::Stream { content_length, .. } | Inner::Reader { content_length, .. } => {
                *content_length
            }
            Inner::Taken => None,
        }
    }

    /// Return true if this body has no more data to yield.
    pub fn is_end_stream(&self) -> bool {
        match &self.inner {
            Inner::Once { inner: None } => true,
            Inner::Once { inner: Some(bytes) } => bytes.is_empty(),
            Inner::Stream { .. } | Inner::Reader { .. } => false,
            Inner::Taken => true,
        }
    }

    /// Poll for the next chunk of data.
    pub fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Error>>> {
        match &mut self.inner {
            Inner::Once { inner } => match inner.take() {
                Some(bytes) if !bytes.is_empty() => Poll::Ready(Some(Ok(bytes))),
                _ => Poll::Ready(None),
            },
            Inner::Stream { inner, .. } => inner.as_mut().poll_next(cx),
            Inner::Reader { inner, .. } => {
                let mut buf = vec![0; READ_CHUNK_SIZE];
                match inner.read(&mut buf) {
                    Ok(0) => Poll::Ready(None),
                    Ok(n) => {
                        buf.truncate(n);
                        Poll::Ready(Some(Ok(Bytes::from(buf))))
                    }
                    Err(err) => Poll::Ready(Some(Err(err.into()))),
                }
            }
            Inner::Taken => Poll::Ready(Some(Err("A `Taken` body should never be polled".into()))),
        }
    }

    /// Convert this body into a blocking reader.
    ///
    /// In-memory and reader-backed bodies can be read this way. Async streams cannot; reading
    /// one returns an [`io::ErrorKind::Unsupported`] error.
    pub fn into_reader(self) -> BodyReader {
        let state = match self.inner {
            Inner::Once { inner } => ReaderState::Bytes(inner.unwrap_or_default().reader()),
            Inner::Reader { inner, .. } => ReaderState::Reader(inner),
            Inner::Stream { .. } => ReaderState::AsyncOnly,
            Inner::Taken => ReaderState::Taken,
        };
        BodyReader { state }
    }
}

/// Blocking reader over an [`SdkBody`], returned by [`SdkBody::into_reader`].
pub struct BodyReader {
    state: ReaderState,
}

enum ReaderState {
    Bytes(bytes::buf::Reader<Bytes>),
    Reader(BoxReader),
    AsyncOnly,
    Taken,
}

impl Debug for BodyReader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyReader").finish_non_exhaustive()
    }
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            ReaderState::Bytes(bytes) => bytes.read(buf),
            ReaderState::Reader(reader) => reader.read(buf),
            ReaderState::AsyncOnly => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "an async streaming body cannot be read by a blocking reader",
            )),
            ReaderState::Taken => Err(io::Error::new(
                io::ErrorKind::Other,
                "A `Taken` body should never be read",
            )),
        }
    }
}

pin_project! {
    struct ErrInto<S> {
        #[pin]
        inner: S,
    }
}

impl<S, E> Stream for ErrInto<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<Error>,
{
    type Item = Result<Bytes, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.project().inner.poll_next(cx) {
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err.into()))),
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl http_body::Body for SdkBody {
    type Data = Bytes;
    type Error = Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(http_body::Frame::data(bytes)))),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        SdkBody::is_end_stream(self)
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self.content_length() {
            Some(len) => http_body::SizeHint::with_exact(len),
            None => http_body::SizeHint::default(),
        }
    }
}

impl From<&str> for SdkBody {
    fn from(s: &str) -> Self {
        Self::from(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for SdkBody {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl From<Bytes> for SdkBody {
    fn from(bytes: Bytes) -> Self {
        Self::from_inner(Inner::Once { inner: Some(bytes) })
    }
}

impl From<Vec<u8>> for SdkBody {
    fn from(data: Vec<u8>) -> Self {
        Self::from(Bytes::from(data))
    }
}

impl From<&[u8]> for SdkBody {
    fn from(data: &[u8]) -> Self {
        Self::from(Bytes::copy_from_slice(data))
    }
}
