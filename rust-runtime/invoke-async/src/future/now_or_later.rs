/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Provides the [`NowOrLater`] future with an explicit `Now` variant.
//!
//! The async execution engine hands out a future even when a call fails before any I/O
//! is started. Those failures resolve through the `Now` variant without boxing anything.

use pin_project_lite::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Boxed future type alias
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pin_project! {
    /// Future with an explicit "Now" variant
    ///
    /// When a future is immediately ready, this enables avoiding an unnecessary allocation.
    /// This is intended to be used with `Pin<Box<dyn Future>>` or similar as the future variant.
    pub struct NowOrLater<T, F> {
        #[pin]
        inner: Inner<T, F>
    }
}

impl<T, F> fmt::Debug for NowOrLater<T, F>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NowOrLater")
            .field("inner", &self.inner)
            .finish()
    }
}

pin_project! {
    #[project = NowOrLaterProj]
    enum Inner<T, F> {
        Now { value: Option<T> },
        Later { #[pin] future: F },
    }
}

impl<T, F> fmt::Debug for Inner<T, F>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now { value } => f.debug_struct("Now").field("value", value).finish(),
            Self::Later { .. } => f.debug_struct("Later").finish_non_exhaustive(),
        }
    }
}

impl<T, F> NowOrLater<T, F> {
    /// Creates a future that will resolve when `future` resolves
    pub fn new(future: F) -> Self {
        Self {
            inner: Inner::Later { future },
        }
    }

    /// Creates a future that immediately resolves to `value`
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Now { value: Some(value) },
        }
    }

    /// Returns true if this future resolves without awaiting anything.
    pub fn is_now(&self) -> bool {
        matches!(self.inner, Inner::Now { .. })
    }
}

impl<T, F> Future for NowOrLater<T, F>
where
    F: Future<Output = T>,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().inner.project() {
            NowOrLaterProj::Now { value } => {
                Poll::Ready(value.take().expect("cannot be called twice"))
            }
            NowOrLaterProj::Later { future } => future.poll(cx),
        }
    }
}
