/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Provides an [`AsyncSleep`] trait that returns a future that sleeps for a given duration.
//!
//! The async execution engine sleeps between retry attempts and races transport futures
//! against timeouts; both go through this trait so the engine stays runtime agnostic.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// A source of timers.
///
/// Implementations hand out [`Sleep`] futures that complete once `duration` has elapsed on
/// whatever clock they use. Tests substitute a clock that never waits.
pub trait AsyncSleep: fmt::Debug + Send + Sync {
    /// A future that completes after `duration`.
    fn sleep(&self, duration: Duration) -> Sleep;
}

/// A cloneable, type-erased [`AsyncSleep`].
#[derive(Clone, Debug)]
pub struct SharedAsyncSleep(Arc<dyn AsyncSleep>);

impl SharedAsyncSleep {
    /// Wrap `sleep` so it can be shared between clients and calls.
    pub fn new(sleep: impl AsyncSleep + 'static) -> Self {
        Self(Arc::new(sleep))
    }
}

impl AsRef<dyn AsyncSleep> for SharedAsyncSleep {
    fn as_ref(&self) -> &(dyn AsyncSleep + 'static) {
        &*self.0
    }
}

impl AsyncSleep for SharedAsyncSleep {
    fn sleep(&self, duration: Duration) -> Sleep {
        self.0.sleep(duration)
    }
}

/// The sleep that backs retry backoff and timeouts when none is configured.
///
/// This is `None` unless the `rt-tokio` feature is enabled.
pub fn default_async_sleep() -> Option<SharedAsyncSleep> {
    #[cfg(feature = "rt-tokio")]
    return Some(SharedAsyncSleep::new(TokioSleep::new()));
    #[cfg(not(feature = "rt-tokio"))]
    return None;
}

/// The timer future handed out by an [`AsyncSleep`].
#[non_exhaustive]
#[must_use = "a sleep does nothing unless awaited"]
pub struct Sleep(Pin<Box<dyn Future<Output = ()> + Send + 'static>>);

impl fmt::Debug for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sleep(..)")
    }
}

impl Sleep {
    /// Box `timer` as a `Sleep`.
    pub fn new(timer: impl Future<Output = ()> + Send + 'static) -> Sleep {
        Sleep(Box::pin(timer))
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.0.as_mut().poll(cx)
    }
}

/// [`AsyncSleep`] on the tokio timer wheel.
///
/// Sleeping requires a tokio runtime with the time driver enabled.
#[non_exhaustive]
#[cfg(feature = "rt-tokio")]
#[derive(Debug, Default)]
pub struct TokioSleep;

#[cfg(feature = "rt-tokio")]
impl TokioSleep {
    /// A sleep that uses `tokio::time::sleep`.
    pub fn new() -> TokioSleep {
        TokioSleep
    }
}

#[cfg(feature = "rt-tokio")]
impl AsyncSleep for TokioSleep {
    fn sleep(&self, duration: Duration) -> Sleep {
        Sleep::new(tokio::time::sleep(duration))
    }
}

#[cfg(all(test, feature = "rt-tokio"))]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_sleep_advances_paused_clock() {
        let sleep = default_async_sleep().expect("rt-tokio is enabled");
        let start = tokio::time::Instant::now();
        sleep.sleep(Duration::from_secs(3)).await;
        assert!(tokio::time::Instant::now() - start >= Duration::from_secs(3));
    }
}
