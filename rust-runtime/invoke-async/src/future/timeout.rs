/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

// This code was copied and then modified from Tokio.

//! Provides the [`Timeout`] future for racing another future against a sleep.

use crate::rt::sleep::{AsyncSleep, Sleep};
use pin_project_lite::pin_project;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Error returned when a [`Timeout`] elapses before its future completes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimedOutError {
    after: Option<Duration>,
}

impl TimedOutError {
    /// How long the future was given before it timed out, if known.
    pub fn after(&self) -> Option<Duration> {
        self.after
    }
}

impl Error for TimedOutError {}

impl fmt::Display for TimedOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.after {
            Some(after) => write!(f, "timed out after {after:?}"),
            None => f.write_str("timed out"),
        }
    }
}

pin_project! {
    /// Future that resolves to `Err(TimedOutError)` if `sleep` completes before `value`.
    ///
    /// When no sleep is set, the future never times out.
    #[non_exhaustive]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    #[derive(Debug)]
    pub struct Timeout<T, S> {
        #[pin]
        value: T,
        #[pin]
        sleep: Option<S>,
        after: Option<Duration>,
    }
}

impl<T, S> Timeout<T, S> {
    /// Races `value` against `sleep`.
    pub fn new(value: T, sleep: S) -> Timeout<T, S> {
        Timeout {
            value,
            sleep: Some(sleep),
            after: None,
        }
    }

    /// Wraps `value` without a timeout.
    pub fn no_timeout(value: T) -> Timeout<T, S> {
        Timeout {
            value,
            sleep: None,
            after: None,
        }
    }
}

impl<T> Timeout<T, Sleep> {
    /// Races `value` against `duration` on the given sleep implementation, if a duration is set.
    pub fn maybe(value: T, sleep_impl: &dyn AsyncSleep, duration: Option<Duration>) -> Self {
        match duration {
            Some(duration) => Timeout {
                value,
                sleep: Some(sleep_impl.sleep(duration)),
                after: Some(duration),
            },
            None => Self::no_timeout(value),
        }
    }
}

impl<T, S> Future for Timeout<T, S>
where
    T: Future,
    S: Future,
{
    type Output = Result<T::Output, TimedOutError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();

        // The value wins a tie with the timer
        if let Poll::Ready(v) = me.value.poll(cx) {
            return Poll::Ready(Ok(v));
        }

        match me.sleep.as_pin_mut() {
            Some(sleep) => match sleep.poll(cx) {
                Poll::Ready(_) => Poll::Ready(Err(TimedOutError { after: *me.after })),
                Poll::Pending => Poll::Pending,
            },
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TimedOutError, Timeout};
    use std::future::{pending, ready, Pending, Ready};

    #[tokio::test]
    async fn value_before_timer() {
        assert_eq!(Ok(5), Timeout::new(ready(5), pending::<()>()).await);
    }

    #[tokio::test]
    async fn timer_before_value() {
        assert_eq!(
            Err(TimedOutError { after: None }),
            Timeout::new(pending::<i32>(), ready(())).await
        );
    }

    #[tokio::test]
    async fn value_wins_a_tie() {
        assert_eq!(Ok("value"), Timeout::new(ready("value"), ready(())).await);
    }

    #[tokio::test]
    async fn no_timeout_waits_for_value() {
        let f: Timeout<Ready<u8>, Pending<()>> = Timeout::no_timeout(ready(1));
        assert_eq!(Ok(1), f.await);
    }
}
