/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Test utilities for time and sleep

use crate::rt::sleep::{AsyncSleep, Sleep};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A sleep implementation that returns immediately and records every requested duration.
///
/// Useful for asserting on the backoff a retry strategy asked for without waiting for it.
#[derive(Clone, Debug, Default)]
pub struct InstantSleep {
    log: Arc<Mutex<Vec<Duration>>>,
}

impl InstantSleep {
    /// Create a new [`InstantSleep`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the durations that were requested, in order.
    pub fn logs(&self) -> Vec<Duration> {
        self.log.lock().unwrap().clone()
    }

    /// Return the sum of all requested durations.
    pub fn total_duration(&self) -> Duration {
        self.log.lock().unwrap().iter().sum()
    }
}

impl AsyncSleep for InstantSleep {
    fn sleep(&self, duration: Duration) -> Sleep {
        self.log.lock().unwrap().push(duration);
        Sleep::new(std::future::ready(()))
    }
}
