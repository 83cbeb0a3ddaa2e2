/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_runtime_api::client::metrics::{MetricCollection, MetricPublisher};
use std::sync::{Arc, Mutex};

/// Publisher that keeps every collection it receives.
///
/// Clones share the same store, so one copy can be handed to the client while the test keeps
/// another.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<MetricCollection>>>,
}

impl RecordingPublisher {
    /// Create an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every collection published so far, oldest first.
    pub fn published(&self) -> Vec<MetricCollection> {
        self.published.lock().unwrap().clone()
    }

    /// The only collection published so far.
    ///
    /// # Panics
    /// If nothing, or more than one collection, was published.
    #[track_caller]
    pub fn expect_single(&self) -> MetricCollection {
        let published = self.published();
        assert_eq!(
            published.len(),
            1,
            "expected exactly one published collection, got {published:#?}"
        );
        published.into_iter().next().unwrap()
    }
}

impl MetricPublisher for RecordingPublisher {
    fn publish(&self, metrics: &MetricCollection) {
        self.published.lock().unwrap().push(metrics.clone());
    }
}
