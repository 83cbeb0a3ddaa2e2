/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_runtime_api::client::metrics::core_metrics::{
    API_CALL_DURATION, API_CALL_SUCCESSFUL, ERROR_TYPE, OPERATION_NAME, SERVICE_ID,
};
use invoke_runtime_api::client::metrics::{
    MetricCollection, MetricCollector, MetricPublisher, SharedMetricPublisher,
};
use invoke_runtime_api::client::result::SdkError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::warn;

const API_CALL: &str = "ApiCall";
const API_CALL_ATTEMPT: &str = "ApiCallAttempt";
const CANCELLED: &str = "Cancelled";

/// The metrics of one call.
///
/// The collected metrics are published to every publisher exactly once: by
/// [`finish`](MetricsScope::finish) when the call completes, or when the scope is dropped
/// if the call never completed (for example because its future was dropped). A call without
/// publishers records nothing.
#[derive(Debug)]
pub struct MetricsScope {
    collector: MetricCollector,
    publishers: Option<Vec<SharedMetricPublisher>>,
    start: Instant,
}

impl MetricsScope {
    /// Open the scope of a call to `operation_name`.
    pub fn open(
        service_id: &str,
        operation_name: &str,
        publishers: Vec<SharedMetricPublisher>,
    ) -> Self {
        let collector = if publishers.is_empty() {
            MetricCollector::no_op()
        } else {
            MetricCollector::recording(API_CALL)
        };
        collector.report(SERVICE_ID, service_id);
        collector.report(OPERATION_NAME, operation_name);
        Self {
            collector,
            publishers: Some(publishers),
            start: Instant::now(),
        }
    }

    /// The call's collector.
    pub fn collector(&self) -> &MetricCollector {
        &self.collector
    }

    /// A collector for one attempt, nested under the call's collector.
    pub fn attempt(&self) -> MetricCollector {
        self.collector.create_child(API_CALL_ATTEMPT)
    }

    /// Record how the call ended and publish.
    pub fn finish<T, E, R>(mut self, result: &Result<T, SdkError<E, R>>) {
        self.collector.report(API_CALL_SUCCESSFUL, result.is_ok());
        self.collector.report(API_CALL_DURATION, self.start.elapsed());
        if let Err(err) = result {
            self.collector.report(ERROR_TYPE, err.kind_name());
        }
        self.publish();
    }

    fn publish(&mut self) {
        let Some(publishers) = self.publishers.take() else {
            return;
        };
        if publishers.is_empty() {
            return;
        }
        let collection = self.collector.collect();
        for publisher in &publishers {
            publish_to(publisher, &collection);
        }
    }
}

fn publish_to(publisher: &SharedMetricPublisher, collection: &MetricCollection) {
    // one failing publisher must not keep the others from seeing the call
    if catch_unwind(AssertUnwindSafe(|| publisher.publish(collection))).is_err() {
        warn!(?publisher, "metric publisher panicked while publishing");
    }
}

impl Drop for MetricsScope {
    fn drop(&mut self) {
        if self.publishers.is_none() {
            return;
        }
        self.collector.report(API_CALL_SUCCESSFUL, false);
        self.collector.report(API_CALL_DURATION, self.start.elapsed());
        self.collector.report(ERROR_TYPE, CANCELLED);
        self.publish();
    }
}
