/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Per-call metric collection and publishing.
//!
//! Every call gets one [`MetricCollector`]. When no [`MetricPublisher`] is configured the
//! collector is a no-op that allocates nothing; otherwise it records every reported value
//! until the call finishes, at which point its [`MetricCollection`] is handed to each
//! publisher.

use crate::impl_shared_conversions;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Name of a metric.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MetricKey {
    name: &'static str,
}

impl MetricKey {
    /// Creates a metric key with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The metric's name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Metrics reported by the execution engine.
pub mod core_metrics {
    use super::MetricKey;

    /// The service the call was made to.
    pub const SERVICE_ID: MetricKey = MetricKey::new("ServiceId");
    /// The operation that was called.
    pub const OPERATION_NAME: MetricKey = MetricKey::new("OperationName");
    /// Whether the call ended successfully.
    pub const API_CALL_SUCCESSFUL: MetricKey = MetricKey::new("ApiCallSuccessful");
    /// Wall clock time from the start of the call until it ended.
    pub const API_CALL_DURATION: MetricKey = MetricKey::new("ApiCallDuration");
    /// Time spent marshalling the request for one attempt.
    pub const MARSHALLING_DURATION: MetricKey = MetricKey::new("MarshallingDuration");
    /// Number of attempts beyond the first one.
    pub const RETRY_COUNT: MetricKey = MetricKey::new("RetryCount");
    /// The failure category of a call that did not succeed.
    pub const ERROR_TYPE: MetricKey = MetricKey::new("ErrorType");
    /// Time spent waiting on the transport during one attempt.
    pub const SERVICE_CALL_DURATION: MetricKey = MetricKey::new("ServiceCallDuration");
    /// HTTP status code of the response to one attempt.
    pub const HTTP_STATUS_CODE: MetricKey = MetricKey::new("HttpStatusCode");
    /// Backoff applied before one attempt.
    pub const BACKOFF_DELAY_DURATION: MetricKey = MetricKey::new("BackoffDelayDuration");
}

/// A recorded metric value.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    /// A string value.
    String(String),
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Integer(i64),
    /// A duration.
    Duration(Duration),
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for MetricValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u16> for MetricValue {
    fn from(value: u16) -> Self {
        Self::Integer(value.into())
    }
}

impl From<Duration> for MetricValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

/// One reported metric.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRecord {
    key: MetricKey,
    value: MetricValue,
}

impl MetricRecord {
    /// The metric that was reported.
    pub fn key(&self) -> MetricKey {
        self.key
    }

    /// The reported value.
    pub fn value(&self) -> &MetricValue {
        &self.value
    }
}

/// An immutable snapshot of everything a [`MetricCollector`] recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricCollection {
    name: String,
    records: Vec<MetricRecord>,
    children: Vec<MetricCollection>,
}

impl MetricCollection {
    /// The name the collector was opened with, for example `ApiCall`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every record, in the order it was reported.
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// All values reported for `key`, in the order they were reported.
    pub fn values_for(&self, key: MetricKey) -> Vec<&MetricValue> {
        self.records
            .iter()
            .filter(|record| record.key == key)
            .map(|record| &record.value)
            .collect()
    }

    /// The first value reported for `key`.
    pub fn first_value(&self, key: MetricKey) -> Option<&MetricValue> {
        self.records
            .iter()
            .find(|record| record.key == key)
            .map(|record| &record.value)
    }

    /// Collections of child collectors, in creation order.
    pub fn children(&self) -> &[MetricCollection] {
        &self.children
    }
}

#[derive(Debug)]
struct RecordingState {
    name: String,
    records: Vec<MetricRecord>,
    children: Vec<MetricCollector>,
}

/// Per-call metric accumulator.
///
/// Cloning a collector yields another handle to the same records. Reporting never fails and
/// never blocks for long; a no-op collector discards everything without allocating.
#[derive(Clone, Debug)]
pub struct MetricCollector {
    inner: Option<Arc<Mutex<RecordingState>>>,
}

impl MetricCollector {
    /// A collector that discards every report.
    pub fn no_op() -> Self {
        Self { inner: None }
    }

    /// A collector that records every report under `name`.
    pub fn recording(name: impl Into<String>) -> Self {
        #[cfg(feature = "test-util")]
        test_util::RECORDING_COLLECTORS.with(|count| count.set(count.get() + 1));
        Self {
            inner: Some(Arc::new(Mutex::new(RecordingState {
                name: name.into(),
                records: Vec::new(),
                children: Vec::new(),
            }))),
        }
    }

    /// Returns true if this collector records reports.
    pub fn is_recording(&self) -> bool {
        self.inner.is_some()
    }

    fn state(state: &Mutex<RecordingState>) -> MutexGuard<'_, RecordingState> {
        // A panic while reporting must not stop later reports or publishing
        state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `value` for `key`.
    pub fn report(&self, key: MetricKey, value: impl Into<MetricValue>) {
        if let Some(inner) = &self.inner {
            Self::state(inner).records.push(MetricRecord {
                key,
                value: value.into(),
            });
        }
    }

    /// Create a child collector whose collection is nested in this one's.
    ///
    /// The child of a no-op collector is also a no-op.
    pub fn create_child(&self, name: impl Into<String>) -> MetricCollector {
        match &self.inner {
            None => MetricCollector::no_op(),
            Some(inner) => {
                let child = MetricCollector::recording(name);
                Self::state(inner).children.push(child.clone());
                child
            }
        }
    }

    /// Snapshot everything recorded so far.
    pub fn collect(&self) -> MetricCollection {
        match &self.inner {
            None => MetricCollection {
                name: String::new(),
                records: Vec::new(),
                children: Vec::new(),
            },
            Some(inner) => {
                let state = Self::state(inner);
                MetricCollection {
                    name: state.name.clone(),
                    records: state.records.clone(),
                    children: state.children.iter().map(MetricCollector::collect).collect(),
                }
            }
        }
    }
}

/// A sink for collected metrics.
pub trait MetricPublisher: Send + Sync + fmt::Debug {
    /// Publish the metrics of one call.
    ///
    /// Called exactly once per call for every publisher configured for that call.
    fn publish(&self, metrics: &MetricCollection);

    /// Release any resources held by the publisher.
    fn close(&self) {}
}

/// Metric publisher that can be shared between clients and calls.
#[derive(Clone, Debug)]
pub struct SharedMetricPublisher(Arc<dyn MetricPublisher>);

impl SharedMetricPublisher {
    /// Creates a new [`SharedMetricPublisher`].
    pub fn new(publisher: impl MetricPublisher + 'static) -> Self {
        Self(Arc::new(publisher))
    }
}

impl MetricPublisher for SharedMetricPublisher {
    fn publish(&self, metrics: &MetricCollection) {
        self.0.publish(metrics)
    }

    fn close(&self) {
        self.0.close()
    }
}

impl_shared_conversions!(convert SharedMetricPublisher from MetricPublisher using SharedMetricPublisher::new);

/// Hooks for asserting on collector allocation in tests.
#[cfg(feature = "test-util")]
pub mod test_util {
    use std::cell::Cell;

    thread_local! {
        pub(super) static RECORDING_COLLECTORS: Cell<usize> = const { Cell::new(0) };
    }

    /// Number of recording collectors created on the current thread.
    ///
    /// Synchronous calls run entirely on the calling thread, so a test can compare this count
    /// before and after a call to see whether the call allocated a recording collector.
    pub fn recording_collectors_created() -> usize {
        RECORDING_COLLECTORS.with(Cell::get)
    }
}

#[cfg(test)]
mod tests {
    use super::core_metrics::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_op_collector_records_nothing() {
        let collector = MetricCollector::no_op();
        collector.report(SERVICE_ID, "Json Service");
        let child = collector.create_child("ApiCallAttempt");
        assert!(!child.is_recording());
        let collection = collector.collect();
        assert!(collection.records().is_empty());
        assert!(collection.children().is_empty());
    }

    #[test]
    fn recording_collector_nests_children() {
        let collector = MetricCollector::recording("ApiCall");
        collector.report(SERVICE_ID, "Json Service");
        collector.report(OPERATION_NAME, "EmptyInputOutput");
        let attempt = collector.create_child("ApiCallAttempt");
        attempt.report(HTTP_STATUS_CODE, 200u16);

        let collection = collector.collect();
        assert_eq!(collection.name(), "ApiCall");
        assert_eq!(
            collection.first_value(OPERATION_NAME),
            Some(&MetricValue::String("EmptyInputOutput".into()))
        );
        assert_eq!(collection.children().len(), 1);
        assert_eq!(
            collection.children()[0].first_value(HTTP_STATUS_CODE),
            Some(&MetricValue::Integer(200))
        );
    }
}
