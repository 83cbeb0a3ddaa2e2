/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

mod common;

use common::*;
use invoke_runtime::client::orchestrator::SyncClientHandler;
use invoke_runtime::test_util::metrics::RecordingPublisher;
use invoke_runtime::test_util::transport::SequenceClient;
use invoke_runtime_api::client::metrics::core_metrics::*;
use invoke_runtime_api::client::metrics::test_util::recording_collectors_created;
use invoke_runtime_api::client::metrics::{MetricCollection, MetricPublisher, MetricValue};
use invoke_runtime_api::client::request::RequestOverrideConfiguration;
use invoke_runtime_api::client::result::ConnectorError;
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Broken;

impl MetricPublisher for Broken {
    fn publish(&self, _metrics: &MetricCollection) {
        panic!("cannot publish");
    }
}

#[test]
fn successful_calls_publish_once() {
    let publisher = RecordingPublisher::new();
    let transport = SequenceClient::responses([json(200, r#"{"Item":"v"}"#)]);
    let handler = SyncClientHandler::new(
        config()
            .http_client(transport.into_sync())
            .metric_publisher(publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    handler.execute(get_item(GetItemInput::new("k"))).unwrap();

    let call = publisher.expect_single();
    assert_eq!(call.name(), "ApiCall");
    assert_eq!(call.first_value(SERVICE_ID), Some(&MetricValue::from(SERVICE)));
    assert_eq!(
        call.first_value(OPERATION_NAME),
        Some(&MetricValue::from("GetItem"))
    );
    assert_eq!(
        call.first_value(API_CALL_SUCCESSFUL),
        Some(&MetricValue::Bool(true))
    );
    assert_eq!(call.first_value(RETRY_COUNT), Some(&MetricValue::Integer(0)));
    assert!(call.first_value(API_CALL_DURATION).is_some());
    assert!(call.first_value(ERROR_TYPE).is_none());

    let [attempt] = call.children() else {
        panic!("expected one attempt, got {:#?}", call.children());
    };
    assert_eq!(attempt.name(), "ApiCallAttempt");
    assert_eq!(
        attempt.first_value(HTTP_STATUS_CODE),
        Some(&MetricValue::Integer(200))
    );
    assert!(attempt.first_value(SERVICE_CALL_DURATION).is_some());
    assert!(attempt.first_value(MARSHALLING_DURATION).is_some());
}

#[test]
fn retried_calls_report_each_attempt() {
    let publisher = RecordingPublisher::new();
    let transport = SequenceClient::new([
        Err(ConnectorError::io("connection reset".into())),
        Ok(json(500, "{}")),
        Ok(json(200, "{}")),
    ]);
    let handler = SyncClientHandler::new(
        config()
            .http_client(transport.into_sync())
            .metric_publisher(publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    handler.execute(get_item(GetItemInput::new("k"))).unwrap();

    let call = publisher.expect_single();
    assert_eq!(call.first_value(RETRY_COUNT), Some(&MetricValue::Integer(2)));
    let statuses: Vec<_> = call
        .children()
        .iter()
        .map(|attempt| attempt.first_value(HTTP_STATUS_CODE).cloned())
        .collect();
    assert_eq!(
        statuses,
        vec![
            None,
            Some(MetricValue::Integer(500)),
            Some(MetricValue::Integer(200))
        ]
    );
    // only attempts that were followed by another one waited first
    let backoffs = call
        .children()
        .iter()
        .filter(|attempt| attempt.first_value(BACKOFF_DELAY_DURATION).is_some())
        .count();
    assert_eq!(backoffs, 2);
    assert!(call
        .children()
        .iter()
        .all(|attempt| attempt.first_value(MARSHALLING_DURATION).is_some()));
}

#[test]
fn failures_record_the_error_type() {
    let publisher = RecordingPublisher::new();
    let transport =
        SequenceClient::responses([json(400, r#"{"__type":"InvalidInput","Field":"Key"}"#)]);
    let handler = SyncClientHandler::new(
        config()
            .http_client(transport.into_sync())
            .metric_publisher(publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    let err = handler.execute(get_item(GetItemInput::new("k"))).unwrap_err();

    let call = publisher.expect_single();
    assert_eq!(
        call.first_value(API_CALL_SUCCESSFUL),
        Some(&MetricValue::Bool(false))
    );
    assert_eq!(
        call.first_value(ERROR_TYPE),
        Some(&MetricValue::from(err.kind_name()))
    );
    assert_eq!(err.kind_name(), "ServiceError");
}

#[test]
fn unmapped_failures_publish_once() {
    let publisher = RecordingPublisher::new();
    let transport = SequenceClient::responses([json(400, r#"{"__type":"Nope"}"#)]);
    let handler = SyncClientHandler::new(
        config()
            .http_client(transport.into_sync())
            .metric_publisher(publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    let err = handler.execute(get_item(GetItemInput::new("k"))).unwrap_err();
    assert!(matches!(
        err.into_service_error(),
        JsonServiceError::Unhandled(_)
    ));

    assert_eq!(publisher.published().len(), 1);
    let call = publisher.expect_single();
    assert_eq!(
        call.first_value(API_CALL_SUCCESSFUL),
        Some(&MetricValue::Bool(false))
    );
    assert_eq!(
        call.first_value(ERROR_TYPE),
        Some(&MetricValue::from("ServiceError"))
    );
}

#[test]
fn without_publishers_nothing_is_recorded() {
    let transport = SequenceClient::responses([json(200, "{}")]);
    let handler = SyncClientHandler::new(
        config().http_client(transport.into_sync()).build().unwrap(),
    )
    .unwrap();
    let before = recording_collectors_created();
    handler.execute(get_item(GetItemInput::new("k"))).unwrap();
    assert_eq!(recording_collectors_created(), before);
}

#[test]
fn request_publishers_replace_the_client_publishers() {
    let client_publisher = RecordingPublisher::new();
    let request_publisher = RecordingPublisher::new();
    let transport = SequenceClient::responses([json(200, "{}"), json(200, "{}")]);
    let handler = SyncClientHandler::new(
        config()
            .http_client(transport.into_sync())
            .metric_publisher(client_publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();

    let override_config = RequestOverrideConfiguration::builder()
        .metric_publisher(request_publisher.clone())
        .build();
    handler
        .execute(get_item(
            GetItemInput::new("k").with_override(override_config),
        ))
        .unwrap();
    assert_eq!(client_publisher.published().len(), 0);
    assert_eq!(request_publisher.published().len(), 1);

    handler.execute(get_item(GetItemInput::new("k"))).unwrap();
    assert_eq!(client_publisher.published().len(), 1);
    assert_eq!(request_publisher.published().len(), 1);
}

#[test]
fn a_broken_publisher_does_not_fail_the_call() {
    let publisher = RecordingPublisher::new();
    let transport = SequenceClient::responses([json(200, r#"{"Item":"v"}"#)]);
    let handler = SyncClientHandler::new(
        config()
            .http_client(transport.into_sync())
            .metric_publisher(Broken)
            .metric_publisher(publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    let output = handler.execute(get_item(GetItemInput::new("k"))).unwrap();
    assert_eq!(output.item.as_deref(), Some("v"));
    publisher.expect_single();
}
