/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

mod common;

use bytes::Bytes;
use common::*;
use invoke_async::rt::sleep::{SharedAsyncSleep, TokioSleep};
use invoke_async::test_util::InstantSleep;
use invoke_runtime::client::orchestrator::AsyncClientHandler;
use invoke_runtime::client::transfer::AsyncRequestBody;
use invoke_runtime::test_util::metrics::RecordingPublisher;
use invoke_runtime::test_util::transport::{capture_request, SequenceClient};
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::config::{ClientConfigurationBuilder, TimeoutConfig};
use invoke_runtime_api::client::http::{AsyncHttpClient, HttpConnectorFuture, HttpRequest};
use invoke_runtime_api::client::metrics::core_metrics::{
    API_CALL_SUCCESSFUL, ERROR_TYPE, RETRY_COUNT,
};
use invoke_runtime_api::client::metrics::MetricValue;
use invoke_runtime_api::client::request::RequestOverrideConfiguration;
use invoke_runtime_api::client::result::SdkError;
use pretty_assertions::assert_eq;
use std::convert::Infallible;
use std::time::Duration;

fn handler(builder: ClientConfigurationBuilder) -> AsyncClientHandler {
    AsyncClientHandler::new(
        builder
            .sleep_impl(SharedAsyncSleep::new(InstantSleep::new()))
            .build()
            .unwrap(),
    )
    .unwrap()
}

/// A transport whose responses never arrive.
#[derive(Debug)]
struct NeverResponds;

impl AsyncHttpClient for NeverResponds {
    fn call(&self, _request: HttpRequest) -> HttpConnectorFuture {
        HttpConnectorFuture::new(std::future::pending())
    }
}

#[tokio::test]
async fn resolves_to_the_parsed_output() {
    let transport = SequenceClient::responses([json(200, r#"{"Item":"async"}"#)]);
    let handler = handler(config().async_http_client(transport.clone().into_async()));
    let output = handler
        .execute_async(get_item(GetItemInput::new("k")))
        .await
        .unwrap();
    assert_eq!(output.item.as_deref(), Some("async"));
    assert_eq!(transport.requests()[0].body_str(), r#"{"Key":"k"}"#);
}

#[tokio::test]
async fn nothing_is_sent_until_polled() {
    let transport = SequenceClient::responses([json(200, "{}")]);
    let handler = handler(config().async_http_client(transport.clone().into_async()));
    let future = handler.execute_async(get_item(GetItemInput::new("k")));
    assert_eq!(transport.request_count(), 0);
    future.await.unwrap();
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn retries_with_backoff_from_the_sleep_impl() {
    let sleep = InstantSleep::new();
    let transport = SequenceClient::responses([
        json(503, "{}"),
        json(429, r#"{"__type":"ThrottlingException"}"#),
        json(200, r#"{"Item":"finally"}"#),
    ]);
    let handler = AsyncClientHandler::new(
        config()
            .async_http_client(transport.clone().into_async())
            .sleep_impl(SharedAsyncSleep::new(sleep.clone()))
            .build()
            .unwrap(),
    )
    .unwrap();
    let output = handler
        .execute_async(get_item(GetItemInput::new("k")))
        .await
        .unwrap();
    assert_eq!(output.item.as_deref(), Some("finally"));
    assert_eq!(transport.request_count(), 3);
    assert_eq!(sleep.logs().len(), 2);
}

#[tokio::test]
async fn every_completion_publishes_once() {
    let cases = [
        (json(200, r#"{"Item":"v"}"#), None),
        (
            json(400, r#"{"__type":"InvalidInput","Field":"Key"}"#),
            Some(true),
        ),
        (json(400, r#"{"__type":"Nope"}"#), Some(false)),
    ];
    for (response, failure) in cases {
        let publisher = RecordingPublisher::new();
        let transport = SequenceClient::responses([response]);
        let handler = handler(
            config()
                .async_http_client(transport.into_async())
                .metric_publisher(publisher.clone()),
        );
        let result = handler
            .execute_async(get_item(GetItemInput::new("k")))
            .await;
        match (result, failure) {
            (Ok(output), None) => assert_eq!(output.item.as_deref(), Some("v")),
            (Err(err), Some(mapped)) => {
                assert!(matches!(err, SdkError::ServiceError(_)), "{err:?}");
                assert_eq!(err.into_service_error().is_invalid_input(), mapped);
            }
            (result, failure) => panic!("unexpected {result:?} for {failure:?}"),
        }

        assert_eq!(publisher.published().len(), 1);
        let call = publisher.expect_single();
        assert_eq!(
            call.first_value(API_CALL_SUCCESSFUL),
            Some(&MetricValue::Bool(failure.is_none()))
        );
        assert_eq!(call.first_value(RETRY_COUNT), Some(&MetricValue::Integer(0)));
    }
}

#[tokio::test]
async fn construction_failures_complete_immediately() {
    let (capture, request) = capture_request(None);
    let publisher = RecordingPublisher::new();
    let handler = handler(
        config()
            .async_http_client(capture.into_async())
            .metric_publisher(publisher.clone()),
    );
    let future = handler.execute_async(
        put_data(Some("no_underscores")).with_async_request_body(AsyncRequestBody::from_bytes("x")),
    );
    assert!(future.is_ready_now());
    // the call already published before anyone polled it
    let published = publisher.expect_single();
    assert_eq!(
        published.first_value(ERROR_TYPE),
        Some(&MetricValue::from("ConstructionFailure"))
    );

    let err = future.await.unwrap_err();
    assert!(matches!(err, SdkError::ConstructionFailure(_)), "{err:?}");
    request.expect_no_request();
    assert_eq!(publisher.published().len(), 1);
}

#[tokio::test]
async fn missing_async_transport_is_a_construction_failure() {
    let future = handler(config()).execute_async(get_item(GetItemInput::new("k")));
    assert!(future.is_ready_now());
    assert!(matches!(
        future.await.unwrap_err(),
        SdkError::ConstructionFailure(_)
    ));
}

#[tokio::test]
async fn operation_timeout_bounds_the_whole_call() {
    let handler = AsyncClientHandler::new(
        config()
            .async_http_client(NeverResponds)
            .sleep_impl(SharedAsyncSleep::new(TokioSleep::new()))
            .timeout_config(
                TimeoutConfig::disabled().with_operation_timeout(Duration::from_millis(20)),
            )
            .build()
            .unwrap(),
    )
    .unwrap();
    let err = handler
        .execute_async(get_item(GetItemInput::new("k")))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::TimeoutError(_)), "{err:?}");
}

#[tokio::test]
async fn request_timeouts_override_the_client() {
    let handler = AsyncClientHandler::new(
        config()
            .async_http_client(NeverResponds)
            .sleep_impl(SharedAsyncSleep::new(TokioSleep::new()))
            .build()
            .unwrap(),
    )
    .unwrap();
    let with_timeout = RequestOverrideConfiguration::builder()
        .operation_attempt_timeout(Duration::from_millis(10))
        .build();
    let err = handler
        .execute_async(get_item(GetItemInput::new("k").with_override(with_timeout)))
        .await
        .unwrap_err();
    // every attempt timed out, and the last timeout is what the caller sees
    assert!(matches!(err, SdkError::TimeoutError(_)), "{err:?}");
}

#[tokio::test]
async fn dropping_the_future_cancels_the_call() {
    let publisher = RecordingPublisher::new();
    let handler = AsyncClientHandler::new(
        config()
            .async_http_client(NeverResponds)
            .sleep_impl(SharedAsyncSleep::new(TokioSleep::new()))
            .metric_publisher(publisher.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    let future = handler.execute_async(get_item(GetItemInput::new("k")));
    let elapsed = tokio::time::timeout(Duration::from_millis(10), future).await;
    assert!(elapsed.is_err());

    let published = publisher.expect_single();
    assert_eq!(
        published.first_value(API_CALL_SUCCESSFUL),
        Some(&MetricValue::Bool(false))
    );
    assert_eq!(
        published.first_value(ERROR_TYPE),
        Some(&MetricValue::from("Cancelled"))
    );
}

#[tokio::test]
async fn streamed_bodies_are_replayed() {
    let transport = SequenceClient::responses([json(500, "{}"), json(200, "{}")]);
    let handler = handler(config().async_http_client(transport.clone().into_async()));
    let body = AsyncRequestBody::from_stream_provider(None, || {
        tokio_stream::iter(["chunk-1 ", "chunk-2"].map(|chunk| {
            Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
        }))
    });
    handler
        .execute_async(
            put_data(Some("acct"))
                .with_async_request_body(body)
                .with_transfer_encoding(true),
        )
        .await
        .unwrap();
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert_eq!(request.body_str(), "chunk-1 chunk-2");
        assert_eq!(request.header("transfer-encoding"), Some("chunked"));
    }
}

#[tokio::test]
async fn streaming_responses_reach_the_transformer() {
    let transport = SequenceClient::responses([http::Response::builder()
        .status(200)
        .header("content-type", "application/octet-stream")
        .body("blob".into())
        .unwrap()]);
    let handler = handler(config().async_http_client(transport.into_async()));
    let (content_type, content) = handler
        .execute_async_streaming(get_blob("k"), |output, body| async move {
            let content = body.collect().await?;
            Ok::<_, BoxError>((output.content_type, content))
        })
        .await
        .unwrap();
    assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(content.as_ref(), b"blob");
}

#[tokio::test]
async fn overridden_client_signers_keep_precedence_when_streaming() {
    let (capture, request) = capture_request(None);
    let handler = handler(
        config()
            .async_http_client(capture.into_async())
            .signer_override(NamedSigner("customer")),
    );
    handler
        .execute_async_streaming(
            get_blob("k").with_signer_override(NamedSigner("operation")),
            |_, _| async move { Ok::<_, BoxError>(()) },
        )
        .await
        .unwrap();
    assert_eq!(
        request.expect_request().headers()["authorization"],
        "customer GetBlob"
    );
}

#[tokio::test]
async fn operation_signers_apply_without_a_client_override() {
    let (capture, request) = capture_request(None);
    let handler = handler(
        config()
            .async_http_client(capture.into_async())
            .signer(NamedSigner("customer")),
    );
    handler
        .execute_async_streaming(
            get_blob("k").with_signer_override(NamedSigner("operation")),
            |_, _| async move { Ok::<_, BoxError>(()) },
        )
        .await
        .unwrap();
    assert_eq!(
        request.expect_request().headers()["authorization"],
        "operation GetBlob"
    );
}
