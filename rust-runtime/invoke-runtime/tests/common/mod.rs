/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A small JSON service, shaped the way a generated client would describe it.

#![allow(dead_code)]

use http::{HeaderMap, Uri};
use invoke_runtime::client::orchestrator::{ClientExecutionParams, HostLabel, HostPrefix};
use invoke_runtime::client::protocol::{
    ErrorResponse, ExceptionDescriptor, ExceptionTable, InputShape, OperationMetadata,
    OutputShape, Protocol, ProtocolErrorResponseHandler, ProtocolMarshaller,
    ProtocolResponseHandler,
};
use invoke_runtime::client::retries::strategy::StandardRetryStrategy;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::auth::{Signer, SigningContext};
use invoke_runtime_api::client::config::{ClientConfiguration, ClientConfigurationBuilder};
use invoke_runtime_api::client::http::HttpRequest;
use invoke_runtime_api::client::request::{RequestOverrideConfiguration, SdkRequest};
use invoke_runtime_api::client::result::CreateUnhandledError;
use invoke_types::error::ProvideErrorMetadata;
use invoke_types::error::Unhandled;
use invoke_types::error::ErrorMetadata;
use invoke_types::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Duration;

pub const SERVICE: &str = "JsonService";

/// Client configuration talking to `https://json.example.com` that retries without waiting.
pub fn config() -> ClientConfigurationBuilder {
    ClientConfiguration::builder()
        .service_id(SERVICE)
        .endpoint(Uri::from_static("https://json.example.com"))
        .retry_strategy(StandardRetryStrategy::new(
            RetryConfig::standard().with_initial_backoff(Duration::ZERO),
        ))
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemInput {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    #[serde(skip)]
    pub override_config: Option<RequestOverrideConfiguration>,
}

impl GetItemInput {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_override(mut self, config: RequestOverrideConfiguration) -> Self {
        self.override_config = Some(config);
        self
    }
}

impl InputShape for GetItemInput {}

impl SdkRequest for GetItemInput {
    fn override_configuration(&self) -> Option<&RequestOverrideConfiguration> {
        self.override_config.as_ref()
    }

    fn with_override_configuration(mut self, config: RequestOverrideConfiguration) -> Self {
        self.override_config = Some(config);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    pub item: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

impl OutputShape for GetItemOutput {
    fn bind_response_headers(&mut self, headers: &HeaderMap) -> Result<(), BoxError> {
        self.request_id = headers
            .get("x-amzn-requestid")
            .map(|value| value.to_str())
            .transpose()?
            .map(str::to_owned);
        Ok(())
    }
}

#[derive(Debug)]
pub enum JsonServiceError {
    InvalidInput {
        meta: ErrorMetadata,
        field: Option<String>,
    },
    Unhandled(Unhandled),
}

impl JsonServiceError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, JsonServiceError::InvalidInput { .. })
    }
}

impl fmt::Display for JsonServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonServiceError::InvalidInput { .. } => write!(f, "invalid input"),
            JsonServiceError::Unhandled(_) => write!(f, "unhandled error"),
        }
    }
}

impl Error for JsonServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            JsonServiceError::Unhandled(inner) => Some(inner),
            _ => None,
        }
    }
}

impl ProvideErrorMetadata for JsonServiceError {
    fn meta(&self) -> &ErrorMetadata {
        match self {
            JsonServiceError::InvalidInput { meta, .. } => meta,
            JsonServiceError::Unhandled(inner) => inner.meta(),
        }
    }
}

impl CreateUnhandledError for JsonServiceError {
    fn create_unhandled_error(source: BoxError, meta: Option<ErrorMetadata>) -> Self {
        let mut builder = Unhandled::builder().source(source);
        builder.set_meta(meta);
        JsonServiceError::Unhandled(builder.build())
    }
}

#[derive(Deserialize)]
struct InvalidInputMembers {
    #[serde(rename = "Field")]
    field: Option<String>,
}

fn invalid_input(response: &ErrorResponse<'_>) -> Result<JsonServiceError, BoxError> {
    let members: InvalidInputMembers = response.deserialize()?;
    Ok(JsonServiceError::InvalidInput {
        meta: response.meta().clone(),
        field: members.field,
    })
}

static ERRORS: &[ExceptionDescriptor<JsonServiceError>] =
    &[ExceptionDescriptor::new("InvalidInput", Some(400), invalid_input)];

fn errors() -> ProtocolErrorResponseHandler<JsonServiceError> {
    ProtocolErrorResponseHandler::new(Protocol::AwsJson1_0, ExceptionTable::new(ERRORS))
}

pub type GetItemParams = ClientExecutionParams<GetItemInput, GetItemOutput, JsonServiceError>;

pub fn get_item(input: GetItemInput) -> GetItemParams {
    let metadata = OperationMetadata::new(Protocol::AwsJson1_0, SERVICE, "GetItem");
    ClientExecutionParams::new(
        "GetItem",
        input,
        ProtocolMarshaller::new(metadata.clone()),
        ProtocolResponseHandler::new(metadata),
        errors(),
    )
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutDataInput {
    #[serde(skip)]
    pub account_id: Option<String>,
    #[serde(skip)]
    pub override_config: Option<RequestOverrideConfiguration>,
}

impl InputShape for PutDataInput {}

impl SdkRequest for PutDataInput {
    fn override_configuration(&self) -> Option<&RequestOverrideConfiguration> {
        self.override_config.as_ref()
    }

    fn with_override_configuration(mut self, config: RequestOverrideConfiguration) -> Self {
        self.override_config = Some(config);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PutDataOutput {}

impl OutputShape for PutDataOutput {}

pub type PutDataParams = ClientExecutionParams<PutDataInput, PutDataOutput, JsonServiceError>;

/// `PutData` streams its payload and sends it to `{AccountId}.data-` on the endpoint host.
pub fn put_data(account_id: Option<&str>) -> PutDataParams {
    let metadata = OperationMetadata::new(Protocol::AwsJson1_0, SERVICE, "PutData")
        .with_streaming_input(true);
    let input = PutDataInput {
        account_id: account_id.map(str::to_owned),
        ..Default::default()
    };
    ClientExecutionParams::new(
        "PutData",
        input,
        ProtocolMarshaller::new(metadata.clone()),
        ProtocolResponseHandler::new(metadata),
        errors(),
    )
    .with_host_prefix(HostPrefix::new(
        "{AccountId}.data-",
        vec![HostLabel::new("AccountId", |input: &PutDataInput| {
            input.account_id.as_deref()
        })],
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct GetBlobOutput {
    #[serde(skip)]
    pub content_type: Option<String>,
}

impl OutputShape for GetBlobOutput {
    fn bind_response_headers(&mut self, headers: &HeaderMap) -> Result<(), BoxError> {
        self.content_type = headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(())
    }
}

pub type GetBlobParams = ClientExecutionParams<GetItemInput, GetBlobOutput, JsonServiceError>;

/// `GetBlob` streams its response payload.
pub fn get_blob(key: &str) -> GetBlobParams {
    let metadata = OperationMetadata::new(Protocol::AwsJson1_0, SERVICE, "GetBlob")
        .with_streaming_success_response(true)
        .with_payload_json(false);
    ClientExecutionParams::new(
        "GetBlob",
        GetItemInput::new(key),
        ProtocolMarshaller::new(metadata.clone()),
        ProtocolResponseHandler::new(metadata),
        errors(),
    )
}

/// Signer that stamps its name into the `authorization` header.
#[derive(Debug)]
pub struct NamedSigner(pub &'static str);

impl Signer for NamedSigner {
    fn sign(&self, request: &mut HttpRequest, context: &SigningContext<'_>) -> Result<(), BoxError> {
        let value = format!("{} {}", self.0, context.operation_name());
        request
            .headers_mut()
            .insert("authorization", value.parse()?);
        Ok(())
    }
}

/// A JSON response with `status`.
pub fn json(status: u16, body: &str) -> invoke_runtime_api::client::http::HttpResponse {
    http::Response::builder()
        .status(status)
        .header("content-type", "application/x-amz-json-1.0")
        .header("x-amzn-requestid", "req-1")
        .body(body.into())
        .unwrap()
}
