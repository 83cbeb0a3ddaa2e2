/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Protocol codecs.
//!
//! A generated operation describes itself with [`OperationMetadata`] and gets a
//! [`ProtocolMarshaller`], a [`ProtocolResponseHandler`] and a [`ProtocolErrorResponseHandler`]
//! for the protocol its service speaks. The engine only ever sees them through the
//! [`Marshall`](invoke_runtime_api::client::ser_de::Marshall) and
//! [`HandleResponse`](invoke_runtime_api::client::ser_de::HandleResponse) traits.

use http::Method;
use invoke_runtime_api::box_error::BoxError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

mod binding;
mod error;
mod marshaller;
mod response;

pub use binding::{required, InputShape, OutputShape, RequestBinder};
pub use error::{
    parse_error_metadata, sanitize_error_code, ErrorResponse, ExceptionDescriptor,
    ExceptionTable, ProtocolErrorResponseHandler,
};
pub use marshaller::ProtocolMarshaller;
pub use response::ProtocolResponseHandler;

// CBOR encoding of an empty map
const EMPTY_CBOR_MAP: &[u8] = &[0xA0];
const EMPTY_JSON_OBJECT: &[u8] = b"{}";

/// Wire protocol of a service.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `awsJson1_0`: JSON documents POSTed to `/`, dispatched on `X-Amz-Target`.
    AwsJson1_0,
    /// `awsJson1_1`: like `awsJson1_0` with a different content type.
    AwsJson1_1,
    /// `restJson1`: HTTP bindings for method, URI, headers and query, with a JSON payload.
    RestJson1,
    /// `rpcv2Cbor`: CBOR documents POSTed to `/service/{Service}/operation/{Operation}`.
    RpcV2Cbor,
}

impl Protocol {
    /// The content type of a payload of this protocol.
    pub fn content_type(self) -> &'static str {
        match self {
            Protocol::AwsJson1_0 => "application/x-amz-json-1.0",
            Protocol::AwsJson1_1 => "application/x-amz-json-1.1",
            Protocol::RestJson1 => "application/json",
            Protocol::RpcV2Cbor => "application/cbor",
        }
    }

    /// True for the protocols whose documents are CBOR.
    pub fn is_cbor(self) -> bool {
        matches!(self, Protocol::RpcV2Cbor)
    }

    pub(crate) fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, BoxError> {
        if self.is_cbor() {
            let mut out = Vec::new();
            ciborium::into_writer(value, &mut out)?;
            Ok(out)
        } else {
            Ok(serde_json::to_vec(value)?)
        }
    }

    /// Decode a document. An empty body decodes as an empty object.
    pub(crate) fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, BoxError> {
        if self.is_cbor() {
            let body = if body.is_empty() { EMPTY_CBOR_MAP } else { body };
            Ok(ciborium::from_reader(body)?)
        } else {
            let body = if body.iter().all(u8::is_ascii_whitespace) {
                EMPTY_JSON_OBJECT
            } else {
                body
            };
            Ok(serde_json::from_slice(body)?)
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::AwsJson1_0 => "awsJson1_0",
            Protocol::AwsJson1_1 => "awsJson1_1",
            Protocol::RestJson1 => "restJson1",
            Protocol::RpcV2Cbor => "rpcv2Cbor",
        })
    }
}

/// Static description of one operation of a service.
#[derive(Debug, Clone)]
pub struct OperationMetadata {
    protocol: Protocol,
    service_target: &'static str,
    operation_name: &'static str,
    http_method: Method,
    http_path: &'static str,
    has_streaming_input: bool,
    has_streaming_success_response: bool,
    is_payload_json: bool,
}

impl OperationMetadata {
    /// Describe `operation_name` of the service addressed as `service_target`.
    ///
    /// `service_target` is the `X-Amz-Target` prefix for the AWS JSON protocols and the
    /// service name in the RPC v2 path. The operation defaults to `POST /` with a document
    /// payload.
    pub fn new(
        protocol: Protocol,
        service_target: &'static str,
        operation_name: &'static str,
    ) -> Self {
        Self {
            protocol,
            service_target,
            operation_name,
            http_method: Method::POST,
            http_path: "/",
            has_streaming_input: false,
            has_streaming_success_response: false,
            is_payload_json: true,
        }
    }

    /// Set the HTTP method and URI template. Only `restJson1` routes on these.
    ///
    /// Labels in the template are written `{Name}`, and a greedy label that may span path
    /// segments is written `{Name+}`.
    pub fn with_http(mut self, method: Method, path: &'static str) -> Self {
        self.http_method = method;
        self.http_path = path;
        self
    }

    /// Mark the operation as taking its payload from a request body instead of the input.
    pub fn with_streaming_input(mut self, streaming: bool) -> Self {
        self.has_streaming_input = streaming;
        self
    }

    /// Mark the operation's successful response payload as a stream.
    pub fn with_streaming_success_response(mut self, streaming: bool) -> Self {
        self.has_streaming_success_response = streaming;
        self
    }

    /// Whether the response payload is a protocol document (JSON or CBOR) rather than opaque
    /// bytes.
    pub fn with_payload_json(mut self, is_payload_json: bool) -> Self {
        self.is_payload_json = is_payload_json;
        self
    }

    /// The protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The service target.
    pub fn service_target(&self) -> &'static str {
        self.service_target
    }

    /// The operation name.
    pub fn operation_name(&self) -> &'static str {
        self.operation_name
    }

    /// The HTTP method.
    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// The URI template.
    pub fn http_path(&self) -> &'static str {
        self.http_path
    }

    /// True if the request payload is streamed.
    pub fn has_streaming_input(&self) -> bool {
        self.has_streaming_input
    }

    /// True if the successful response payload is streamed.
    pub fn has_streaming_success_response(&self) -> bool {
        self.has_streaming_success_response
    }

    /// True if the response payload is a protocol document.
    pub fn is_payload_json(&self) -> bool {
        self.is_payload_json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Output {
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn empty_bodies_decode_as_empty_objects() {
        for protocol in [Protocol::AwsJson1_0, Protocol::RestJson1, Protocol::RpcV2Cbor] {
            let output: Output = protocol.decode(b"").unwrap();
            assert_eq!(output, Output::default(), "{protocol}");
        }
        let output: Output = Protocol::AwsJson1_1.decode(b"  \n").unwrap();
        assert_eq!(output, Output::default());
    }

    #[test]
    fn cbor_documents_are_cbor() {
        let encoded = Protocol::RpcV2Cbor
            .encode(&serde_json::json!({ "name": "a" }))
            .unwrap();
        // a one-entry map
        assert_eq!(encoded[0], 0xA1);
        let output: Output = Protocol::RpcV2Cbor.decode(&encoded).unwrap();
        assert_eq!(output.name.as_deref(), Some("a"));
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(Protocol::RestJson1.decode::<Output>(b"{\"name\":").is_err());
        assert!(Protocol::RpcV2Cbor.decode::<Output>(&[0xFF, 0x00]).is_err());
    }
}
