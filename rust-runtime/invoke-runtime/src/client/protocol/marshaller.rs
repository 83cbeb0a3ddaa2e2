/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::binding::{InputShape, RequestBinder};
use super::{OperationMetadata, Protocol};
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use http::Method;
use invoke_runtime_api::client::http::HttpRequest;
use invoke_runtime_api::client::ser_de::{Marshall, MarshallingError};
use invoke_types::body::SdkBody;
use std::fmt;
use std::marker::PhantomData;

const X_AMZ_TARGET: &str = "x-amz-target";
const SMITHY_PROTOCOL: &str = "smithy-protocol";
const RPC_V2_CBOR: &str = "rpc-v2-cbor";

/// Marshaller for an operation's input in the operation's protocol.
///
/// The request URI is relative (path and query). The engine resolves it against the client
/// endpoint.
pub struct ProtocolMarshaller<I> {
    metadata: OperationMetadata,
    _input: PhantomData<fn(&I)>,
}

impl<I> ProtocolMarshaller<I> {
    /// Create a marshaller for the operation described by `metadata`.
    pub fn new(metadata: OperationMetadata) -> Self {
        Self {
            metadata,
            _input: PhantomData,
        }
    }
}

impl<I> fmt::Debug for ProtocolMarshaller<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolMarshaller")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl<I: InputShape> Marshall<I> for ProtocolMarshaller<I> {
    fn marshall(&self, input: &I) -> Result<HttpRequest, MarshallingError> {
        let metadata = &self.metadata;
        let protocol = metadata.protocol();
        let mut binder = RequestBinder::default();
        input.bind_request(&mut binder)?;

        let (method, uri) = match protocol {
            Protocol::RestJson1 => (
                metadata.http_method().clone(),
                binder.uri(metadata.http_path())?,
            ),
            Protocol::RpcV2Cbor => (
                Method::POST,
                format!(
                    "/service/{}/operation/{}",
                    metadata.service_target(),
                    metadata.operation_name()
                ),
            ),
            _ => (Method::POST, "/".to_owned()),
        };

        // requests without a document: streamed payloads, and REST methods that carry no body
        let document = !metadata.has_streaming_input()
            && !(protocol == Protocol::RestJson1
                && matches!(method, Method::GET | Method::HEAD | Method::DELETE));

        let mut builder = http::Request::builder().method(method).uri(uri);
        match protocol {
            Protocol::AwsJson1_0 | Protocol::AwsJson1_1 => {
                builder = builder.header(
                    X_AMZ_TARGET,
                    format!(
                        "{}.{}",
                        metadata.service_target(),
                        metadata.operation_name()
                    ),
                );
            }
            Protocol::RpcV2Cbor => {
                builder = builder
                    .header(SMITHY_PROTOCOL, RPC_V2_CBOR)
                    .header(ACCEPT, protocol.content_type());
            }
            _ => {}
        }

        let body = if document {
            let payload = protocol
                .encode(input)
                .map_err(MarshallingError::serialization)?;
            builder = builder
                .header(CONTENT_TYPE, protocol.content_type())
                .header(CONTENT_LENGTH, payload.len());
            SdkBody::from(payload)
        } else {
            SdkBody::empty()
        };

        if let Some(headers) = builder.headers_mut() {
            headers.extend(binder.into_headers());
        }
        builder.body(body).map_err(MarshallingError::serialization)
    }
}
