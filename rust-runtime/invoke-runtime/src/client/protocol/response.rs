/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::binding::OutputShape;
use super::OperationMetadata;
use bytes::Bytes;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::http::HttpResponse;
use invoke_runtime_api::client::ser_de::HandleResponse;
use std::fmt;
use std::marker::PhantomData;

/// Parses an operation's successful responses.
///
/// - streaming responses leave the body alone; only header-bound members are read
/// - document payloads are decoded into the output
/// - any other payload is handed over as opaque bytes
pub struct ProtocolResponseHandler<O> {
    metadata: OperationMetadata,
    _output: PhantomData<fn() -> O>,
}

impl<O> ProtocolResponseHandler<O> {
    /// Create a handler for the operation described by `metadata`.
    pub fn new(metadata: OperationMetadata) -> Self {
        Self {
            metadata,
            _output: PhantomData,
        }
    }
}

impl<O> fmt::Debug for ProtocolResponseHandler<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolResponseHandler")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl<O: OutputShape> HandleResponse<O> for ProtocolResponseHandler<O> {
    fn is_streaming(&self) -> bool {
        self.metadata.has_streaming_success_response()
    }

    fn handle(&self, response: &HttpResponse) -> Result<O, BoxError> {
        let mut output = if self.is_streaming() {
            O::default()
        } else {
            let body = response
                .body()
                .bytes()
                .ok_or("the response body was not read before parsing")?;
            if self.metadata.is_payload_json() {
                self.metadata.protocol().decode(body)?
            } else {
                let mut output = O::default();
                output.set_payload(Bytes::copy_from_slice(body));
                output
            }
        };
        output.bind_response_headers(response.headers())?;
        Ok(output)
    }
}
