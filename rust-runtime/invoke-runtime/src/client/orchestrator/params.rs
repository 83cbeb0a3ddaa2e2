/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::host_prefix::HostPrefix;
use crate::client::transfer::{AsyncRequestBody, RequestBody, TransferBody, TransferPolicy};
use invoke_runtime_api::client::auth::{PayloadSigning, SharedSigner};
use invoke_runtime_api::client::ser_de::{HandleErrorResponse, HandleResponse, Marshall};
use invoke_runtime_api::shared::IntoShared;
use std::fmt;

/// Everything the engine needs to execute one operation call.
///
/// Generated clients build one per call from the operation's codec and the caller's input.
pub struct ClientExecutionParams<I, O, E> {
    pub(crate) operation_name: &'static str,
    pub(crate) input: I,
    pub(crate) marshaller: Box<dyn Marshall<I>>,
    pub(crate) response_handler: Box<dyn HandleResponse<O>>,
    pub(crate) error_handler: Box<dyn HandleErrorResponse<E>>,
    pub(crate) host_prefix: Option<HostPrefix<I>>,
    pub(crate) body: Option<TransferBody>,
    pub(crate) transfer_policy: TransferPolicy,
    pub(crate) signer_override: Option<SharedSigner>,
    pub(crate) payload_signing: Option<PayloadSigning>,
}

impl<I, O, E> fmt::Debug for ClientExecutionParams<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientExecutionParams")
            .field("operation_name", &self.operation_name)
            .field("host_prefix", &self.host_prefix)
            .field("body", &self.body)
            .field("transfer_policy", &self.transfer_policy)
            .field("signer_override", &self.signer_override)
            .field("payload_signing", &self.payload_signing)
            .finish_non_exhaustive()
    }
}

impl<I, O, E> ClientExecutionParams<I, O, E> {
    /// Describe a call to `operation_name` with `input`.
    pub fn new(
        operation_name: &'static str,
        input: I,
        marshaller: impl Marshall<I> + 'static,
        response_handler: impl HandleResponse<O> + 'static,
        error_handler: impl HandleErrorResponse<E> + 'static,
    ) -> Self {
        Self {
            operation_name,
            input,
            marshaller: Box::new(marshaller),
            response_handler: Box::new(response_handler),
            error_handler: Box::new(error_handler),
            host_prefix: None,
            body: None,
            transfer_policy: TransferPolicy::default(),
            signer_override: None,
            payload_signing: None,
        }
    }

    /// Validate and prepend a host prefix to the endpoint.
    pub fn with_host_prefix(mut self, host_prefix: HostPrefix<I>) -> Self {
        self.host_prefix = Some(host_prefix);
        self
    }

    /// Send `body` as the request payload of a synchronous call.
    pub fn with_request_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Send `body` as the request payload of an asynchronous call.
    pub fn with_async_request_body(mut self, body: AsyncRequestBody) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sign this call with `signer` unless the caller attached a signer to the request.
    pub fn with_signer_override(mut self, signer: impl IntoShared<SharedSigner>) -> Self {
        self.signer_override = Some(signer.into_shared());
        self
    }

    /// How the payload takes part in signing.
    ///
    /// Defaults to [`PayloadSigning::Streaming`] for streamed bodies and
    /// [`PayloadSigning::Buffered`] otherwise.
    pub fn with_payload_signing(mut self, payload_signing: PayloadSigning) -> Self {
        self.payload_signing = Some(payload_signing);
        self
    }

    /// Fail the call before sending if the length of the request body is unknown.
    pub fn with_requires_length(mut self, requires_length: bool) -> Self {
        self.transfer_policy = self.transfer_policy.with_requires_length(requires_length);
        self
    }

    /// Use chunked framing for a request body of unknown length.
    pub fn with_transfer_encoding(mut self, transfer_encoding: bool) -> Self {
        self.transfer_policy = self.transfer_policy.with_transfer_encoding(transfer_encoding);
        self
    }

    /// The operation being called.
    pub fn operation_name(&self) -> &'static str {
        self.operation_name
    }

    /// The input of the call.
    pub fn input(&self) -> &I {
        &self.input
    }

    pub(crate) fn payload_signing(&self) -> PayloadSigning {
        self.payload_signing.unwrap_or_else(|| match &self.body {
            Some(body) if body.is_streaming() => PayloadSigning::Streaming,
            _ => PayloadSigning::Buffered,
        })
    }
}
