/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::Protocol;
use http::HeaderMap;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::http::HttpResponse;
use invoke_runtime_api::client::result::CreateUnhandledError;
use invoke_runtime_api::client::ser_de::HandleErrorResponse;
use invoke_types::error::metadata::{Builder as ErrorMetadataBuilder, ErrorMetadata};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::trace;

const X_AMZN_ERRORTYPE: &str = "x-amzn-errortype";

/// Reduce a wire error code to the bare shape name.
///
/// A trailing URL, starting at `:`, is trimmed, and so is a namespace prefix ending in `#`.
pub fn sanitize_error_code(error_code: &str) -> &str {
    let error_code = match error_code.find(':') {
        Some(idx) => &error_code[..idx],
        None => error_code,
    };
    match error_code.find('#') {
        Some(idx) => &error_code[idx + 1..],
        None => error_code,
    }
}

/// Read the error code and message of an error response.
///
/// The code comes from the `x-amzn-errortype` header when present, and otherwise from the
/// `__type` (or `code`) member of the body. The message comes from `message` or `Message`.
/// A body that is not a document of the protocol contributes nothing.
pub fn parse_error_metadata(
    protocol: Protocol,
    headers: &HeaderMap,
    body: &[u8],
) -> ErrorMetadataBuilder {
    let fields = if protocol.is_cbor() {
        cbor_error_fields(body)
    } else {
        json_error_fields(body)
    };

    let mut builder = ErrorMetadata::builder();
    let header_code = headers
        .get(X_AMZN_ERRORTYPE)
        .and_then(|value| value.to_str().ok());
    if let Some(code) = header_code.or(fields.code.as_deref()) {
        builder = builder.code(sanitize_error_code(code));
    }
    if let Some(message) = fields.message {
        builder = builder.message(message);
    }
    builder
}

#[derive(Debug, Default)]
struct ErrorFields {
    code: Option<String>,
    message: Option<String>,
}

impl ErrorFields {
    fn accept(&mut self, key: &str, value: Option<String>) {
        match key {
            "__type" => self.code = value.or(self.code.take()),
            "code" if self.code.is_none() => self.code = value,
            "message" | "Message" if self.message.is_none() => self.message = value,
            _ => {}
        }
    }
}

fn json_error_fields(body: &[u8]) -> ErrorFields {
    let mut fields = ErrorFields::default();
    if let Ok(serde_json::Value::Object(members)) = serde_json::from_slice(body) {
        for (key, value) in members {
            fields.accept(&key, value.as_str().map(str::to_owned));
        }
    }
    fields
}

fn cbor_error_fields(body: &[u8]) -> ErrorFields {
    let mut fields = ErrorFields::default();
    if let Ok(ciborium::Value::Map(members)) = ciborium::from_reader(body) {
        for (key, value) in members {
            if let ciborium::Value::Text(key) = key {
                fields.accept(&key, value.into_text().ok());
            }
        }
    }
    fields
}

/// An error response being turned into a modeled error.
#[derive(Debug)]
pub struct ErrorResponse<'a> {
    protocol: Protocol,
    status: u16,
    meta: &'a ErrorMetadata,
    body: &'a [u8],
}

impl<'a> ErrorResponse<'a> {
    /// The HTTP status of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The code, message and status of the error.
    pub fn meta(&self) -> &'a ErrorMetadata {
        self.meta
    }

    /// The raw body of the response.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Decode the body into the modeled members of an error.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, BoxError> {
        self.protocol.decode(self.body)
    }
}

/// Associates a wire error code with the constructor of a modeled error.
pub struct ExceptionDescriptor<E> {
    code: &'static str,
    http_status: Option<u16>,
    factory: fn(&ErrorResponse<'_>) -> Result<E, BoxError>,
}

impl<E> ExceptionDescriptor<E> {
    /// Map `code` to the error built by `factory`.
    ///
    /// `http_status` is the status the service is modeled to respond with for this error.
    pub const fn new(
        code: &'static str,
        http_status: Option<u16>,
        factory: fn(&ErrorResponse<'_>) -> Result<E, BoxError>,
    ) -> Self {
        Self {
            code,
            http_status,
            factory,
        }
    }

    /// The wire error code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The modeled HTTP status.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Build the error from `response`.
    pub fn create(&self, response: &ErrorResponse<'_>) -> Result<E, BoxError> {
        (self.factory)(response)
    }
}

impl<E> fmt::Debug for ExceptionDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionDescriptor")
            .field("code", &self.code)
            .field("http_status", &self.http_status)
            .finish_non_exhaustive()
    }
}

/// The modeled errors of an operation.
pub struct ExceptionTable<E: 'static> {
    descriptors: &'static [ExceptionDescriptor<E>],
}

impl<E: 'static> Clone for ExceptionTable<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: 'static> Copy for ExceptionTable<E> {}

impl<E: 'static> fmt::Debug for ExceptionTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors).finish()
    }
}

impl<E: 'static> ExceptionTable<E> {
    /// Create a table. Codes are matched case-sensitively, and the first match wins.
    pub const fn new(descriptors: &'static [ExceptionDescriptor<E>]) -> Self {
        Self { descriptors }
    }

    /// The descriptor registered for `code`, if any.
    pub fn map_error_code(&self, code: Option<&str>) -> Option<&'static ExceptionDescriptor<E>> {
        let code = code?;
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.code == code)
    }

    /// Codes registered more than once. A well-formed table has none.
    pub fn duplicate_codes(&self) -> Vec<&'static str> {
        let mut duplicates = Vec::new();
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            let repeated = self.descriptors[..i]
                .iter()
                .any(|earlier| earlier.code == descriptor.code);
            if repeated && !duplicates.contains(&descriptor.code) {
                duplicates.push(descriptor.code);
            }
        }
        duplicates
    }
}

/// Turns error responses into an operation's error type.
///
/// A code found in the [`ExceptionTable`] is built by its descriptor. Anything else becomes
/// the unhandled variant of `E`, which still carries the code, message and status.
pub struct ProtocolErrorResponseHandler<E: 'static> {
    protocol: Protocol,
    table: ExceptionTable<E>,
}

impl<E: 'static> ProtocolErrorResponseHandler<E> {
    /// Create a handler for the errors in `table`.
    pub fn new(protocol: Protocol, table: ExceptionTable<E>) -> Self {
        Self { protocol, table }
    }
}

impl<E: 'static> fmt::Debug for ProtocolErrorResponseHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolErrorResponseHandler")
            .field("protocol", &self.protocol)
            .field("table", &self.table)
            .finish()
    }
}

impl<E: CreateUnhandledError + 'static> HandleErrorResponse<E> for ProtocolErrorResponseHandler<E> {
    fn handle(&self, response: &HttpResponse) -> Result<E, BoxError> {
        let body = response
            .body()
            .bytes()
            .ok_or("the error response body was not read before parsing")?;
        let status = response.status().as_u16();
        let meta = parse_error_metadata(self.protocol, response.headers(), body)
            .status(status)
            .build();

        match self.table.map_error_code(meta.code()) {
            Some(descriptor) => {
                trace!(code = descriptor.code(), status, "mapped error response");
                descriptor.create(&ErrorResponse {
                    protocol: self.protocol,
                    status,
                    meta: &meta,
                    body,
                })
            }
            None => {
                trace!(code = ?meta.code(), status, "unmodeled error response");
                Ok(E::create_unhandled_error(
                    Box::new(meta.clone()),
                    Some(meta),
                ))
            }
        }
    }
}
