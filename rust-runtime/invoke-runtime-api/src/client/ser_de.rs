/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::box_error::BoxError;
use crate::client::http::{HttpRequest, HttpResponse};
use std::error::Error;
use std::fmt;

/// The reason a request could not be marshalled.
#[non_exhaustive]
#[derive(Debug)]
pub enum MarshallingErrorKind {
    /// A member the request needs was not set.
    MissingRequiredMember {
        /// Name of the member.
        member: &'static str,
    },
    /// A member bound into the host name was not a valid host label.
    InvalidHostLabel {
        /// Name of the member.
        member: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// The operation needs the length of its payload up front, and it is unknown.
    MissingContentLength,
    /// The payload could not be serialized.
    Serialization(BoxError),
}

/// Failure to turn a modeled input into an HTTP request.
///
/// Marshalling failures always end the call before anything is sent.
#[derive(Debug)]
pub struct MarshallingError {
    kind: MarshallingErrorKind,
}

impl MarshallingError {
    /// A required member was not set.
    pub fn missing_required_member(member: &'static str) -> Self {
        MarshallingErrorKind::MissingRequiredMember { member }.into()
    }

    /// A host-bound member was not a valid host label.
    pub fn invalid_host_label(member: &'static str, reason: &'static str) -> Self {
        MarshallingErrorKind::InvalidHostLabel { member, reason }.into()
    }

    /// The payload length is required but unknown.
    pub fn missing_content_length() -> Self {
        MarshallingErrorKind::MissingContentLength.into()
    }

    /// The payload could not be serialized.
    pub fn serialization(source: impl Into<BoxError>) -> Self {
        MarshallingErrorKind::Serialization(source.into()).into()
    }

    /// The reason marshalling failed.
    pub fn kind(&self) -> &MarshallingErrorKind {
        &self.kind
    }
}

impl From<MarshallingErrorKind> for MarshallingError {
    fn from(kind: MarshallingErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for MarshallingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MarshallingErrorKind::MissingRequiredMember { member } => {
                write!(f, "`{member}` is required but was not set")
            }
            MarshallingErrorKind::InvalidHostLabel { member, reason } => {
                write!(f, "`{member}` is not a valid host label: {reason}")
            }
            MarshallingErrorKind::MissingContentLength => f.write_str(
                "the operation requires the payload length but the request body length is unknown",
            ),
            MarshallingErrorKind::Serialization(_) => f.write_str("failed to serialize the request"),
        }
    }
}

impl Error for MarshallingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            MarshallingErrorKind::Serialization(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Turns a modeled input into an HTTP request.
///
/// A marshaller is called once per attempt and must produce a request with a fresh body
/// each time.
pub trait Marshall<I>: Send + Sync {
    /// Marshall `input`.
    fn marshall(&self, input: &I) -> Result<HttpRequest, MarshallingError>;
}

impl<I, F> Marshall<I> for F
where
    F: Fn(&I) -> Result<HttpRequest, MarshallingError> + Send + Sync,
{
    fn marshall(&self, input: &I) -> Result<HttpRequest, MarshallingError> {
        self(input)
    }
}

/// Turns a successful response into a modeled output.
pub trait HandleResponse<O>: Send + Sync {
    /// Returns true if the response payload is a stream.
    ///
    /// The engine leaves the body of a streaming response unread and hands it to the caller's
    /// response transformer. For any other response the body is fully read before
    /// [`handle`](HandleResponse::handle) is called.
    fn is_streaming(&self) -> bool {
        false
    }

    /// Parse `response` into an output.
    fn handle(&self, response: &HttpResponse) -> Result<O, BoxError>;
}

/// Turns an error response into a modeled error.
///
/// The body of an error response is always fully read before this is called.
pub trait HandleErrorResponse<E>: Send + Sync {
    /// Parse `response` into an error.
    fn handle(&self, response: &HttpResponse) -> Result<E, BoxError>;
}
