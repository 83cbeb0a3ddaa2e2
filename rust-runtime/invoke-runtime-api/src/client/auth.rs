/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Request signing.
//!
//! Credential resolution happens outside the engine. A [`Signer`] arrives with whatever
//! credentials or tokens it needs and is handed each marshalled request before it is sent.

use crate::box_error::BoxError;
use crate::client::http::HttpRequest;
use crate::impl_shared_conversions;
use std::fmt;
use std::sync::Arc;

/// The kind of credentials a client authenticates with.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CredentialType {
    /// Signature-based request signing.
    #[default]
    Signature,
    /// A bearer token placed in the `Authorization` header.
    Bearer,
    /// No authentication. Requests are sent unsigned even if a signer is configured.
    Anonymous,
}

/// How the request payload takes part in signing.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PayloadSigning {
    /// The payload is fully available and is included in the signature.
    #[default]
    Buffered,
    /// The payload is streamed and must be signed as it is sent, or not at all.
    Streaming,
    /// The payload is not signed.
    Unsigned,
}

/// Information about the call a request belongs to, given to a [`Signer`].
#[derive(Clone, Debug)]
pub struct SigningContext<'a> {
    service_id: &'a str,
    operation_name: &'a str,
    credential_type: CredentialType,
    payload_signing: PayloadSigning,
}

impl<'a> SigningContext<'a> {
    /// Creates a signing context for one attempt of one operation.
    pub fn new(
        service_id: &'a str,
        operation_name: &'a str,
        credential_type: CredentialType,
        payload_signing: PayloadSigning,
    ) -> Self {
        Self {
            service_id,
            operation_name,
            credential_type,
            payload_signing,
        }
    }

    /// The service being called.
    pub fn service_id(&self) -> &str {
        self.service_id
    }

    /// The operation being called.
    pub fn operation_name(&self) -> &str {
        self.operation_name
    }

    /// The kind of credentials the client is configured with.
    pub fn credential_type(&self) -> CredentialType {
        self.credential_type
    }

    /// How the payload takes part in signing.
    pub fn payload_signing(&self) -> PayloadSigning {
        self.payload_signing
    }
}

/// Signs a marshalled request in place.
///
/// Signing runs once per attempt, after host prefixes are applied, so a retried request gets
/// a fresh signature.
pub trait Signer: Send + Sync + fmt::Debug {
    /// Sign `request`.
    fn sign(&self, request: &mut HttpRequest, context: &SigningContext<'_>) -> Result<(), BoxError>;
}

/// Signer that can be shared between clients, calls and request overrides.
#[derive(Clone, Debug)]
pub struct SharedSigner(Arc<dyn Signer>);

impl SharedSigner {
    /// Creates a new [`SharedSigner`].
    pub fn new(signer: impl Signer + 'static) -> Self {
        Self(Arc::new(signer))
    }

    /// Returns true if both handles point at the same signer.
    pub fn ptr_eq(&self, other: &SharedSigner) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Signer for SharedSigner {
    fn sign(&self, request: &mut HttpRequest, context: &SigningContext<'_>) -> Result<(), BoxError> {
        self.0.sign(request, context)
    }
}

impl_shared_conversions!(convert SharedSigner from Signer using SharedSigner::new);
