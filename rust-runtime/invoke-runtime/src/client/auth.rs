/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use http::header::{HeaderValue, AUTHORIZATION};
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::auth::{CredentialType, Signer, SigningContext};
use invoke_runtime_api::client::http::HttpRequest;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Signs requests with a static bearer token in the `Authorization` header.
///
/// Used by clients configured with [`CredentialType::Bearer`]. The token is zeroed when the
/// last handle to it is dropped and is never printed by `Debug`.
#[derive(Clone)]
pub struct BearerTokenSigner {
    token: Arc<Zeroizing<String>>,
}

impl fmt::Debug for BearerTokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenSigner")
            .field("token", &"** redacted **")
            .finish()
    }
}

impl BearerTokenSigner {
    /// Creates a signer for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(Zeroizing::new(token.into())),
        }
    }
}

impl Signer for BearerTokenSigner {
    fn sign(&self, request: &mut HttpRequest, context: &SigningContext<'_>) -> Result<(), BoxError> {
        if context.credential_type() == CredentialType::Anonymous {
            return Ok(());
        }
        let mut value = HeaderValue::try_from(format!("Bearer {}", self.token.as_str()))
            .map_err(|_| "bearer token contains characters that are not allowed in a header")?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_runtime_api::client::auth::PayloadSigning;
    use invoke_types::body::SdkBody;

    fn context(credential_type: CredentialType) -> SigningContext<'static> {
        SigningContext::new(
            "Json Service",
            "EmptyInputOutput",
            credential_type,
            PayloadSigning::Buffered,
        )
    }

    #[test]
    fn sets_the_authorization_header() {
        let mut request = http::Request::new(SdkBody::empty());
        BearerTokenSigner::new("t")
            .sign(&mut request, &context(CredentialType::Bearer))
            .unwrap();
        let value = request.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer t");
        assert!(value.is_sensitive());
    }

    #[test]
    fn token_is_redacted() {
        let debug = format!("{:?}", BearerTokenSigner::new("hunter2"));
        assert!(!debug.contains("hunter2"), "{debug}");
    }

    #[test]
    fn invalid_tokens_fail_signing() {
        let mut request = http::Request::new(SdkBody::empty());
        let err = BearerTokenSigner::new("line\nbreak")
            .sign(&mut request, &context(CredentialType::Bearer))
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }
}
