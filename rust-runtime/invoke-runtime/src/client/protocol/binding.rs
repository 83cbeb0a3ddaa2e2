/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::ser_de::MarshallingError;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Characters that are percent encoded in labels and query strings.
const BASE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b':')
    .add(b',')
    .add(b'?')
    .add(b'#')
    .add(b'[')
    .add(b']')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'@')
    .add(b'!')
    .add(b'$')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b';')
    .add(b'=')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'"')
    .add(b'^')
    .add(b'`')
    .add(b'\\');

/// A modeled operation input.
///
/// The serialized form of the input is the request document. Members bound to the HTTP
/// message instead (headers, query parameters, URI labels) are written by
/// [`bind_request`](InputShape::bind_request) and should be skipped by `Serialize`.
pub trait InputShape: Serialize + Send + Sync {
    /// Bind members to the HTTP message.
    fn bind_request(&self, binder: &mut RequestBinder) -> Result<(), MarshallingError> {
        let _ = binder;
        Ok(())
    }
}

/// A modeled operation output.
///
/// The output is deserialized from the response document, then receives the members bound
/// to response headers.
pub trait OutputShape: DeserializeOwned + Default + Send {
    /// Read members bound to response headers.
    fn bind_response_headers(&mut self, headers: &HeaderMap) -> Result<(), BoxError> {
        let _ = headers;
        Ok(())
    }

    /// Receive a payload that is not a protocol document.
    fn set_payload(&mut self, payload: Bytes) {
        let _ = payload;
    }
}

/// Collects the members an input binds to the HTTP message.
#[derive(Debug, Default)]
pub struct RequestBinder {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    labels: HashMap<&'static str, String>,
}

impl RequestBinder {
    /// Bind `value` to the header `name`.
    pub fn header(
        &mut self,
        name: &'static str,
        value: impl AsRef<str>,
    ) -> Result<&mut Self, MarshallingError> {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(MarshallingError::serialization)?;
        let value =
            HeaderValue::from_str(value.as_ref()).map_err(MarshallingError::serialization)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Bind `value` to the query parameter `name`. Repeated names are all sent.
    pub fn query(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Bind `value` to the URI label `name`.
    pub fn label(&mut self, name: &'static str, value: impl Into<String>) -> &mut Self {
        self.labels.insert(name, value.into());
        self
    }

    pub(crate) fn into_headers(self) -> HeaderMap {
        self.headers
    }

    /// Expand the labels of `template` and append the query parameters.
    pub(crate) fn uri(&self, template: &'static str) -> Result<String, MarshallingError> {
        let mut uri = self.expand_labels(template)?;
        let mut separator = if uri.contains('?') { '&' } else { '?' };
        for (name, value) in &self.query {
            uri.push(separator);
            uri.extend(utf8_percent_encode(name, BASE_SET));
            uri.push('=');
            uri.extend(utf8_percent_encode(value, BASE_SET));
            separator = '&';
        }
        Ok(uri)
    }

    fn expand_labels(&self, template: &'static str) -> Result<String, MarshallingError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let Some(len) = rest[start..].find('}') else {
                return Err(MarshallingError::serialization(format!(
                    "unterminated label in URI template `{template}`"
                )));
            };
            let name = &rest[start + 1..start + len];
            let (name, greedy) = match name.strip_suffix('+') {
                Some(name) => (name, true),
                None => (name, false),
            };
            let value = self
                .labels
                .get(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| MarshallingError::missing_required_member(name))?;
            if greedy {
                // greedy labels keep their path separators
                for (i, segment) in value.split('/').enumerate() {
                    if i > 0 {
                        out.push('/');
                    }
                    out.extend(utf8_percent_encode(segment, BASE_SET));
                }
            } else {
                out.extend(utf8_percent_encode(value, BASE_SET));
            }
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Returns the value of a required member, or the error for it being unset.
pub fn required<'a, T: ?Sized>(
    member: &'static str,
    value: Option<&'a T>,
) -> Result<&'a T, MarshallingError> {
    value.ok_or_else(|| MarshallingError::missing_required_member(member))
}
