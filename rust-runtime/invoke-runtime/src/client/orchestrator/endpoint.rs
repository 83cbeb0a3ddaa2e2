/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use http::uri::{Authority, PathAndQuery, Uri};
use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::http::HttpRequest;
use tracing::trace;

/// Resolve the marshalled request's relative URI against `endpoint`.
///
/// The endpoint's path is prepended to the request path, and `host_prefix` (if any) to its
/// host.
pub(crate) fn apply_endpoint(
    request: &mut HttpRequest,
    endpoint: &Uri,
    host_prefix: Option<&str>,
) -> Result<(), BoxError> {
    trace!(%endpoint, ?host_prefix, "applying endpoint");
    let authority = endpoint
        .authority()
        .ok_or_else(|| format!("endpoint `{endpoint}` has no host"))?;
    let authority = match host_prefix {
        Some(prefix) => format!("{prefix}{authority}").parse::<Authority>()?,
        None => authority.clone(),
    };

    let base_path = endpoint.path().trim_end_matches('/');
    let request_path = request
        .uri()
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/");
    let path_and_query = match endpoint.query() {
        // an endpoint query is kept ahead of the request's own parameters
        Some(query) => join_query(base_path, request_path, query),
        None => format!("{base_path}{request_path}"),
    };

    let uri = Uri::builder()
        .scheme(endpoint.scheme_str().unwrap_or("https"))
        .authority(authority)
        .path_and_query(path_and_query)
        .build()?;
    *request.uri_mut() = uri;
    Ok(())
}

fn join_query(base_path: &str, request_path: &str, endpoint_query: &str) -> String {
    match request_path.split_once('?') {
        Some((path, query)) => format!("{base_path}{path}?{endpoint_query}&{query}"),
        None => format!("{base_path}{request_path}?{endpoint_query}"),
    }
}
