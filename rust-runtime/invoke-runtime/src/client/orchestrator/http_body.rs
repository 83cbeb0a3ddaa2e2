/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_runtime_api::box_error::BoxError;
use invoke_runtime_api::client::http::HttpResponse;
use invoke_types::body::SdkBody;
use invoke_types::byte_stream::ByteStream;
use std::mem;

/// Buffer the body of `response` in place.
pub(crate) fn read_body_blocking(response: &mut HttpResponse) -> Result<(), BoxError> {
    let body = mem::replace(response.body_mut(), SdkBody::taken());
    let bytes = ByteStream::new(body).collect_blocking()?;
    *response.body_mut() = SdkBody::from(bytes);
    Ok(())
}

/// Buffer the body of `response` in place without blocking.
pub(crate) async fn read_body(response: &mut HttpResponse) -> Result<(), BoxError> {
    let body = mem::replace(response.body_mut(), SdkBody::taken());
    let bytes = ByteStream::new(body).collect().await?;
    *response.body_mut() = SdkBody::from(bytes);
    Ok(())
}

/// Take the unread body out of `response` as a stream.
pub(crate) fn take_body(response: &mut HttpResponse) -> ByteStream {
    ByteStream::new(mem::replace(response.body_mut(), SdkBody::taken()))
}
