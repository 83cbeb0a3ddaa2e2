/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Protocol-agnostic types used by the operation invocation runtime.

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

pub mod body;
/// The boxed error type used wherever a failure's concrete type is erased.
pub mod box_error;
pub mod byte_stream;
pub mod error;
pub mod retry;

pub use byte_stream::ByteStream;
pub use error::ErrorMetadata;
