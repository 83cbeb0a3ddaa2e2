/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Basic types for the operation execution engine. This crate holds the traits that sit at
//! the seams between the engine and its collaborators (transports, signers, retry strategies,
//! metric publishers, plugins) along with the configuration and error types that cross them.
//!
//! Implementations of these traits live in `invoke-runtime`. Generated clients should depend
//! on this crate for the interfaces and on `invoke-runtime` for the engine.

/// A boxed error that is `Send` and `Sync`.
pub mod box_error {
    pub use invoke_types::box_error::BoxError;
}

/// Client-side types and traits.
pub mod client;

pub mod shared;
