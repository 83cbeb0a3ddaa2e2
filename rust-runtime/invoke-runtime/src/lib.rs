/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The operation execution engine.
//!
//! Generated service clients hand each call to a [`SyncClientHandler`] or an
//! [`AsyncClientHandler`] along with [`ClientExecutionParams`] describing the operation: how
//! to marshall its input, how to parse its responses and errors, and whether it streams. The
//! engine resolves per-request configuration, drives attempts through the configured
//! transport and retry strategy, and publishes the call's metrics exactly once.
//!
//! [`SyncClientHandler`]: crate::client::orchestrator::SyncClientHandler
//! [`AsyncClientHandler`]: crate::client::orchestrator::AsyncClientHandler
//! [`ClientExecutionParams`]: crate::client::orchestrator::ClientExecutionParams

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

/// Runtime support logic for generated clients.
pub mod client;

/// Utilities for testing code that uses the engine.
#[cfg(feature = "test-util")]
pub mod test_util;
