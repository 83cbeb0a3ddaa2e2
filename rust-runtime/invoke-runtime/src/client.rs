/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Signers shipped with the runtime.
pub mod auth;

/// Defaults filled into client configuration when a handler is created.
pub mod defaults;

/// Per-call metric scope.
pub mod metrics;

/// The execution engine.
pub mod orchestrator;

/// Merging per-request overrides into the client configuration.
pub mod override_resolver;

/// Wire protocol codecs and the error mapper.
pub mod protocol;

/// Retry classifiers and strategies.
pub mod retries;

/// Request bodies and the marshaller that attaches them.
pub mod transfer;
