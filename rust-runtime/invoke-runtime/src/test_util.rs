/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Capturing the engine's logs in tests.
pub mod capture_logs;

/// A metric publisher that keeps what it is given.
pub mod metrics;

/// Fake transports.
pub mod transport;
