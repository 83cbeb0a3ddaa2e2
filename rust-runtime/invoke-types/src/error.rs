/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors shared by generated service error types

pub mod display;
pub mod metadata;
mod unhandled;

pub use metadata::{ErrorMetadata, ProvideErrorMetadata};
pub use unhandled::Unhandled;
