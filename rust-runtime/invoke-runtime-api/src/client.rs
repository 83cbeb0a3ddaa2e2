/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

pub mod auth;

/// Immutable client configuration and the view plugins mutate it through.
pub mod config;

pub mod http;

pub mod metrics;

pub mod plugin;

pub mod request;

pub mod result;

pub mod retries;

/// Request marshalling and response handling traits.
pub mod ser_de;
