/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::defaults::apply_defaults;
use invoke_runtime_api::client::config::{
    BuildError, ClientConfigurationView, SharedClientConfiguration,
};
use invoke_runtime_api::client::metrics::SharedMetricPublisher;
use invoke_runtime_api::client::plugin::Plugin;
use invoke_runtime_api::client::request::RequestOverrideConfiguration;
use std::sync::Arc;
use tracing::trace;

/// Compute the configuration one call runs with.
///
/// Without request plugins the client's snapshot is returned as-is (the same `Arc`).
/// Otherwise the plugins run, in order, against a copy of the snapshot, and the result is
/// reconciled and completed with defaults. The client's snapshot is never modified.
pub fn resolve(
    base: &SharedClientConfiguration,
    request_override: Option<&RequestOverrideConfiguration>,
) -> Result<SharedClientConfiguration, BuildError> {
    let plugins = match request_override.map(RequestOverrideConfiguration::plugins) {
        Some(plugins) if !plugins.is_empty() => plugins,
        _ => return Ok(base.clone()),
    };

    let mut builder = base.to_builder();
    {
        let mut view = ClientConfigurationView::new(&mut builder);
        for plugin in plugins {
            trace!(?plugin, "applying request plugin");
            plugin.configure_client(&mut view);
        }
    }
    // building reconciles retry settings by precedence and clears the configured ones
    let config = apply_defaults(builder.build()?)?;
    Ok(Arc::new(config))
}

/// The metric publishers for one call: the request's own if it has any, otherwise the
/// effective configuration's.
pub fn resolve_metric_publishers(
    request_override: Option<&RequestOverrideConfiguration>,
    config: &SharedClientConfiguration,
) -> Vec<SharedMetricPublisher> {
    match request_override.map(RequestOverrideConfiguration::metric_publishers) {
        Some(publishers) if !publishers.is_empty() => publishers.to_vec(),
        _ => config.metric_publishers().to_vec(),
    }
}
