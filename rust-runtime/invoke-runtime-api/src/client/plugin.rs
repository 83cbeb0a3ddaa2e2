/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Plugins customize the client configuration for a single call.
//!
//! A plugin attached to a request is run against a [`ClientConfigurationView`] of a copy of
//! the client's configuration. Plugins run in the order they were attached, so a later plugin
//! sees (and may replace) what an earlier one set.
//!
//! ```rust
//! use invoke_runtime_api::client::config::ClientConfigurationView;
//! use invoke_runtime_api::client::plugin::Plugin;
//! use invoke_types::retry::RetryMode;
//!
//! #[derive(Debug)]
//! struct LegacyRetries;
//!
//! impl Plugin for LegacyRetries {
//!     fn configure_client(&self, config: &mut ClientConfigurationView<'_>) {
//!         config.set_retry_mode(RetryMode::Legacy);
//!     }
//! }
//! ```

use crate::client::config::ClientConfigurationView;
use crate::impl_shared_conversions;
use std::fmt;
use std::sync::Arc;

/// Customizes the configuration used for one call.
pub trait Plugin: Send + Sync + fmt::Debug {
    /// Apply this plugin's changes to `config`.
    fn configure_client(&self, config: &mut ClientConfigurationView<'_>);
}

/// Plugin that can be shared between requests.
#[derive(Clone, Debug)]
pub struct SharedPlugin(Arc<dyn Plugin>);

impl SharedPlugin {
    /// Creates a new [`SharedPlugin`].
    pub fn new(plugin: impl Plugin + 'static) -> Self {
        Self(Arc::new(plugin))
    }
}

impl Plugin for SharedPlugin {
    fn configure_client(&self, config: &mut ClientConfigurationView<'_>) {
        self.0.configure_client(config)
    }
}

impl_shared_conversions!(convert SharedPlugin from Plugin using SharedPlugin::new);

/// Plugin backed by a closure.
///
/// Handy for one-off overrides in tests and examples.
pub struct FnPlugin<F> {
    name: &'static str,
    configure: F,
}

impl<F> FnPlugin<F>
where
    F: Fn(&mut ClientConfigurationView<'_>) + Send + Sync,
{
    /// Creates a plugin named `name` that runs `configure`.
    pub fn new(name: &'static str, configure: F) -> Self {
        Self { name, configure }
    }
}

impl<F> fmt::Debug for FnPlugin<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnPlugin").field(&self.name).finish()
    }
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut ClientConfigurationView<'_>) + Send + Sync,
{
    fn configure_client(&self, config: &mut ClientConfigurationView<'_>) {
        (self.configure)(config)
    }
}
