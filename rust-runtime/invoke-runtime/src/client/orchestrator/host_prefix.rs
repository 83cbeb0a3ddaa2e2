/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use invoke_runtime_api::client::ser_de::MarshallingError;
use std::fmt;

const MAX_LABEL_LEN: usize = 63;

/// A member of the input interpolated into the host name.
pub struct HostLabel<I> {
    member: &'static str,
    value: fn(&I) -> Option<&str>,
}

impl<I> HostLabel<I> {
    /// Bind the placeholder `{member}` to the value read by `value`.
    pub const fn new(member: &'static str, value: fn(&I) -> Option<&str>) -> Self {
        Self { member, value }
    }
}

impl<I> fmt::Debug for HostLabel<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLabel")
            .field("member", &self.member)
            .finish_non_exhaustive()
    }
}

/// A prefix prepended to the endpoint host, such as `{AccountId}.data-`.
pub struct HostPrefix<I> {
    template: &'static str,
    labels: Vec<HostLabel<I>>,
}

impl<I> fmt::Debug for HostPrefix<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostPrefix")
            .field("template", &self.template)
            .field("labels", &self.labels)
            .finish()
    }
}

impl<I> HostPrefix<I> {
    /// A prefix with the placeholders of `template` filled from `labels`.
    pub fn new(template: &'static str, labels: Vec<HostLabel<I>>) -> Self {
        Self { template, labels }
    }

    /// Render the prefix for `input`.
    ///
    /// Every label must be a valid host label, otherwise nothing is sent.
    pub fn render(&self, input: &I) -> Result<String, MarshallingError> {
        let mut prefix = self.template.to_owned();
        for label in &self.labels {
            let value = validate_host_label(label.member, (label.value)(input))?;
            prefix = prefix.replace(&format!("{{{}}}", label.member), value);
        }
        Ok(prefix)
    }
}

/// Check that `value` can be used as one label of a host name.
pub(crate) fn validate_host_label<'a>(
    member: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, MarshallingError> {
    let value = value.ok_or_else(|| MarshallingError::missing_required_member(member))?;
    if value.is_empty() {
        return Err(MarshallingError::invalid_host_label(member, "it is empty"));
    }
    if value.len() > MAX_LABEL_LEN {
        return Err(MarshallingError::invalid_host_label(
            member,
            "it is longer than 63 characters",
        ));
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(MarshallingError::invalid_host_label(
            member,
            "only letters, digits and `-` are allowed",
        ));
    }
    Ok(value)
}
