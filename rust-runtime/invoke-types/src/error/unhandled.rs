/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::box_error::BoxError;
use crate::error::metadata::{ErrorMetadata, ProvideErrorMetadata};
use std::error::Error as StdError;
use std::fmt;

/// Builder for [`Unhandled`]
#[derive(Default, Debug)]
pub struct Builder {
    source: Option<BoxError>,
    meta: Option<ErrorMetadata>,
}

impl Builder {
    /// Sets the error source
    pub fn source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the error source
    pub fn set_source(&mut self, source: Option<BoxError>) -> &mut Self {
        self.source = source;
        self
    }

    /// Sets the error metadata
    pub fn meta(mut self, meta: ErrorMetadata) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Sets the error metadata
    pub fn set_meta(&mut self, meta: Option<ErrorMetadata>) -> &mut Self {
        self.meta = meta;
        self
    }

    /// Builds the unhandled error
    pub fn build(self) -> Unhandled {
        let meta = self.meta.unwrap_or_default();
        Unhandled {
            source: self
                .source
                .unwrap_or_else(|| Box::new(meta.clone()) as BoxError),
            meta,
        }
    }
}

/// Unhandled error type
///
/// The service's base error: returned when the response carried an error code that the
/// operation does not model, or no code at all. Match on it with `_` or inspect its metadata.
#[derive(Debug)]
pub struct Unhandled {
    source: BoxError,
    meta: ErrorMetadata,
}

impl Unhandled {
    /// Returns a builder to construct an unhandled error.
    pub fn builder() -> Builder {
        Default::default()
    }
}

impl fmt::Display for Unhandled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.meta.code() {
            Some(code) => write!(f, "unhandled error ({code})"),
            None => write!(f, "unhandled error"),
        }
    }
}

impl StdError for Unhandled {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref() as _)
    }
}

impl ProvideErrorMetadata for Unhandled {
    fn meta(&self) -> &ErrorMetadata {
        &self.meta
    }
}
