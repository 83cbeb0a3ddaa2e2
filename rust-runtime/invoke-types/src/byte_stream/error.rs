/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors related to bytestreams.

use crate::box_error::BoxError;
use std::error::Error as StdError;
use std::fmt;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};

#[derive(Debug)]
pub(super) enum ErrorKind {
    IoError(IoError),
    StreamingError(BoxError),
}

/// An error occurred in the byte stream
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates a streaming error wrapping `err`.
    pub fn streaming(err: impl Into<BoxError>) -> Self {
        ErrorKind::StreamingError(err.into()).into()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        ErrorKind::IoError(err).into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::IoError(_) => write!(f, "IO error"),
            ErrorKind::StreamingError(_) => write!(f, "streaming error"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::IoError(err) => Some(err as _),
            ErrorKind::StreamingError(err) => Some(err.as_ref() as _),
        }
    }
}

impl From<Error> for IoError {
    fn from(err: Error) -> Self {
        IoError::new(IoErrorKind::Other, err)
    }
}
