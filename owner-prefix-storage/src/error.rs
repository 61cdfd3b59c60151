/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for storage operations.
///
/// The owner prefix decorator never produces these itself; errors raised by the
/// wrapped backend are handed back to the caller unchanged.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The specified key does not exist.
    #[error("no such key")]
    NoSuchKey,

    /// The specified upload does not exist.
    #[error("no such upload")]
    NoSuchUpload,

    /// The specified part does not exist.
    #[error("no such part")]
    NoSuchPart,

    /// The range specified is invalid
    #[error("invalid range")]
    InvalidRange,

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoSuchKey)
    }
}
