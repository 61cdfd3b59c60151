/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::SystemTime;

/// Descriptor of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    key: String,
    size: u64,
    mtime: SystemTime,
}

impl Object {
    /// Create an object descriptor.
    pub fn new(key: impl Into<String>, size: u64, mtime: SystemTime) -> Self {
        Self {
            key: key.into(),
            size,
            mtime,
        }
    }

    /// The object key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Size of the object in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modified time
    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    /// Consume the descriptor and replace its key.
    pub(crate) fn into_key(self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..self
        }
    }
}

/// Handle for an in-progress multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    /// Minimum size of every part except the last one.
    pub min_part_size: u64,

    /// Maximum number of parts the backend accepts.
    pub max_count: usize,

    /// Backend assigned upload identifier.
    pub upload_id: String,
}

/// A part uploaded as part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part number (1-based)
    pub num: i32,

    /// Size of the part in bytes
    pub size: u64,

    /// ETag returned by the backend for this part
    pub etag: String,
}

/// A multipart upload that has been created but not completed or aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPart {
    /// Key of the object being uploaded.
    pub key: String,

    /// ID of the upload.
    pub upload_id: String,

    /// Creation time of the upload.
    pub created: SystemTime,
}
