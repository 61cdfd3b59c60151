/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Storage capability traits.
//!
//! [`ObjectStorage`] is the full capability set every backend implements and
//! every decorator forwards. [`FileSystem`] is an optional capability for
//! backends that keep POSIX style permissions next to their objects.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{MultipartUpload, Object, Part, PendingPart};

pub(crate) mod in_memory;

pub use in_memory::{InMemoryStorage, Permissions};

/// Receiving end of a streamed listing.
///
/// Items arrive in key order. `None` items are markers a backend may interleave
/// with descriptors; consumers skip them. The listing is complete once the
/// channel is closed and drained.
pub type ListStream = async_channel::Receiver<Option<Object>>;

/// An object storage backend.
///
/// Keys are flat `/` separated strings. Listing operations return keys in
/// lexicographic order.
#[async_trait]
pub trait ObjectStorage: Send + Sync + Debug + Display {
    /// Create the bucket or container backing this storage, if needed.
    async fn create(&self) -> Result<()>;

    /// Get the descriptor of an object without fetching its data.
    async fn head(&self, key: &str) -> Result<Object>;

    /// Read `limit` bytes of an object starting at `offset`.
    ///
    /// A `limit` of `None` reads to the end of the object.
    async fn get(&self, key: &str, offset: u64, limit: Option<u64>) -> Result<Bytes>;

    /// Store an object, replacing any existing one.
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List at most `limit` objects whose key starts with `prefix` and sorts
    /// after `marker`.
    async fn list(&self, prefix: &str, marker: &str, limit: usize) -> Result<Vec<Object>>;

    /// Stream every object whose key starts with `prefix` and sorts after
    /// `marker`.
    ///
    /// Failures discovered before any item is produced are returned directly.
    async fn list_all(&self, prefix: &str, marker: &str) -> Result<ListStream>;

    /// Start a multipart upload for `key`.
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload>;

    /// Upload part `num` of a multipart upload.
    async fn upload_part(&self, key: &str, upload_id: &str, num: i32, body: Bytes)
        -> Result<Part>;

    /// Abort a multipart upload. Best effort, failures are not reported.
    async fn abort_upload(&self, key: &str, upload_id: &str);

    /// Complete a multipart upload by combining `parts` in order.
    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()>;

    /// List pending multipart uploads whose key sorts after `marker`.
    ///
    /// Returns the uploads and the marker for the next page (empty when done).
    async fn list_uploads(&self, marker: &str) -> Result<(Vec<PendingPart>, String)>;

    /// The permission capability of this storage, if it has one.
    fn file_system(&self) -> Option<&dyn FileSystem> {
        None
    }
}

/// Permission management for backends that model a file system.
#[async_trait]
pub trait FileSystem: Send + Sync + Debug {
    /// Change the mode bits of `path`.
    async fn chmod(&self, path: &str, mode: u32) -> Result<()>;

    /// Change the owner and group of `path`.
    async fn chown(&self, path: &str, owner: &str, group: &str) -> Result<()>;
}

// Implement the trait for Arc<dyn ObjectStorage> to allow for dynamic dispatch
#[async_trait]
impl ObjectStorage for Arc<dyn ObjectStorage + '_> {
    async fn create(&self) -> Result<()> {
        (**self).create().await
    }

    async fn head(&self, key: &str) -> Result<Object> {
        (**self).head(key).await
    }

    async fn get(&self, key: &str, offset: u64, limit: Option<u64>) -> Result<Bytes> {
        (**self).get(key, offset, limit).await
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        (**self).put(key, data).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }

    async fn list(&self, prefix: &str, marker: &str, limit: usize) -> Result<Vec<Object>> {
        (**self).list(prefix, marker, limit).await
    }

    async fn list_all(&self, prefix: &str, marker: &str) -> Result<ListStream> {
        (**self).list_all(prefix, marker).await
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload> {
        (**self).create_multipart_upload(key).await
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        num: i32,
        body: Bytes,
    ) -> Result<Part> {
        (**self).upload_part(key, upload_id, num, body).await
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) {
        (**self).abort_upload(key, upload_id).await
    }

    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()> {
        (**self).complete_upload(key, upload_id, parts).await
    }

    async fn list_uploads(&self, marker: &str) -> Result<(Vec<PendingPart>, String)> {
        (**self).list_uploads(marker).await
    }

    fn file_system(&self) -> Option<&dyn FileSystem> {
        (**self).file_system()
    }
}
