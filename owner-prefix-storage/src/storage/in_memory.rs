/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! In-memory implementation of the storage traits.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Bound;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::{FileSystem, ListStream, ObjectStorage};
use crate::types::{MultipartUpload, Object, Part, PendingPart};

const MEBIBYTE: u64 = 1024 * 1024;

/// Minimum size of a multipart upload part
const MIN_PART_SIZE: u64 = 5 * MEBIBYTE;

/// Maximum number of parts in a multipart upload
const MAX_PART_COUNT: usize = 10_000;

/// Maximum number of pending uploads returned per page
const MAX_UPLOADS_PER_PAGE: usize = 1000;

/// Buffer size of the channel behind `list_all`
const LIST_ALL_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    mtime: SystemTime,
}

#[derive(Debug)]
struct PendingUpload {
    key: String,
    created: SystemTime,
    // part# -> (content, etag)
    parts: HashMap<i32, (Bytes, String)>,
}

/// Permissions recorded through [`FileSystem`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    /// Mode bits, if changed
    pub mode: Option<u32>,

    /// Owning user, if changed
    pub owner: Option<String>,

    /// Owning group, if changed
    pub group: Option<String>,
}

/// An in-memory implementation of [`ObjectStorage`] and [`FileSystem`].
///
/// Objects, pending uploads and permissions all live in memory, making it
/// suitable for tests and for embedding a throw-away store.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    // key -> content
    objects: RwLock<BTreeMap<String, StoredObject>>,
    // upload-id -> pending upload
    uploads: RwLock<HashMap<String, PendingUpload>>,
    // key -> permissions
    permissions: RwLock<HashMap<String, Permissions>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keys of all stored objects in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Returns the permissions recorded for `key`, if any were ever set.
    pub async fn permissions(&self, key: &str) -> Option<Permissions> {
        self.permissions.read().await.get(key).cloned()
    }

    async fn snapshot(&self, prefix: &str, marker: &str, limit: usize) -> Vec<Object> {
        let objects = self.objects.read().await;
        // keys sharing `prefix` are contiguous, start at whichever of prefix/marker sorts later
        let start = if !marker.is_empty() && marker >= prefix {
            Bound::Excluded(marker)
        } else {
            Bound::Included(prefix)
        };
        objects
            .range::<str, _>((start, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, stored)| Object::new(key.as_str(), stored.data.len() as u64, stored.mtime))
            .collect()
    }

    async fn update_permissions<F>(&self, path: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut Permissions),
    {
        if !self.objects.read().await.contains_key(path) {
            return Err(Error::NoSuchKey);
        }
        let mut permissions = self.permissions.write().await;
        update(permissions.entry(path.to_string()).or_default());
        Ok(())
    }
}

impl fmt::Display for InMemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory://")
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn create(&self) -> Result<()> {
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Object> {
        let objects = self.objects.read().await;
        let stored = objects.get(key).ok_or(Error::NoSuchKey)?;
        Ok(Object::new(key, stored.data.len() as u64, stored.mtime))
    }

    async fn get(&self, key: &str, offset: u64, limit: Option<u64>) -> Result<Bytes> {
        let objects = self.objects.read().await;
        let data = &objects.get(key).ok_or(Error::NoSuchKey)?.data;

        let len = data.len() as u64;
        if offset > len {
            return Err(Error::InvalidRange);
        }
        let end = match limit {
            Some(limit) => offset.saturating_add(limit).min(len),
            None => len,
        };

        Ok(data.slice(offset as usize..end as usize))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let stored = StoredObject {
            data,
            mtime: SystemTime::now(),
        };
        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut objects = self.objects.write().await;
        if objects.remove(key).is_none() {
            return Err(Error::NoSuchKey);
        }
        self.permissions.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str, marker: &str, limit: usize) -> Result<Vec<Object>> {
        Ok(self.snapshot(prefix, marker, limit).await)
    }

    async fn list_all(&self, prefix: &str, marker: &str) -> Result<ListStream> {
        let objects = self.snapshot(prefix, marker, usize::MAX).await;
        let (tx, rx) = async_channel::bounded(LIST_ALL_BUFFER_SIZE);
        tokio::spawn(async move {
            for object in objects {
                if tx.send(Some(object)).await.is_err() {
                    tracing::debug!("listing receiver dropped, abandoning in-memory listing");
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload> {
        let upload_id = Uuid::new_v4().to_string();
        let upload = PendingUpload {
            key: key.to_string(),
            created: SystemTime::now(),
            parts: HashMap::new(),
        };
        self.uploads.write().await.insert(upload_id.clone(), upload);

        Ok(MultipartUpload {
            min_part_size: MIN_PART_SIZE,
            max_count: MAX_PART_COUNT,
            upload_id,
        })
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        num: i32,
        body: Bytes,
    ) -> Result<Part> {
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or(Error::NoSuchUpload)?;

        let etag = Uuid::new_v4().simple().to_string();
        let size = body.len() as u64;
        upload.parts.insert(num, (body, etag.clone()));

        Ok(Part { num, size, etag })
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) {
        let mut uploads = self.uploads.write().await;
        if uploads.get(upload_id).is_some_and(|upload| upload.key == key) {
            uploads.remove(upload_id);
        } else {
            tracing::debug!(key, upload_id, "ignoring abort of unknown upload");
        }
    }

    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()> {
        let mut uploads = self.uploads.write().await;
        let upload = match uploads.get(upload_id) {
            Some(upload) if upload.key == key => upload,
            _ => return Err(Error::NoSuchUpload),
        };

        // Verify all required parts are present before consuming the upload
        for part in parts {
            match upload.parts.get(&part.num) {
                Some((_, etag)) if *etag == part.etag => {}
                _ => return Err(Error::NoSuchPart),
            }
        }

        let upload = uploads.remove(upload_id).ok_or(Error::NoSuchUpload)?;

        // Combine all parts in the specified order
        let mut combined = BytesMut::new();
        for part in parts {
            if let Some((data, _)) = upload.parts.get(&part.num) {
                combined.extend_from_slice(data);
            }
        }

        let stored = StoredObject {
            data: combined.freeze(),
            mtime: SystemTime::now(),
        };
        self.objects.write().await.insert(upload.key, stored);
        Ok(())
    }

    async fn list_uploads(&self, marker: &str) -> Result<(Vec<PendingPart>, String)> {
        let uploads = self.uploads.read().await;
        let mut pending: Vec<PendingPart> = uploads
            .iter()
            .filter(|(_, upload)| upload.key.as_str() > marker)
            .map(|(upload_id, upload)| PendingPart {
                key: upload.key.clone(),
                upload_id: upload_id.clone(),
                created: upload.created,
            })
            .collect();
        pending.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.upload_id.cmp(&b.upload_id)));

        // the next page resumes after a key, so a page never splits the uploads of one key
        let mut cut = pending.len().min(MAX_UPLOADS_PER_PAGE);
        if cut > 0 {
            let boundary = &pending[cut - 1].key;
            cut += pending[cut..]
                .iter()
                .take_while(|part| &part.key == boundary)
                .count();
        }

        let next_marker = if cut < pending.len() {
            pending.truncate(cut);
            pending.last().map(|part| part.key.clone()).unwrap_or_default()
        } else {
            String::new()
        };

        Ok((pending, next_marker))
    }

    fn file_system(&self) -> Option<&dyn FileSystem> {
        Some(self)
    }
}

#[async_trait]
impl FileSystem for InMemoryStorage {
    async fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        self.update_permissions(path, |perms| perms.mode = Some(mode))
            .await
    }

    async fn chown(&self, path: &str, owner: &str, group: &str) -> Result<()> {
        self.update_permissions(path, |perms| {
            perms.owner = Some(owner.to_string());
            perms.group = Some(group.to_string());
        })
        .await
    }
}
