/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Owner partitioned view over an object storage.
//!
//! Chunk keys end in `<chunk-id>_<part-index>_<size>`. [`OwnerPrefixStorage`]
//! looks up the owner of the chunk and stores the object under
//! `<owner>/<key>` in the wrapped storage. Keys that are not chunk keys pass
//! through untouched. Results carrying keys are handed back with logical keys.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::Result;
use crate::meta::ChunkMeta;
use crate::storage::{FileSystem, ListStream, ObjectStorage};
use crate::types::{MultipartUpload, Object, Part, PendingPart};

mod key;
mod relay;

pub use key::{parse_chunk_id, KeyFormatError, KeyTranslator, OwnerPrefix};

/// Wrap `storage` so chunk keys are partitioned by the owner `meta` reports.
pub fn with_owner_prefix(
    storage: Arc<dyn ObjectStorage>,
    meta: Arc<dyn ChunkMeta>,
) -> OwnerPrefixStorage {
    OwnerPrefixStorage::builder(storage, meta).build()
}

/// Object storage decorator storing chunks under their owner's prefix.
#[derive(Debug, Clone)]
pub struct OwnerPrefixStorage {
    storage: Arc<dyn ObjectStorage>,
    file_system: Option<Arc<dyn FileSystem>>,
    translator: KeyTranslator,
    config: Config,
}

impl OwnerPrefixStorage {
    /// Create a new builder wrapping `storage`
    pub fn builder(storage: Arc<dyn ObjectStorage>, meta: Arc<dyn ChunkMeta>) -> Builder {
        Builder {
            storage,
            meta,
            file_system: None,
            diagnostics: None,
            config: Config::default(),
        }
    }

    /// The key translator used by this storage
    pub fn translator(&self) -> &KeyTranslator {
        &self.translator
    }

    /// The permission capability chmod and chown go to: the one given to the
    /// builder, else the wrapped storage's own.
    fn permissions(&self) -> Option<&dyn FileSystem> {
        match &self.file_system {
            Some(fs) => Some(fs.as_ref()),
            None => self.storage.file_system(),
        }
    }

    /// Translate a listing marker; an empty marker stays empty and belongs to
    /// no partition.
    async fn translate_marker(&self, marker: &str) -> (OwnerPrefix, String) {
        if marker.is_empty() {
            return (OwnerPrefix::none(), String::new());
        }
        self.translator.translate(marker).await
    }
}

impl fmt::Display for OwnerPrefixStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[owner]", self.storage)
    }
}

#[async_trait]
impl ObjectStorage for OwnerPrefixStorage {
    async fn create(&self) -> Result<()> {
        self.storage.create().await
    }

    async fn head(&self, key: &str) -> Result<Object> {
        let (prefix, physical) = self.translator.translate(key).await;
        let object = self.storage.head(&physical).await?;
        Ok(prefix.untranslate_object(object))
    }

    async fn get(&self, key: &str, offset: u64, limit: Option<u64>) -> Result<Bytes> {
        let (_, physical) = self.translator.translate(key).await;
        self.storage.get(&physical, offset, limit).await
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let (_, physical) = self.translator.translate(key).await;
        tracing::trace!(key, physical = %physical, "put");
        self.storage.put(&physical, data).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let (_, physical) = self.translator.translate(key).await;
        self.storage.delete(&physical).await
    }

    async fn list(&self, prefix: &str, marker: &str, limit: usize) -> Result<Vec<Object>> {
        // prefix and marker must address the same partition
        let (partition, marker) = self.translate_marker(marker).await;
        let objects = self
            .storage
            .list(&partition.translate(prefix), &marker, limit)
            .await?;
        Ok(objects
            .into_iter()
            .map(|object| partition.untranslate_object(object))
            .collect())
    }

    async fn list_all(&self, prefix: &str, marker: &str) -> Result<ListStream> {
        let (partition, marker) = self.translate_marker(marker).await;
        let source = self
            .storage
            .list_all(&partition.translate(prefix), &marker)
            .await?;
        tracing::debug!(prefix, partition = %partition, "relaying listing");
        Ok(relay::spawn(
            source,
            partition,
            self.config.list_buffer_size(),
        ))
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload> {
        let (_, physical) = self.translator.translate(key).await;
        self.storage.create_multipart_upload(&physical).await
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        num: i32,
        body: Bytes,
    ) -> Result<Part> {
        let (_, physical) = self.translator.translate(key).await;
        self.storage
            .upload_part(&physical, upload_id, num, body)
            .await
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) {
        let (_, physical) = self.translator.translate(key).await;
        self.storage.abort_upload(&physical, upload_id).await
    }

    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()> {
        let (_, physical) = self.translator.translate(key).await;
        self.storage
            .complete_upload(&physical, upload_id, parts)
            .await
    }

    async fn list_uploads(&self, marker: &str) -> Result<(Vec<PendingPart>, String)> {
        // NOTE: the marker is sent as is, only the returned keys are stripped
        let (partition, _) = self.translate_marker(marker).await;
        let (parts, next_marker) = self.storage.list_uploads(marker).await?;
        let parts = parts
            .into_iter()
            .map(|part| PendingPart {
                key: partition.untranslate(&part.key).to_string(),
                ..part
            })
            .collect();
        Ok((parts, next_marker))
    }

    fn file_system(&self) -> Option<&dyn FileSystem> {
        self.permissions().map(|_| self as &dyn FileSystem)
    }
}

#[async_trait]
impl FileSystem for OwnerPrefixStorage {
    async fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        match self.permissions() {
            Some(fs) => {
                let (_, physical) = self.translator.translate(path).await;
                fs.chmod(&physical, mode).await
            }
            None => {
                tracing::trace!(path, "storage has no permissions, ignoring chmod");
                Ok(())
            }
        }
    }

    async fn chown(&self, path: &str, owner: &str, group: &str) -> Result<()> {
        match self.permissions() {
            Some(fs) => {
                let (_, physical) = self.translator.translate(path).await;
                fs.chown(&physical, owner, group).await
            }
            None => {
                tracing::trace!(path, "storage has no permissions, ignoring chown");
                Ok(())
            }
        }
    }
}

/// Builder for [`OwnerPrefixStorage`]
#[derive(Debug)]
pub struct Builder {
    storage: Arc<dyn ObjectStorage>,
    meta: Arc<dyn ChunkMeta>,
    file_system: Option<Arc<dyn FileSystem>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    config: Config,
}

impl Builder {
    /// Permission capability of the wrapped storage.
    ///
    /// Overrides [`ObjectStorage::file_system`] of the wrapped storage. When
    /// neither is present `chmod` and `chown` succeed without doing anything.
    pub fn file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    /// Sink for key translation diagnostics. Default is [`TracingSink`].
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Decorator configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Consumes the builder and constructs an [`OwnerPrefixStorage`]
    pub fn build(self) -> OwnerPrefixStorage {
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingSink));
        OwnerPrefixStorage {
            storage: self.storage,
            file_system: self.file_system,
            translator: KeyTranslator::new(self.meta, diagnostics),
            config: self.config,
        }
    }
}
