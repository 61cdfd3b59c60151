/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Chunk ownership metadata.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use tokio::sync::RwLock;

/// Resolves the owner of a chunk.
///
/// Implemented by the metadata service of the file system. Lookups cannot fail;
/// a service that does not know a chunk answers with its notion of a default
/// owner.
#[async_trait]
pub trait ChunkMeta: Send + Sync + Debug {
    /// Returns the owner identifier of `chunk_id`.
    async fn get_chunk_owner(&self, chunk_id: u64) -> String;
}

/// A fixed chunk to owner table kept in process memory.
#[derive(Debug, Default)]
pub struct StaticChunkOwners {
    owners: RwLock<HashMap<u64, String>>,
    default_owner: String,
}

impl StaticChunkOwners {
    /// Create an empty table. Unknown chunks resolve to the empty owner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table resolving unknown chunks to `owner`.
    pub fn with_default_owner(owner: impl Into<String>) -> Self {
        Self {
            owners: RwLock::default(),
            default_owner: owner.into(),
        }
    }

    /// Assign `chunk_id` to `owner`, replacing any previous owner.
    pub async fn set_owner(&self, chunk_id: u64, owner: impl Into<String>) {
        self.owners.write().await.insert(chunk_id, owner.into());
    }

    /// Forget the owner of `chunk_id`.
    pub async fn remove_owner(&self, chunk_id: u64) {
        self.owners.write().await.remove(&chunk_id);
    }
}

#[async_trait]
impl ChunkMeta for StaticChunkOwners {
    async fn get_chunk_owner(&self, chunk_id: u64) -> String {
        self.owners
            .read()
            .await
            .get(&chunk_id)
            .cloned()
            .unwrap_or_else(|| self.default_owner.clone())
    }
}
