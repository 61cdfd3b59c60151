/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Owner Prefix Storage
//!
//! An object storage decorator used by a chunk storage layer. Chunk keys of the
//! form `.../<chunk-id>_<part-index>_<size>` are stored under a physical key
//! prefixed with the chunk owner (`<owner>/...`), while callers keep seeing
//! the logical key space.
//!
//! ```no_run
//! # async fn example() -> owner_prefix_storage::error::Result<()> {
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use owner_prefix_storage::meta::StaticChunkOwners;
//! use owner_prefix_storage::storage::{InMemoryStorage, ObjectStorage};
//! use owner_prefix_storage::owner::with_owner_prefix;
//!
//! let owners = Arc::new(StaticChunkOwners::new());
//! owners.set_owner(1, "alice").await;
//!
//! let store = with_owner_prefix(Arc::new(InMemoryStorage::new()), owners);
//! store.put("chunks/0/0/1_0_4194304", Bytes::from_static(b"data")).await?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

/// Default capacity of the channel handed out by a streamed listing.
pub(crate) const DEFAULT_LIST_BUFFER_SIZE: usize = 10240;

/// Error types emitted by `owner-prefix-storage`
pub mod error;

/// Object descriptors and multipart upload types
pub mod types;

/// Storage capability traits and the in-memory backend
pub mod storage;

/// Chunk ownership metadata
pub mod meta;

/// Injected diagnostics sink
pub mod diagnostics;

/// Decorator configuration
pub mod config;

/// The owner prefix decorator
pub mod owner;
