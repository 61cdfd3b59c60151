/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::diagnostics::DiagnosticSink;
use crate::meta::ChunkMeta;
use crate::types::Object;

/// Why a key is not a chunk key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    /// The key has no `/` separated directory part.
    #[error("unknown chunk key path format")]
    Path,

    /// The last path segment is not `<chunk-id>_<part-index>_<size>`.
    #[error("unknown chunk key id format")]
    ChunkName,
}

/// Extract the chunk id from a key such as `chunks/0/0/1_0_4194304`.
///
/// Only the shape of the last segment is checked. A chunk id that is not a
/// valid `u64` is read as chunk 0.
pub fn parse_chunk_id(key: &str) -> Result<u64, KeyFormatError> {
    let (_, name) = key.rsplit_once('/').ok_or(KeyFormatError::Path)?;

    let fields: Vec<&str> = name.split('_').collect();
    if fields.len() != 3 {
        return Err(KeyFormatError::ChunkName);
    }

    // unparsable ids share the partition of chunk 0
    Ok(fields[0].parse::<u64>().unwrap_or(0))
}

/// The physical key prefix of an owner partition: `<owner>/`, or empty for
/// keys outside any partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OwnerPrefix(String);

impl OwnerPrefix {
    /// The empty prefix.
    pub fn none() -> Self {
        Self::default()
    }

    /// The prefix of `owner`'s partition.
    pub fn for_owner(owner: &str) -> Self {
        Self(format!("{owner}/"))
    }

    /// The prefix as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the prefix in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty prefix
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Logical key to physical key.
    pub fn translate(&self, key: &str) -> String {
        let mut physical = String::with_capacity(self.0.len() + key.len());
        physical.push_str(&self.0);
        physical.push_str(key);
        physical
    }

    /// Physical key to logical key by dropping the first `len()` bytes.
    ///
    /// The physical key is not checked against the prefix. A key shorter than
    /// the prefix is returned untouched.
    pub fn untranslate<'a>(&self, physical: &'a str) -> &'a str {
        physical.get(self.0.len()..).unwrap_or(physical)
    }

    /// Returns `object` with its key turned back into a logical key.
    pub(crate) fn untranslate_object(&self, object: Object) -> Object {
        if self.is_empty() {
            return object;
        }
        let key = self.untranslate(object.key()).to_string();
        object.into_key(key)
    }
}

impl fmt::Display for OwnerPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps logical chunk keys to owner partitions.
#[derive(Debug, Clone)]
pub struct KeyTranslator {
    meta: Arc<dyn ChunkMeta>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl KeyTranslator {
    /// Create a translator resolving owners through `meta`.
    pub fn new(meta: Arc<dyn ChunkMeta>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { meta, diagnostics }
    }

    /// Resolve the owner prefix of `key`.
    ///
    /// Keys that are not chunk keys are reported to the diagnostics sink and
    /// resolve to the empty prefix.
    pub async fn resolve_prefix(&self, key: &str) -> OwnerPrefix {
        match parse_chunk_id(key) {
            Ok(chunk_id) => {
                let owner = self.meta.get_chunk_owner(chunk_id).await;
                OwnerPrefix::for_owner(&owner)
            }
            Err(err) => {
                self.diagnostics.unrecognized_key(key, &err);
                OwnerPrefix::none()
            }
        }
    }

    /// Resolve the owner prefix of `key` and return it with the physical key.
    pub async fn translate(&self, key: &str) -> (OwnerPrefix, String) {
        let prefix = self.resolve_prefix(key).await;
        let physical = prefix.translate(key);
        (prefix, physical)
    }
}
