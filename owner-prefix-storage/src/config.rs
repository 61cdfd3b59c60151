/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::DEFAULT_LIST_BUFFER_SIZE;
use std::cmp;

/// Configuration for an [`OwnerPrefixStorage`](crate::owner::OwnerPrefixStorage)
#[derive(Debug, Clone)]
pub struct Config {
    list_buffer_size: usize,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Capacity of the channel returned by `list_all`
    pub fn list_buffer_size(&self) -> usize {
        self.list_buffer_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Builder::default().build()
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    list_buffer_size: Option<usize>,
}

impl Builder {
    /// Number of listed objects that may be buffered between the backend and
    /// the consumer of `list_all`.
    ///
    /// Values below 1 are rounded up. Default is 10240.
    pub fn list_buffer_size(mut self, size: usize) -> Self {
        self.list_buffer_size = Some(cmp::max(size, 1));
        self
    }

    /// Consumes the builder and constructs a [`Config`]
    pub fn build(self) -> Config {
        Config {
            list_buffer_size: self.list_buffer_size.unwrap_or(DEFAULT_LIST_BUFFER_SIZE),
        }
    }
}
