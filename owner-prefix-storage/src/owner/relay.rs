/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_channel::Sender;

use super::key::OwnerPrefix;
use crate::storage::ListStream;
use crate::types::Object;

/// Spawn a task forwarding every item of `source` into a new bounded channel,
/// with descriptor keys turned back into logical keys.
///
/// The returned stream is closed once `source` is closed and drained.
pub(super) fn spawn(source: ListStream, partition: OwnerPrefix, capacity: usize) -> ListStream {
    let (tx, rx) = async_channel::bounded(capacity);
    tokio::spawn(relay(source, tx, partition));
    rx
}

async fn relay(source: ListStream, tx: Sender<Option<Object>>, partition: OwnerPrefix) {
    let mut forwarded: u64 = 0;
    while let Ok(item) = source.recv().await {
        let item = item.map(|object| partition.untranslate_object(object));
        if tx.send(item).await.is_err() {
            tracing::debug!(
                forwarded,
                "all listing receivers have been dropped, stopping relay"
            );
            return;
        }
        forwarded += 1;
    }
    tracing::trace!(forwarded, partition = %partition, "listing source closed");
}
