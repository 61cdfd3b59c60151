/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::iter;
use std::sync::Arc;

use bytes::Bytes;
use owner_prefix_storage::config::Config;
use owner_prefix_storage::error::Error;
use owner_prefix_storage::meta::StaticChunkOwners;
use owner_prefix_storage::owner::{with_owner_prefix, KeyFormatError, OwnerPrefixStorage};
use owner_prefix_storage::storage::{FileSystem, InMemoryStorage, ObjectStorage, Permissions};
use tokio_test::{assert_err, assert_ok};

use test_utils::{drain, fixture, keys};

const ALICE_KEY: &str = "chunks/0/0/1_0_4194304";

#[tokio::test]
async fn test_chunk_stored_under_owner_prefix() {
    let fx = fixture().await;
    let content = Bytes::from_static(b"chunk content");

    assert_ok!(fx.storage.put(ALICE_KEY, content.clone()).await);

    assert_eq!(fx.backend.keys().await, vec!["alice/chunks/0/0/1_0_4194304"]);

    let object = fx.storage.head(ALICE_KEY).await.unwrap();
    assert_eq!(object.key(), ALICE_KEY);
    assert_eq!(object.size(), content.len() as u64);

    assert_eq!(fx.storage.get(ALICE_KEY, 0, None).await.unwrap(), content);
    assert_eq!(
        fx.storage.get(ALICE_KEY, 6, Some(7)).await.unwrap(),
        Bytes::from_static(b"content")
    );
    assert!(fx.diagnostics.is_empty());

    assert_ok!(fx.storage.delete(ALICE_KEY).await);
    assert!(fx.backend.keys().await.is_empty());
}

#[tokio::test]
async fn test_non_chunk_key_is_global() {
    let fx = fixture().await;
    let key = "chunks/0/0/bad";

    fx.storage.put(key, Bytes::from_static(b"x")).await.unwrap();
    assert_eq!(fx.backend.keys().await, vec![key]);
    assert_eq!(
        fx.diagnostics.events(),
        vec![(key.to_string(), KeyFormatError::ChunkName)]
    );

    assert_eq!(fx.storage.head(key).await.unwrap().key(), key);
    assert_eq!(fx.diagnostics.len(), 2);

    assert_eq!(
        fx.storage.get(key, 0, None).await.unwrap(),
        Bytes::from_static(b"x")
    );
    assert_eq!(fx.diagnostics.len(), 3);
}

#[tokio::test]
async fn test_translate_round_trip() {
    let fx = fixture().await;
    let translator = fx.storage.translator();

    for _ in 0..100 {
        let chunk_id = fastrand::u64(..);
        let depth = fastrand::usize(1..4);
        let dirs: Vec<String> = iter::repeat_with(|| fastrand::u8(..).to_string())
            .take(depth)
            .collect();
        let key = format!(
            "{}/{}_{}_{}",
            dirs.join("/"),
            chunk_id,
            fastrand::u32(..),
            fastrand::u32(..)
        );

        let owner = match chunk_id {
            1 => "alice",
            2 => "bob",
            _ => "carol",
        };
        let (prefix, physical) = translator.translate(&key).await;
        assert_eq!(physical, format!("{owner}/{key}"));
        assert_eq!(prefix.untranslate(&physical), key);
    }
    assert!(fx.diagnostics.is_empty());
}

#[tokio::test]
async fn test_head_missing_passes_backend_error() {
    let fx = fixture().await;
    let err = assert_err!(fx.storage.head(ALICE_KEY).await);
    assert!(matches!(err, Error::NoSuchKey));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_stays_in_marker_partition() {
    let fx = fixture().await;
    for key in [
        "chunks/0/0/1_0_10",
        "chunks/0/0/1_1_10",
        "chunks/0/0/1_2_10",
        "chunks/0/0/2_0_10",
        "chunks/0/0/3_0_10",
    ] {
        fx.storage.put(key, Bytes::from_static(b"d")).await.unwrap();
    }

    let objects = fx.storage.list("", "chunks/0/0/1_0_10", 100).await.unwrap();
    let listed: Vec<_> = objects.iter().map(|o| o.key()).collect();
    assert_eq!(listed, vec!["chunks/0/0/1_1_10", "chunks/0/0/1_2_10"]);

    let objects = fx.storage.list("chunks/", "chunks/0/0/2_0_0", 100).await.unwrap();
    let listed: Vec<_> = objects.iter().map(|o| o.key()).collect();
    assert_eq!(listed, vec!["chunks/0/0/2_0_10"]);

    let objects = fx.storage.list("", "chunks/0/0/1_0_10", 1).await.unwrap();
    assert_eq!(objects.len(), 1);

    // without a marker the physical namespace is listed as is
    let objects = fx.storage.list("carol/", "", 100).await.unwrap();
    let listed: Vec<_> = objects.iter().map(|o| o.key()).collect();
    assert_eq!(listed, vec!["carol/chunks/0/0/3_0_10"]);
}

#[tokio::test]
async fn test_list_all_relays_logical_keys_in_order() {
    let fx = fixture().await;
    let mut expected = Vec::new();
    for part in 0..50 {
        let key = format!("chunks/0/0/1_{part:02}_10");
        fx.storage.put(&key, Bytes::from_static(b"d")).await.unwrap();
        expected.push(key);
    }
    fx.storage
        .put("chunks/0/0/2_0_10", Bytes::from_static(b"d"))
        .await
        .unwrap();

    let stream = fx.storage.list_all("", "chunks/0/0/1_00_10").await.unwrap();
    let items = drain(stream).await;
    assert_eq!(keys(&items), expected[1..].to_vec());
}

#[tokio::test]
async fn test_list_all_with_small_buffer() {
    let backend = Arc::new(InMemoryStorage::new());
    let owners = Arc::new(StaticChunkOwners::with_default_owner("dave"));
    let storage = OwnerPrefixStorage::builder(backend, owners)
        .config(Config::builder().list_buffer_size(1).build())
        .build();

    for chunk in 10..30 {
        let key = format!("c/{chunk}_0_1");
        storage.put(&key, Bytes::new()).await.unwrap();
    }

    let stream = storage.list_all("c/", "c/10_0_1").await.unwrap();
    let mut received = Vec::new();
    while let Ok(item) = stream.recv().await {
        received.push(item);
        tokio::task::yield_now().await;
    }
    let expected: Vec<String> = (11..30).map(|chunk| format!("c/{chunk}_0_1")).collect();
    assert_eq!(keys(&received), expected);
}

#[tokio::test]
async fn test_multipart_upload_through_owner_prefix() {
    let fx = fixture().await;
    let key = "chunks/0/0/2_0_10";

    let upload = fx.storage.create_multipart_upload(key).await.unwrap();
    let part1 = fx
        .storage
        .upload_part(key, &upload.upload_id, 1, Bytes::from_static(b"hello "))
        .await
        .unwrap();
    let part2 = fx
        .storage
        .upload_part(key, &upload.upload_id, 2, Bytes::from_static(b"world"))
        .await
        .unwrap();

    let (pending, next_marker) = fx.storage.list_uploads("").await.unwrap();
    assert_eq!(pending.len(), 1);
    // an empty marker belongs to no partition, keys come back physical
    assert_eq!(pending[0].key, "bob/chunks/0/0/2_0_10");
    assert!(next_marker.is_empty());

    fx.storage
        .complete_upload(key, &upload.upload_id, &[part1, part2])
        .await
        .unwrap();

    assert_eq!(fx.backend.keys().await, vec!["bob/chunks/0/0/2_0_10"]);
    assert_eq!(
        fx.storage.get(key, 0, None).await.unwrap(),
        Bytes::from_static(b"hello world")
    );
}

#[tokio::test]
async fn test_list_uploads_strips_marker_partition() {
    let fx = fixture().await;
    let first = fx.storage.create_multipart_upload("a/1_0_10").await.unwrap();
    fx.storage
        .create_multipart_upload("a/1_1_10")
        .await
        .unwrap();

    // the marker is sent untranslated, so it is compared against physical keys
    let (pending, _) = fx.storage.list_uploads("a/1_0_10").await.unwrap();
    let listed: Vec<_> = pending.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(listed, vec!["a/1_0_10", "a/1_1_10"]);

    fx.storage.abort_upload("a/1_0_10", &first.upload_id).await;
    let (pending, _) = fx.storage.list_uploads("a/1_0_10").await.unwrap();
    let listed: Vec<_> = pending.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(listed, vec!["a/1_1_10"]);
}

#[tokio::test]
async fn test_permissions_forwarded_with_physical_path() {
    let fx = fixture().await;
    fx.storage
        .put(ALICE_KEY, Bytes::from_static(b"d"))
        .await
        .unwrap();

    assert_ok!(fx.storage.chmod(ALICE_KEY, 0o640).await);
    assert_ok!(fx.storage.chown(ALICE_KEY, "alice", "users").await);

    assert_eq!(
        fx.backend.permissions("alice/chunks/0/0/1_0_4194304").await,
        Some(Permissions {
            mode: Some(0o640),
            owner: Some("alice".to_string()),
            group: Some("users".to_string()),
        })
    );

    // backend errors come back untouched
    let err = assert_err!(fx.storage.chmod("chunks/0/0/2_0_1", 0o600).await);
    assert!(matches!(err, Error::NoSuchKey));
}

#[tokio::test]
async fn test_with_owner_prefix_uses_backend_permissions() {
    let backend = Arc::new(InMemoryStorage::new());
    let owners = Arc::new(StaticChunkOwners::with_default_owner("carol"));
    let storage = with_owner_prefix(backend.clone(), owners);
    assert!(storage.file_system().is_some());

    storage.put("c/1_0_1", Bytes::new()).await.unwrap();
    assert_ok!(storage.chmod("c/1_0_1", 0o600).await);
    assert_ok!(storage.chown("c/1_0_1", "root", "wheel").await);

    assert_eq!(
        backend.permissions("carol/c/1_0_1").await,
        Some(Permissions {
            mode: Some(0o600),
            owner: Some("root".to_string()),
            group: Some("wheel".to_string()),
        })
    );
}

async fn round_trip<S: ObjectStorage>(storage: &S, key: &str) {
    storage
        .put(key, Bytes::from_static(b"payload"))
        .await
        .unwrap();
    assert_eq!(storage.head(key).await.unwrap().key(), key);
    assert_eq!(
        storage.get(key, 0, None).await.unwrap(),
        Bytes::from_static(b"payload")
    );
}

#[tokio::test]
async fn test_decorators_stack_as_trait_objects() {
    let backend = Arc::new(InMemoryStorage::new());
    let alice = Arc::new(StaticChunkOwners::with_default_owner("alice"));
    let tenant = Arc::new(StaticChunkOwners::with_default_owner("tenant"));

    let inner: Arc<dyn ObjectStorage> = Arc::new(with_owner_prefix(backend.clone(), alice));
    let outer: Arc<dyn ObjectStorage> = Arc::new(with_owner_prefix(inner, tenant));

    assert_eq!(outer.to_string(), "memory://[owner][owner]");
    round_trip(&outer, "dir/5_0_7").await;

    // the inner decorator sees a chunk key again and adds its own partition
    assert_eq!(backend.keys().await, vec!["alice/tenant/dir/5_0_7"]);

    let fs = outer.file_system().unwrap();
    assert_ok!(fs.chmod("dir/5_0_7", 0o400).await);
    assert_eq!(
        backend
            .permissions("alice/tenant/dir/5_0_7")
            .await
            .and_then(|perms| perms.mode),
        Some(0o400)
    );
}
