//! Integration tests for the `TtCore` facade.
//!
//! Covers the device lifecycle: creating and publishing an identity, moving
//! keys to a new device through a password backup, and reading messages
//! there.

mod helpers;

use std::collections::BTreeMap;

use tt_core::backup::EncryptedKeyBundle;
use tt_core::identity::{MemoryDirectory, MemoryKeyStore, PublicKeyDirectory, SecureKeyStore};
use tt_core::{CryptoError, KeyId, PrivateKey};

use helpers::{directory, Client};

#[tokio::test]
async fn new_identity_is_usable_once_published() {
    let device = Client::new("alice");
    let store = MemoryKeyStore::new();
    let directory = MemoryDirectory::new();

    let key_pair = device
        .core
        .create_identity(&store, "erin")
        .await
        .expect("identity creation should succeed");
    assert!(store.contains("erin").expect("store lookup"));

    // Not published yet: senders cannot address erin.
    let sender = Client::new("bob");
    assert!(matches!(
        sender.core.encrypt_for(&directory, "erin", "hi").await,
        Err(CryptoError::KeyNotFound(_))
    ));

    directory
        .publish("erin", key_pair.published())
        .expect("publish should succeed");
    let published = directory
        .get("erin")
        .await
        .expect("lookup")
        .expect("erin is published");
    assert_eq!(published.key_id, key_pair.key_id);

    let payload = sender
        .core
        .encrypt_for(&directory, "erin", "welcome")
        .await
        .expect("encryption should succeed");
    let private_key = device
        .core
        .load_private_key(&store, "erin")
        .expect("key should be stored");
    assert_eq!(
        device.core.decrypt_direct(&payload, &private_key).expect("decrypt"),
        "welcome"
    );
}

#[tokio::test]
async fn backup_moves_keys_to_a_new_device() {
    let old_device = Client::new("bob");
    let sender = Client::new("alice");
    let bob = old_device.key_pair();

    let payload = sender
        .core
        .encrypt_for(&directory(), "bob", "read me on the new phone")
        .await
        .expect("encryption should succeed");

    let keys: BTreeMap<KeyId, PrivateKey> =
        [(bob.key_id.clone(), bob.private_key().clone())].into();
    let file = old_device
        .core
        .export_backup(&keys, "a strong passphrase")
        .await
        .expect("export should succeed")
        .to_json()
        .expect("serialize");

    // New device: parse the file, restore into its own key store.
    let new_device = Client::new("bob");
    let store = MemoryKeyStore::new();
    let bundle = EncryptedKeyBundle::from_json(&file).expect("parse backup file");
    let restored = new_device
        .core
        .import_backup(&bundle, "a strong passphrase")
        .await
        .expect("import should succeed");
    let private_key = restored.get(&bob.key_id).expect("key id should be restored");
    store.put("bob", private_key).expect("store");

    let loaded = new_device.core.load_private_key(&store, "bob").expect("load");
    assert_eq!(
        new_device
            .core
            .identities()
            .public_key_for(&loaded)
            .expect("derive public key"),
        bob.public_key
    );
    assert_eq!(
        new_device.core.decrypt_direct(&payload, &loaded).expect("decrypt"),
        "read me on the new phone"
    );
}

#[tokio::test]
async fn backup_rejections() {
    let device = Client::new("alice");
    let alice = device.key_pair();
    let keys: BTreeMap<KeyId, PrivateKey> =
        [(alice.key_id.clone(), alice.private_key().clone())].into();

    assert!(matches!(
        device.core.export_backup(&keys, "short").await,
        Err(CryptoError::Validation(_))
    ));

    let bundle = device
        .core
        .export_backup(&keys, "long enough")
        .await
        .expect("export should succeed");
    assert_eq!(
        device.core.import_backup(&bundle, "not the password").await,
        Err(CryptoError::InvalidPasswordOrCorruptBundle)
    );

    let future_version = EncryptedKeyBundle {
        version: "2.0".to_string(),
        ..bundle
    };
    assert_eq!(
        device.core.import_backup(&future_version, "long enough").await,
        Err(CryptoError::UnsupportedVersion("2.0".to_string()))
    );
}

#[tokio::test]
async fn late_joiner_reads_current_key_history() {
    let directory = directory();
    let alice = Client::new("alice");
    let dave = Client::new("dave");

    let mut bundle = alice
        .core
        .create_group(&directory, "book-club", &["alice", "bob"], "alice")
        .await
        .expect("group creation should succeed");
    let earlier = alice
        .core
        .encrypt_group("book-club", "chapter one thoughts")
        .expect("encrypt");

    alice
        .core
        .add_member(&directory, "book-club", &mut bundle, "dave")
        .await
        .expect("add member should succeed");
    assert!(bundle.contains_member("dave"));

    dave.core
        .accept_bundle("book-club", &bundle, "dave", dave.key_pair().private_key())
        .expect("dave should accept");
    assert_eq!(
        dave.core.decrypt_group("book-club", &earlier).expect("decrypt"),
        "chapter one thoughts"
    );
}

#[tokio::test]
async fn unknown_member_blocks_group_creation() {
    let alice = Client::new("alice");
    let result = alice
        .core
        .create_group(&directory(), "g", &["alice", "stranger"], "alice")
        .await;
    assert!(matches!(result, Err(CryptoError::KeyNotFound(_))));
    assert!(alice.core.key_cache().current("g").is_none());
}
