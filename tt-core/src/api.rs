//! Application-facing entry point.

use std::collections::BTreeMap;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::backup::{BackupCodec, EncryptedKeyBundle};
use crate::config::CoreConfig;
use crate::crypto::{
    ensure_protocol_version, CryptoError, CryptoProvider, KeyId, PrivateKey, PublicKey, Result,
    RustCryptoProvider,
};
use crate::direct::{EncryptedMessage, MessageCipher};
use crate::expiry::{DeletionSink, Message, Scheduler, TimerStart};
use crate::group::{GroupCipher, GroupEncryptedMessage, GroupKeyBundle, GroupKeyManager, KeyCache};
use crate::identity::{IdentityKeyManager, KeyPair, PublicKeyDirectory, SecureKeyStore};

/// One client's encryption engine.
///
/// Owns the components, the group key cache and the expiry scheduler. The
/// collaborators (key store, directory) are passed per call so the caller
/// decides their lifetime.
///
/// Methods that do CPU-heavy work (RSA key generation, PBKDF2) are `async`
/// and run that work on tokio's blocking pool.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tt_core::expiry::RecordingSink;
/// use tt_core::TtCore;
///
/// let core = TtCore::with_defaults(Arc::new(RecordingSink::new())).unwrap();
/// assert_eq!(core.provider_name(), "rustcrypto");
/// ```
pub struct TtCore {
    provider: Arc<dyn CryptoProvider>,
    config: CoreConfig,
    identities: IdentityKeyManager,
    messages: MessageCipher,
    group_keys: GroupKeyManager,
    group_cipher: GroupCipher,
    backup: BackupCodec,
    key_cache: KeyCache,
    scheduler: Scheduler,
}

impl TtCore {
    /// Creates an engine after checking that `provider` works.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CryptoUnavailable`] if the provider fails its
    /// self-test. The caller should refuse to start.
    pub fn new(
        provider: Arc<dyn CryptoProvider>,
        sink: Arc<dyn DeletionSink>,
        config: CoreConfig,
    ) -> Result<Self> {
        self_test(provider.as_ref()).map_err(|e| {
            CryptoError::CryptoUnavailable(format!(
                "provider {} failed self-test: {e}",
                provider.name()
            ))
        })?;

        tracing::debug!(provider = provider.name(), "initialized tt core");

        Ok(Self {
            identities: IdentityKeyManager::new(Arc::clone(&provider)),
            messages: MessageCipher::new(Arc::clone(&provider)),
            group_keys: GroupKeyManager::new(Arc::clone(&provider)),
            group_cipher: GroupCipher::new(Arc::clone(&provider)),
            backup: BackupCodec::new(Arc::clone(&provider), config.backup.clone()),
            key_cache: KeyCache::new(),
            scheduler: Scheduler::new(sink),
            provider,
            config,
        })
    }

    /// Creates an engine with [`RustCryptoProvider`] and default settings.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_defaults(sink: Arc<dyn DeletionSink>) -> Result<Self> {
        Self::new(Arc::new(RustCryptoProvider::new()), sink, CoreConfig::default())
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub const fn identities(&self) -> &IdentityKeyManager {
        &self.identities
    }

    #[must_use]
    pub const fn messages(&self) -> &MessageCipher {
        &self.messages
    }

    #[must_use]
    pub const fn group_keys(&self) -> &GroupKeyManager {
        &self.group_keys
    }

    #[must_use]
    pub const fn group_cipher(&self) -> &GroupCipher {
        &self.group_cipher
    }

    #[must_use]
    pub const fn backup(&self) -> &BackupCodec {
        &self.backup
    }

    #[must_use]
    pub const fn key_cache(&self) -> &KeyCache {
        &self.key_cache
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Generates an identity for `user_id` and stores its private key.
    ///
    /// Publishing [`KeyPair::published`] to the directory is left to the
    /// caller.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::CryptoUnavailable`] if key generation fails
    /// - [`CryptoError::Storage`] if the key store rejects the key
    pub async fn create_identity(&self, store: &dyn SecureKeyStore, user_id: &str) -> Result<KeyPair> {
        let identities = self.identities.clone();
        let key_pair = run_blocking(move || identities.generate_identity()).await?;
        store.put(user_id, key_pair.private_key())?;

        tracing::debug!(key_id = %key_pair.key_id, "stored new identity");
        Ok(key_pair)
    }

    /// Loads the local private key of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if this device holds no key for
    /// the user, or [`CryptoError::Storage`] if the store fails.
    pub fn load_private_key(&self, store: &dyn SecureKeyStore, user_id: &str) -> Result<PrivateKey> {
        store
            .get(user_id)?
            .ok_or_else(|| CryptoError::KeyNotFound(format!("no local private key for {user_id}")))
    }

    // ------------------------------------------------------------------
    // Direct messages
    // ------------------------------------------------------------------

    /// Encrypts `plaintext` for `recipient_id`'s published key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the recipient has not
    /// published a key, plus the errors of
    /// [`MessageCipher::encrypt_direct`].
    pub async fn encrypt_for(
        &self,
        directory: &dyn PublicKeyDirectory,
        recipient_id: &str,
        plaintext: &str,
    ) -> Result<EncryptedMessage> {
        let published = directory.require(recipient_id).await?;
        self.messages.encrypt_direct(plaintext, &published.public_key)
    }

    /// Decrypts a direct message addressed to the holder of `private_key`.
    ///
    /// # Errors
    ///
    /// Same as [`MessageCipher::decrypt_direct`].
    pub fn decrypt_direct(&self, payload: &EncryptedMessage, private_key: &PrivateKey) -> Result<String> {
        self.messages.decrypt_direct(payload, private_key)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Creates the first group key of a conversation and caches it as
    /// current.
    ///
    /// Returns the bundle to persist as the conversation's current bundle.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if a member has not published a
    /// key, plus the errors of [`GroupKeyManager::create_bundle`].
    pub async fn create_group(
        &self,
        directory: &dyn PublicKeyDirectory,
        conversation_id: &str,
        member_ids: &[&str],
        creator_id: &str,
    ) -> Result<GroupKeyBundle> {
        let members = lookup_public_keys(directory, member_ids).await?;
        let created = self.group_keys.create_bundle(&members, creator_id)?;

        self.key_cache.set_current(
            conversation_id,
            created.bundle.key_id.clone(),
            created.group_key,
        );
        Ok(created.bundle)
    }

    /// Gives `new_member_id` access to the current key by adding an entry to
    /// `bundle`. Does not rotate.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the bundle's key is not cached
    /// or the new member has no published key.
    pub async fn add_member(
        &self,
        directory: &dyn PublicKeyDirectory,
        conversation_id: &str,
        bundle: &mut GroupKeyBundle,
        new_member_id: &str,
    ) -> Result<()> {
        let group_key = self
            .key_cache
            .get(conversation_id, &bundle.key_id)
            .ok_or_else(|| missing_group_key(conversation_id, &bundle.key_id))?;
        let published = directory.require(new_member_id).await?;

        let wrapped = self.group_keys.add_member(&group_key, &published.public_key)?;
        bundle.add_entry(new_member_id, wrapped);
        Ok(())
    }

    /// Removes `removed_id` and rotates the conversation key in one step.
    ///
    /// Returns the new bundle, which must replace the current one in the same
    /// write that records the membership change. The old key stays cached so
    /// earlier messages remain readable.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_group`].
    pub async fn remove_member(
        &self,
        directory: &dyn PublicKeyDirectory,
        conversation_id: &str,
        remaining_ids: &[&str],
        removed_id: &str,
        initiator_id: &str,
    ) -> Result<GroupKeyBundle> {
        let members = lookup_public_keys(directory, remaining_ids).await?;
        let rotated = self
            .group_keys
            .remove_member(&members, removed_id, initiator_id)?;

        self.key_cache.set_current(
            conversation_id,
            rotated.bundle.key_id.clone(),
            rotated.group_key,
        );
        Ok(rotated.bundle)
    }

    /// Unwraps `member_id`'s entry of the conversation's current bundle and
    /// makes it the key for new messages.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::KeyNotFound`] if the bundle has no entry for the member
    /// - [`CryptoError::DecryptionFailed`] if the entry cannot be unwrapped
    pub fn accept_bundle(
        &self,
        conversation_id: &str,
        bundle: &GroupKeyBundle,
        member_id: &str,
        private_key: &PrivateKey,
    ) -> Result<KeyId> {
        let group_key = self
            .group_keys
            .decrypt_bundle_entry(bundle.entry_for(member_id)?, private_key)?;
        self.key_cache
            .set_current(conversation_id, bundle.key_id.clone(), group_key);
        Ok(bundle.key_id.clone())
    }

    /// Like [`Self::accept_bundle`] for a superseded bundle: the key is cached
    /// for reading history but not used for new messages.
    ///
    /// # Errors
    ///
    /// Same as [`Self::accept_bundle`].
    pub fn accept_previous_bundle(
        &self,
        conversation_id: &str,
        bundle: &GroupKeyBundle,
        member_id: &str,
        private_key: &PrivateKey,
    ) -> Result<KeyId> {
        let group_key = self
            .group_keys
            .decrypt_bundle_entry(bundle.entry_for(member_id)?, private_key)?;
        self.key_cache
            .insert(conversation_id, bundle.key_id.clone(), group_key);
        Ok(bundle.key_id.clone())
    }

    /// Encrypts a group message under the conversation's current key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if no key is cached for the
    /// conversation.
    pub fn encrypt_group(&self, conversation_id: &str, plaintext: &str) -> Result<GroupEncryptedMessage> {
        let (key_id, group_key) = self.key_cache.current(conversation_id).ok_or_else(|| {
            CryptoError::KeyNotFound(format!("no group key for conversation {conversation_id}"))
        })?;
        self.group_cipher.encrypt(plaintext, &group_key, &key_id)
    }

    /// Decrypts a group message with the cached key named by its `keyId`.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::UnsupportedMessageVersion`] for an unknown version
    /// - [`CryptoError::KeyNotFound`] if the key is not cached, for example
    ///   because this member was excluded by a rotation
    /// - [`CryptoError::DecryptionFailed`] for every other failure
    pub fn decrypt_group(&self, conversation_id: &str, payload: &GroupEncryptedMessage) -> Result<String> {
        ensure_protocol_version(&payload.version)?;
        let group_key = self
            .key_cache
            .get(conversation_id, &payload.key_id)
            .ok_or_else(|| missing_group_key(conversation_id, &payload.key_id))?;
        self.group_cipher.decrypt(payload, &group_key)
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Exports private keys under `password`, on the blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`BackupCodec::export`].
    pub async fn export_backup(
        &self,
        private_keys: &BTreeMap<KeyId, PrivateKey>,
        password: &str,
    ) -> Result<EncryptedKeyBundle> {
        let codec = self.backup.clone();
        let private_keys = private_keys.clone();
        let password = Zeroizing::new(password.to_owned());
        run_blocking(move || codec.export(&private_keys, &password)).await
    }

    /// Restores private keys from a backup, on the blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`BackupCodec::import`].
    pub async fn import_backup(
        &self,
        bundle: &EncryptedKeyBundle,
        password: &str,
    ) -> Result<BTreeMap<KeyId, PrivateKey>> {
        let codec = self.backup.clone();
        let bundle = bundle.clone();
        let password = Zeroizing::new(password.to_owned());
        run_blocking(move || codec.import(&bundle, &password)).await
    }

    // ------------------------------------------------------------------
    // Expiry
    // ------------------------------------------------------------------

    /// Arms a timer that deletes `message` through the sink when it expires.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime.
    pub fn schedule_expiry(&self, message: &Message) -> TimerStart {
        self.scheduler
            .start_timer(message, self.scheduler.delete_on_expire())
    }

    /// Re-arms deletion timers after a restart. Returns how many were armed.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime.
    pub fn restore_expiry(&self, messages: &[Message]) -> usize {
        self.scheduler
            .initialize_timers(messages, &self.scheduler.delete_on_expire())
    }

    /// Deletes expired messages and returns the rest.
    pub async fn cleanup_expired(&self, messages: Vec<Message>) -> Vec<Message> {
        self.scheduler.cleanup_expired(messages).await
    }
}

impl std::fmt::Debug for TtCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtCore")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("key_cache", &self.key_cache)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

/// Checks randomness and the AEAD without the cost of RSA key generation.
fn self_test(provider: &dyn CryptoProvider) -> Result<()> {
    const PROBE: &[u8] = b"tt-core self-test";

    let mut key = [0u8; 32];
    provider.random_bytes(&mut key)?;
    let nonce = [0u8; 12];

    let sealed = provider.aead_seal(&key, &nonce, PROBE)?;
    let opened = provider.aead_open(&key, &nonce, &sealed)?;
    if opened.as_slice() != PROBE {
        return Err(CryptoError::CryptoUnavailable(
            "AEAD round trip mismatch".to_string(),
        ));
    }
    Ok(())
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CryptoError::CryptoUnavailable(format!("blocking task failed: {e}")))?
}

async fn lookup_public_keys(
    directory: &dyn PublicKeyDirectory,
    user_ids: &[&str],
) -> Result<BTreeMap<String, PublicKey>> {
    let mut keys = BTreeMap::new();
    for user_id in user_ids {
        let published = directory.require(user_id).await?;
        keys.insert((*user_id).to_string(), published.public_key);
    }
    Ok(keys)
}

fn missing_group_key(conversation_id: &str, key_id: &KeyId) -> CryptoError {
    CryptoError::KeyNotFound(format!(
        "group key {key_id} not cached for conversation {conversation_id}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupConfig;
    use crate::crypto::{NONCE_SIZE, SYMMETRIC_KEY_SIZE};
    use crate::expiry::RecordingSink;
    use crate::identity::{MemoryDirectory, MemoryKeyStore};
    use crate::test_support;

    fn core() -> TtCore {
        let config = CoreConfig {
            backup: BackupConfig::default().with_iterations(1_000),
        };
        TtCore::new(
            test_support::provider(),
            Arc::new(RecordingSink::new()),
            config,
        )
        .unwrap()
    }

    /// Directory with alice, bob and carol from the shared identity pool.
    fn directory() -> MemoryDirectory {
        let directory = MemoryDirectory::new();
        for (index, user) in ["alice", "bob", "carol"].into_iter().enumerate() {
            directory
                .publish(user, test_support::identity(index).published())
                .unwrap();
        }
        directory
    }

    struct BrokenProvider;

    impl CryptoProvider for BrokenProvider {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn random_bytes(&self, _buf: &mut [u8]) -> Result<()> {
            Err(CryptoError::CryptoUnavailable("no entropy".to_string()))
        }

        fn generate_key_pair(&self) -> Result<(PublicKey, PrivateKey)> {
            Err(CryptoError::CryptoUnavailable("unsupported".to_string()))
        }

        fn public_key_from_private(&self, _private_key: &PrivateKey) -> Result<PublicKey> {
            Err(CryptoError::CryptoUnavailable("unsupported".to_string()))
        }

        fn wrap_key(&self, _public_key: &PublicKey, _key: &[u8]) -> Result<Vec<u8>> {
            Err(CryptoError::CryptoUnavailable("unsupported".to_string()))
        }

        fn unwrap_key(&self, _private_key: &PrivateKey, _wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
            Err(CryptoError::DecryptionFailed)
        }

        fn aead_seal(
            &self,
            _key: &[u8; SYMMETRIC_KEY_SIZE],
            _nonce: &[u8; NONCE_SIZE],
            _plaintext: &[u8],
        ) -> Result<Vec<u8>> {
            Err(CryptoError::CryptoUnavailable("unsupported".to_string()))
        }

        fn aead_open(
            &self,
            _key: &[u8; SYMMETRIC_KEY_SIZE],
            _nonce: &[u8; NONCE_SIZE],
            _ciphertext: &[u8],
        ) -> Result<Zeroizing<Vec<u8>>> {
            Err(CryptoError::DecryptionFailed)
        }

        fn digest(&self, _data: &[u8]) -> [u8; 32] {
            [0; 32]
        }

        fn derive_key(
            &self,
            _password: &[u8],
            _salt: &[u8],
            _iterations: u32,
        ) -> Result<Zeroizing<[u8; SYMMETRIC_KEY_SIZE]>> {
            Err(CryptoError::CryptoUnavailable("unsupported".to_string()))
        }
    }

    #[test]
    fn with_defaults_uses_rustcrypto() {
        let core = TtCore::with_defaults(Arc::new(RecordingSink::new())).unwrap();
        assert_eq!(core.provider_name(), "rustcrypto");
        assert_eq!(core.config().backup.iterations, 100_000);
    }

    #[test]
    fn broken_provider_is_rejected_at_startup() {
        let result = TtCore::new(
            Arc::new(BrokenProvider),
            Arc::new(RecordingSink::new()),
            CoreConfig::default(),
        );
        match result {
            Err(CryptoError::CryptoUnavailable(message)) => assert!(message.contains("broken")),
            other => panic!("expected CryptoUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_identity_stores_private_key() {
        let core = core();
        let store = MemoryKeyStore::new();

        let key_pair = core.create_identity(&store, "alice").await.unwrap();

        let loaded = core.load_private_key(&store, "alice").unwrap();
        assert_eq!(&loaded, key_pair.private_key());
        assert_eq!(
            core.identities().public_key_for(&loaded).unwrap(),
            key_pair.public_key
        );
    }

    #[test]
    fn missing_private_key_is_key_not_found() {
        let store = MemoryKeyStore::new();
        assert!(matches!(
            core().load_private_key(&store, "nobody"),
            Err(CryptoError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn direct_message_through_directory() {
        let core = core();
        let payload = core.encrypt_for(&directory(), "bob", "hello").await.unwrap();

        let bob = test_support::identity(1);
        assert_eq!(core.decrypt_direct(&payload, bob.private_key()).unwrap(), "hello");
    }

    #[tokio::test]
    async fn unknown_recipient_is_key_not_found() {
        let result = core().encrypt_for(&directory(), "mallory", "hello").await;
        assert!(matches!(result, Err(CryptoError::KeyNotFound(_))));
    }

    #[tokio::test]
    async fn group_flow_between_two_clients() {
        let directory = directory();
        let alice_core = core();
        let bob_core = core();

        let bundle = alice_core
            .create_group(&directory, "conv", &["alice", "bob"], "alice")
            .await
            .unwrap();
        bob_core
            .accept_bundle("conv", &bundle, "bob", test_support::identity(1).private_key())
            .unwrap();

        let payload = alice_core.encrypt_group("conv", "hi group").unwrap();
        assert_eq!(payload.key_id, bundle.key_id);
        assert_eq!(bob_core.decrypt_group("conv", &payload).unwrap(), "hi group");

        let reply = bob_core.encrypt_group("conv", "hi alice").unwrap();
        assert_eq!(alice_core.decrypt_group("conv", &reply).unwrap(), "hi alice");
    }

    #[tokio::test]
    async fn added_member_reads_current_key() {
        let directory = directory();
        let alice_core = core();
        let carol_core = core();

        let mut bundle = alice_core
            .create_group(&directory, "conv", &["alice", "bob"], "alice")
            .await
            .unwrap();
        let before = alice_core.encrypt_group("conv", "before carol").unwrap();

        alice_core
            .add_member(&directory, "conv", &mut bundle, "carol")
            .await
            .unwrap();
        carol_core
            .accept_bundle("conv", &bundle, "carol", test_support::identity(2).private_key())
            .unwrap();

        // No rotation on add: history under the same key is readable.
        assert_eq!(carol_core.decrypt_group("conv", &before).unwrap(), "before carol");
    }

    #[tokio::test]
    async fn removal_rotates_and_keeps_history_readable() {
        let directory = directory();
        let alice_core = core();
        let carol_core = core();
        let carol = test_support::identity(2);

        let first = alice_core
            .create_group(&directory, "conv", &["alice", "bob", "carol"], "alice")
            .await
            .unwrap();
        carol_core
            .accept_bundle("conv", &first, "carol", carol.private_key())
            .unwrap();
        let old_message = alice_core.encrypt_group("conv", "before removal").unwrap();

        let rotated = alice_core
            .remove_member(&directory, "conv", &["alice", "bob"], "carol", "alice")
            .await
            .unwrap();
        assert_ne!(rotated.key_id, first.key_id);
        assert!(!rotated.contains_member("carol"));

        let new_message = alice_core.encrypt_group("conv", "after removal").unwrap();
        assert_eq!(new_message.key_id, rotated.key_id);

        assert!(matches!(
            carol_core.accept_bundle("conv", &rotated, "carol", carol.private_key()),
            Err(CryptoError::KeyNotFound(_))
        ));
        assert!(matches!(
            carol_core.decrypt_group("conv", &new_message),
            Err(CryptoError::KeyNotFound(_))
        ));
        assert_eq!(
            alice_core.decrypt_group("conv", &old_message).unwrap(),
            "before removal"
        );
    }

    #[tokio::test]
    async fn previous_bundle_is_cached_for_history_only() {
        let directory = directory();
        let alice_core = core();
        let bob_core = core();
        let bob = test_support::identity(1);

        let first = alice_core
            .create_group(&directory, "conv", &["alice", "bob"], "alice")
            .await
            .unwrap();
        let old_message = alice_core.encrypt_group("conv", "old").unwrap();
        let second = alice_core
            .remove_member(&directory, "conv", &["alice", "bob"], "carol", "alice")
            .await
            .unwrap();

        bob_core.accept_bundle("conv", &second, "bob", bob.private_key()).unwrap();
        bob_core
            .accept_previous_bundle("conv", &first, "bob", bob.private_key())
            .unwrap();

        assert_eq!(bob_core.decrypt_group("conv", &old_message).unwrap(), "old");
        let fresh = bob_core.encrypt_group("conv", "new").unwrap();
        assert_eq!(fresh.key_id, second.key_id);
    }

    #[test]
    fn group_operations_without_key_are_key_not_found() {
        let core = core();
        assert!(matches!(
            core.encrypt_group("conv", "hi"),
            Err(CryptoError::KeyNotFound(_))
        ));

        let payload = GroupEncryptedMessage {
            version: "tt-e1".to_string(),
            data: "AAAA".to_string(),
            iv: "AAAAAAAAAAAAAAAA".to_string(),
            key_id: KeyId::from("unknown"),
        };
        assert!(matches!(
            core.decrypt_group("conv", &payload),
            Err(CryptoError::KeyNotFound(_))
        ));

        let legacy = GroupEncryptedMessage {
            version: "legacy".to_string(),
            ..payload
        };
        assert_eq!(
            core.decrypt_group("conv", &legacy),
            Err(CryptoError::UnsupportedMessageVersion("legacy".to_string()))
        );
    }

    #[tokio::test]
    async fn backup_roundtrip_on_blocking_pool() {
        let core = core();
        let identity = test_support::identity(0);
        let keys: BTreeMap<KeyId, PrivateKey> =
            [(identity.key_id.clone(), identity.private_key().clone())].into();

        let bundle = core.export_backup(&keys, "long enough password").await.unwrap();
        assert_eq!(bundle.iterations, 1_000);

        let restored = core.import_backup(&bundle, "long enough password").await.unwrap();
        assert_eq!(restored, keys);
        assert_eq!(
            core.import_backup(&bundle, "wrong password").await,
            Err(CryptoError::InvalidPasswordOrCorruptBundle)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_expiry_deletes_through_sink() {
        let sink = Arc::new(RecordingSink::new());
        let core = TtCore::new(test_support::provider(), sink.clone(), CoreConfig::default()).unwrap();
        let message = Message::with_ttl(
            "m1",
            "conv",
            chrono::Utc::now(),
            chrono::Duration::seconds(30),
        )
        .unwrap();

        assert_eq!(core.schedule_expiry(&message), TimerStart::Armed);
        assert_eq!(core.restore_expiry(std::slice::from_ref(&message)), 0);

        tokio::time::sleep(std::time::Duration::from_secs(31)).await;
        assert_eq!(sink.deleted_ids(), vec!["m1"]);
        assert_eq!(core.scheduler().active_timers(), 0);
    }

    #[test]
    fn debug_output_has_no_key_material() {
        let debug = format!("{:?}", core());
        assert!(debug.contains("TtCore"));
        assert!(debug.contains("rustcrypto"));
    }
}
