//! Property-based tests for key backup.
//!
//! The lowest accepted iteration count keeps PBKDF2 cheap; the iteration count itself is
//! covered by unit tests.

mod helpers;

use std::collections::BTreeMap;

use proptest::prelude::*;
use tt_core::backup::{BackupCodec, EncryptedKeyBundle};
use tt_core::{BackupConfig, CryptoError, KeyId, PrivateKey};

use helpers::provider;

fn codec() -> BackupCodec {
    BackupCodec::new(provider(), BackupConfig::default().with_iterations(1_000))
}

/// Maps of key ids to arbitrary key bytes; the codec does not parse keys.
fn key_map_strategy() -> impl Strategy<Value = BTreeMap<KeyId, PrivateKey>> {
    prop::collection::btree_map("[0-9a-f]{32}", prop::collection::vec(any::<u8>(), 1..256), 0..4)
        .prop_map(|map| {
            map.into_iter()
                .map(|(id, der)| (KeyId::new(id), PrivateKey::from_der(der)))
                .collect()
        })
}

fn password_strategy() -> impl Strategy<Value = String> {
    "[ -~]{8,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: export then import with the same password restores every key
    #[test]
    fn backup_roundtrip(keys in key_map_strategy(), password in password_strategy()) {
        let bundle = codec().export(&keys, &password).expect("export");
        let json = bundle.to_json().expect("serialize");
        let parsed = EncryptedKeyBundle::from_json(&json).expect("parse");

        prop_assert_eq!(codec().import(&parsed, &password).expect("import"), keys);
    }

    /// Property: any other password is rejected with the generic error
    #[test]
    fn wrong_password_rejected(
        keys in key_map_strategy(),
        password in password_strategy(),
        other in password_strategy(),
    ) {
        prop_assume!(password != other);
        let bundle = codec().export(&keys, &password).expect("export");

        prop_assert_eq!(
            codec().import(&bundle, &other),
            Err(CryptoError::InvalidPasswordOrCorruptBundle)
        );
    }

    /// Property: passwords under eight characters never produce a bundle
    #[test]
    fn short_password_rejected(keys in key_map_strategy(), password in "[ -~]{0,7}") {
        prop_assert!(matches!(
            codec().export(&keys, &password),
            Err(CryptoError::Validation(_))
        ));
    }
}
