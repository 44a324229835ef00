//! Root key storage shared by the issuer and the verifier.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::{PaymentHash, RootKey};

/// A thread-safe map from payment hash to the root key its macaroon was sealed with.
///
/// A token can only be verified while its root key is present. Implementations
/// must tolerate concurrent `put` and `get` from independent requests; the last
/// `put` for a given hash wins.
pub trait RootKeyStore: Send + Sync {
    fn put(&self, payment_hash: PaymentHash, root_key: RootKey);

    fn get(&self, payment_hash: &PaymentHash) -> Option<RootKey>;

    /// Revoke a root key, returning it if present.
    fn remove(&self, payment_hash: &PaymentHash) -> Option<RootKey>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local [`RootKeyStore`] backed by a `HashMap`.
///
/// Entries are never evicted.
#[derive(Debug, Default)]
pub struct MemoryRootKeyStore {
    keys: RwLock<HashMap<PaymentHash, RootKey>>,
}

impl MemoryRootKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RootKeyStore for MemoryRootKeyStore {
    fn put(&self, payment_hash: PaymentHash, root_key: RootKey) {
        self.keys.write().insert(payment_hash, root_key);
    }

    fn get(&self, payment_hash: &PaymentHash) -> Option<RootKey> {
        self.keys.read().get(payment_hash).copied()
    }

    fn remove(&self, payment_hash: &PaymentHash) -> Option<RootKey> {
        self.keys.write().remove(payment_hash)
    }

    fn len(&self) -> usize {
        self.keys.read().len()
    }
}
