// filecrypt_core/src/keystore.rs
use std::sync::{Arc, Mutex};

use crate::error::KeyStoreError;

/// Where the last used key is remembered between runs.
pub trait KeyStore: Send + Sync {
    fn load(&self) -> Result<Option<Vec<u8>>, KeyStoreError>;

    fn save(&self, key: &[u8]) -> Result<(), KeyStoreError>;
}

/// Process-local store; forgotten on exit. Handy for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<Mutex<Option<Vec<u8>>>>,
}

impl KeyStore for MemoryKeyStore {
    fn load(&self) -> Result<Option<Vec<u8>>, KeyStoreError> {
        let guard = self.inner.lock().map_err(|_| KeyStoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, key: &[u8]) -> Result<(), KeyStoreError> {
        let mut guard = self.inner.lock().map_err(|_| KeyStoreError::Poisoned)?;
        *guard = Some(key.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryKeyStore::default();
        assert_eq!(store.load().unwrap(), None);
        store.save(b"abcdefghijklmnopqrstuvwx").unwrap();
        let copy = store.clone();
        assert_eq!(copy.load().unwrap().as_deref(), Some(&b"abcdefghijklmnopqrstuvwx"[..]));
    }
}
