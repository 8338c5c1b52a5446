use std::fmt;

use crate::error::CipherError;
use crate::policy::REQUIRED_KEY_LENGTH;

/// Raw 24-byte TDES key. No stretching or hashing: the bytes are the key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; REQUIRED_KEY_LENGTH]);

impl EncryptionKey {
    pub fn new(bytes: &[u8]) -> Result<Self, CipherError> {
        let arr: [u8; REQUIRED_KEY_LENGTH] =
            bytes.try_into().map_err(|_| CipherError::KeyLength {
                expected: REQUIRED_KEY_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Key text is taken as its UTF-8 bytes.
    pub fn from_text(text: &str) -> Result<Self, CipherError> {
        Self::new(text.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Never print key material.
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
