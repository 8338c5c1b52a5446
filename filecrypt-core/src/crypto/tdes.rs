//! Triple-DES (EDE3) in ECB mode with PKCS#7 padding.
//!
//! ECB encrypts every 8-byte block independently: identical plaintext blocks
//! give identical ciphertext blocks, and there is no integrity tag. This is
//! weak and is kept only so files written by earlier versions of the tool
//! keep decrypting. Switching mode would break that round trip.

use des::TdesEde3;
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};

use crate::error::CipherError;
use crate::policy::REQUIRED_KEY_LENGTH;

pub const BLOCK_SIZE: usize = 8;

type TdesEcbEnc = ecb::Encryptor<TdesEde3>;
type TdesEcbDec = ecb::Decryptor<TdesEde3>;

pub trait CipherCodec: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError>;
    fn decrypt(&self, ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TdesEcb;

impl CipherCodec for TdesEcb {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
        let enc = TdesEcbEnc::new_from_slice(key).map_err(|_| key_length(key))?;
        Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn decrypt(&self, ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
        let dec = TdesEcbDec::new_from_slice(key).map_err(|_| key_length(key))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::Misaligned {
                len: ciphertext.len(),
            });
        }
        dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::Padding)
    }
}

/// Padded output size for `len` plaintext bytes (aligned input gains a full block).
pub fn ciphertext_len(len: usize) -> usize {
    (len / BLOCK_SIZE + 1) * BLOCK_SIZE
}

fn key_length(key: &[u8]) -> CipherError {
    CipherError::KeyLength {
        expected: REQUIRED_KEY_LENGTH,
        actual: key.len(),
    }
}
