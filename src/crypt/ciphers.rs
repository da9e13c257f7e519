//! AES-256-CBC payload cipher with PKCS-style trailing-byte padding.
//!
//! The padding scheme matches `cipher::block_padding::Pkcs7` exactly: the
//! last plaintext byte names the padding length `p` in `1..=16`, and encoding
//! always appends at least one pad byte (`p = 16` when already block-aligned).

use cipher::block_padding::{Pkcs7, UnpadError};
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::CryptographyError;

pub(crate) struct Aes256CbcCipher {
    key: [u8; 32],
    iv: [u8; 16],
}

impl Aes256CbcCipher {
    pub(crate) fn new(key: &[u8; 32], iv: &[u8; 16]) -> Self {
        Aes256CbcCipher { key: *key, iv: *iv }
    }

    pub(crate) fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptographyError> {
        let encryptor = cbc::Encryptor::<aes::Aes256>::new_from_slices(&self.key, &self.iv)
            .map_err(CryptographyError::InvalidLength)?;
        Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptographyError> {
        if ciphertext.len() % 16 != 0 {
            // Caller maps this into DecryptionFailed; signal via the same
            // unpad error the block-padding crate would raise on a corrupt
            // tail, keeping callers down to a single failure case to match.
            return Err(CryptographyError::UnpadError(UnpadError));
        }

        let decryptor = cbc::Decryptor::<aes::Aes256>::new_from_slices(&self.key, &self.iv)
            .map_err(CryptographyError::InvalidLength)?;

        let mut buf = ciphertext.to_vec();
        let len = decryptor.decrypt_padded_mut::<Pkcs7>(&mut buf)?.len();
        buf.truncate(len);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unaligned_plaintext() {
        let cipher = Aes256CbcCipher::new(&[0x01; 32], &[0x02; 16]);
        let plaintext = b"a short message";
        let ciphertext = cipher.encrypt(plaintext).unwrap();
        assert_eq!(ciphertext.len() % 16, 0);
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn pads_by_a_full_block_when_already_aligned() {
        let cipher = Aes256CbcCipher::new(&[0x03; 32], &[0x04; 16]);
        let plaintext = [0x41u8; 32]; // exactly two blocks
        let ciphertext = cipher.encrypt(&plaintext).unwrap();
        assert_eq!(ciphertext.len(), 48); // one extra block of padding
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn rejects_ciphertext_not_a_multiple_of_the_block_size() {
        let cipher = Aes256CbcCipher::new(&[0x05; 32], &[0x06; 16]);
        assert!(cipher.decrypt(&[0u8; 17]).is_err());
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let cipher = Aes256CbcCipher::new(&[0x07; 32], &[0x08; 16]);
        let ciphertext = cipher.encrypt(&[]).unwrap();
        assert_eq!(ciphertext.len(), 16);
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), Vec::<u8>::new());
    }
}
