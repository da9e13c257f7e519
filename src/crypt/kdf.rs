//! The iterated AES-ECB key-strengthening transform.

use aes::Aes256;
use cipher::generic_array::{typenum::U32, GenericArray};
use cipher::{BlockEncrypt, KeyInit};
use sha2::{Digest, Sha256};

/// Apply `rounds` AES-ECB encryptions (keyed by `seed`) to `composite_key`,
/// then fold the result through SHA-256.
///
/// Matches the KeePass v1 transform: the 32-byte composite key is treated as
/// two independent 16-byte blocks, each encrypted in place, not as one
/// 32-byte ECB pass. `rounds = 0` is a no-op pass-through before the SHA mix.
pub(crate) fn transform_composite_key(
    composite_key: &GenericArray<u8, U32>,
    seed: &[u8; 32],
    rounds: u64,
) -> GenericArray<u8, U32> {
    let cipher = Aes256::new(GenericArray::from_slice(seed));

    let mut block1 = GenericArray::clone_from_slice(&composite_key[..16]);
    let mut block2 = GenericArray::clone_from_slice(&composite_key[16..]);

    for _ in 0..rounds {
        cipher.encrypt_block(&mut block1);
        cipher.encrypt_block(&mut block2);
    }

    let mut digest = Sha256::new();
    digest.update(block1);
    digest.update(block2);
    digest.finalize()
}
