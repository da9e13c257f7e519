//! Key derivation and payload encryption.
//!
//! The three steps -- composite key assembly, the iterated AES-ECB
//! transform, and the final SHA-256 mix -- are kept as separate small
//! functions so each can be tested and cited against an independent
//! reference vector on its own.

pub(crate) mod ciphers;
pub(crate) mod kdf;

use cipher::generic_array::{typenum::U32, GenericArray};
use sha2::{Digest, Sha256};

pub(crate) fn calculate_sha256(elements: &[&[u8]]) -> GenericArray<u8, U32> {
    let mut digest = Sha256::new();
    for element in elements {
        digest.update(element);
    }
    digest.finalize()
}
