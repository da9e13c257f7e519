//! The fixed 124-byte database header.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DatabaseIntegrityError;

pub(crate) const HEADER_SIZE: usize = 124;

const SIGNATURE1: u32 = 0x9AA2_D903;
const SIGNATURE2: u32 = 0xB54B_FB65;

/// Low bit of `flags` selecting SHA-2 for the (unused by this crate) hash of
/// the header itself in later KeePass1 builds; kept only for documentation.
const FLAG_SHA2: u32 = 1;
/// Bit of `flags` selecting the Rijndael (AES) cipher -- the only cipher this
/// crate implements.
const FLAG_RIJNDAEL: u32 = 2;
const FLAG_ARCFOUR: u32 = 4;
const FLAG_TWOFISH: u32 = 8;

/// The cipher named by the header's `flags` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionType {
    Rijndael,
}

/// The fixed-size database header: magic, version, seeds, IV, record
/// counts, content hash, and key-transform parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub flags: u32,
    pub version: u32,
    pub master_seed: [u8; 16],
    pub encryption_iv: [u8; 16],
    pub ngroups: u32,
    pub nentries: u32,
    pub contents_hash: [u8; 32],
    pub transform_seed: [u8; 32],
    pub transform_rounds: u32,
}

impl Header {
    /// Parse the 124-byte fixed header from the front of a `.kdb` file.
    pub fn parse(data: &[u8]) -> Result<Header, DatabaseIntegrityError> {
        if data.len() < HEADER_SIZE {
            return Err(DatabaseIntegrityError::InvalidFixedHeader { size: data.len() });
        }

        let signature1 = LittleEndian::read_u32(&data[0..4]);
        let signature2 = LittleEndian::read_u32(&data[4..8]);
        if signature1 != SIGNATURE1 || signature2 != SIGNATURE2 {
            return Err(DatabaseIntegrityError::BadSignature {
                expected: SIGNATURE2,
                found: signature2,
            });
        }

        let flags = LittleEndian::read_u32(&data[8..12]);
        let version = LittleEndian::read_u32(&data[12..16]);
        if version & 0xFFFF_FF00 != 0x0003_0000 {
            return Err(DatabaseIntegrityError::UnsupportedVersion { version });
        }

        let mut master_seed = [0u8; 16];
        master_seed.copy_from_slice(&data[16..32]);

        let mut encryption_iv = [0u8; 16];
        encryption_iv.copy_from_slice(&data[32..48]);

        let ngroups = LittleEndian::read_u32(&data[48..52]);
        let nentries = LittleEndian::read_u32(&data[52..56]);

        let mut contents_hash = [0u8; 32];
        contents_hash.copy_from_slice(&data[56..88]);

        let mut transform_seed = [0u8; 32];
        transform_seed.copy_from_slice(&data[88..120]);

        let transform_rounds = LittleEndian::read_u32(&data[120..124]);

        let header = Header {
            flags,
            version,
            master_seed,
            encryption_iv,
            ngroups,
            nentries,
            contents_hash,
            transform_seed,
            transform_rounds,
        };

        // Validate the cipher is one we implement before returning: there is
        // no point decrypting with a cipher we can't use later.
        header.encryption_type()?;

        Ok(header)
    }

    /// Encode the header back to its 124-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut out[0..4], SIGNATURE1);
        LittleEndian::write_u32(&mut out[4..8], SIGNATURE2);
        LittleEndian::write_u32(&mut out[8..12], self.flags);
        LittleEndian::write_u32(&mut out[12..16], self.version);
        out[16..32].copy_from_slice(&self.master_seed);
        out[32..48].copy_from_slice(&self.encryption_iv);
        LittleEndian::write_u32(&mut out[48..52], self.ngroups);
        LittleEndian::write_u32(&mut out[52..56], self.nentries);
        out[56..88].copy_from_slice(&self.contents_hash);
        out[88..120].copy_from_slice(&self.transform_seed);
        LittleEndian::write_u32(&mut out[120..124], self.transform_rounds);
        out
    }

    /// The cipher selected by the Rijndael bit in `flags`. Any other
    /// combination (ArcFour, Twofish, or no recognized bit set) is rejected
    /// on both load and save.
    pub fn encryption_type(&self) -> Result<EncryptionType, DatabaseIntegrityError> {
        if self.flags & FLAG_RIJNDAEL != 0 {
            Ok(EncryptionType::Rijndael)
        } else {
            Err(DatabaseIntegrityError::UnsupportedCipher { flags: self.flags })
        }
    }

    /// Build a fresh header for an in-memory database: random seeds and IV,
    /// the Rijndael flag set, and a default transform round count.
    pub(crate) fn generate(transform_rounds: u32) -> Result<Header, getrandom::Error> {
        let mut master_seed = [0u8; 16];
        getrandom::fill(&mut master_seed)?;

        let mut encryption_iv = [0u8; 16];
        getrandom::fill(&mut encryption_iv)?;

        let mut transform_seed = [0u8; 32];
        getrandom::fill(&mut transform_seed)?;

        Ok(Header {
            flags: FLAG_RIJNDAEL | FLAG_SHA2,
            version: 0x0003_0002,
            master_seed,
            encryption_iv,
            ngroups: 0,
            nentries: 0,
            contents_hash: [0u8; 32],
            transform_seed,
            transform_rounds,
        })
    }
}

// Keep the unused-bit constants referenced so the documented flag layout
// doesn't trip dead-code lints if a future cipher is never added.
#[allow(dead_code)]
const _UNUSED_FLAGS: [u32; 2] = [FLAG_ARCFOUR, FLAG_TWOFISH];

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header {
            flags: FLAG_RIJNDAEL,
            version: 0x0003_0002,
            master_seed: [0x11; 16],
            encryption_iv: [0x22; 16],
            ngroups: 3,
            nentries: 5,
            contents_hash: [0x33; 32],
            transform_seed: [0x44; 32],
            transform_rounds: 6000,
        }
    }

    #[test]
    fn round_trips_through_encode_parse() {
        let header = sample_header();
        let bytes = header.encode();
        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = sample_header().encode();
        bytes[0] = 0;
        assert!(matches!(
            Header::parse(&bytes).unwrap_err(),
            DatabaseIntegrityError::BadSignature { .. }
        ));
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            Header::parse(&[0; 10]).unwrap_err(),
            DatabaseIntegrityError::InvalidFixedHeader { size: 10 }
        ));
    }

    #[test]
    fn rejects_non_rijndael_cipher() {
        let mut header = sample_header();
        header.flags = FLAG_ARCFOUR;
        let bytes = header.encode();
        assert!(matches!(
            Header::parse(&bytes).unwrap_err(),
            DatabaseIntegrityError::UnsupportedCipher { .. }
        ));
    }
}
