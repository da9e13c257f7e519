//! Decrypting and parsing a `.kdb` file into its group/entry streams, and
//! the inverse: encoding and encrypting a stream back to file bytes.

use sha2::{Digest, Sha256};

use crate::crypt::ciphers::Aes256CbcCipher;
use crate::crypt::kdf::transform_composite_key;
use crate::db::entry::Entry;
use crate::db::group::Group;
use crate::error::{
    DatabaseIntegrityError, DatabaseKeyError, DatabaseOpenError, DatabaseSaveError,
};
use crate::header::Header;
use crate::key::Credentials;

/// Beyond this, a declared payload size could not possibly round-trip
/// through the padding scheme (2^31 - 201, matching the upstream sanity
/// cap); above it the buffer is rejected before any further parsing.
const MAX_PLAUSIBLE_PAYLOAD: usize = (i32::MAX as usize) - 201;

pub(crate) fn parse_kdb(
    bytes: &[u8],
    credentials: &Credentials,
) -> Result<(Header, Vec<Group>, Vec<Entry>), DatabaseOpenError> {
    let header = Header::parse(bytes)?;
    let ciphertext = &bytes[crate::header::HEADER_SIZE..];

    let mut final_key = derive_final_key(credentials, &header)?;
    let cipher = Aes256CbcCipher::new(&final_key, &header.encryption_iv);
    zeroize::Zeroize::zeroize(&mut final_key);
    let plaintext = cipher
        .decrypt(ciphertext)
        .map_err(|_| DatabaseOpenError::Key(DatabaseKeyError::IncorrectKey))?;

    if plaintext.len() > MAX_PLAUSIBLE_PAYLOAD || (plaintext.is_empty() && header.ngroups > 0) {
        return Err(DatabaseIntegrityError::ImplausiblePayload { size: plaintext.len() }.into());
    }

    let mut digest = Sha256::new();
    digest.update(&plaintext);
    if digest.finalize().as_slice() != header.contents_hash {
        return Err(DatabaseOpenError::Key(DatabaseKeyError::IncorrectKey));
    }

    // `ngroups`/`nentries` sit outside the content hash's coverage, so a
    // tampered header could claim counts far beyond what `plaintext` could
    // ever hold; grow these by push rather than trusting the counts as an
    // upfront allocation size.
    let mut cursor: &[u8] = &plaintext;
    let mut groups = Vec::new();
    for _ in 0..header.ngroups {
        groups.push(Group::decode(&mut cursor)?);
    }

    let mut entries = Vec::new();
    for _ in 0..header.nentries {
        entries.push(Entry::decode(&mut cursor)?);
    }

    if !cursor.is_empty() {
        return Err(DatabaseIntegrityError::TrailingGarbage(cursor.len()).into());
    }

    Ok((header, groups, entries))
}

pub(crate) fn dump_kdb(
    header: &mut Header,
    groups: &[Group],
    entries: &[Entry],
    credentials: &Credentials,
) -> Result<Vec<u8>, DatabaseSaveError> {
    let mut plaintext = Vec::new();
    for group in groups {
        plaintext.extend_from_slice(&group.encode());
    }
    for entry in entries {
        plaintext.extend_from_slice(&entry.encode());
    }

    header.ngroups = groups.len() as u32;
    header.nentries = entries.len() as u32;

    let mut digest = Sha256::new();
    digest.update(&plaintext);
    header.contents_hash.copy_from_slice(digest.finalize().as_slice());

    let mut final_key = derive_final_key(credentials, header)
        .map_err(|_| DatabaseSaveError::Key(DatabaseKeyError::MissingCredentials))?;
    let cipher = Aes256CbcCipher::new(&final_key, &header.encryption_iv);
    zeroize::Zeroize::zeroize(&mut final_key);
    let ciphertext = cipher
        .encrypt(&plaintext)
        .map_err(DatabaseSaveError::Cryptography)?;

    let mut out = Vec::with_capacity(crate::header::HEADER_SIZE + ciphertext.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn derive_final_key(
    credentials: &Credentials,
    header: &Header,
) -> Result<[u8; 32], DatabaseKeyError> {
    use zeroize::Zeroize;

    let mut composite_key = credentials.composite_key()?;
    let mut transformed = transform_composite_key(
        &composite_key,
        &header.transform_seed,
        header.transform_rounds as u64,
    );
    composite_key.as_mut_slice().zeroize();

    let mut digest = Sha256::new();
    digest.update(header.master_seed);
    digest.update(&transformed);
    transformed.as_mut_slice().zeroize();

    let mut final_key = [0u8; 32];
    final_key.copy_from_slice(digest.finalize().as_slice());
    Ok(final_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_with(credentials: Credentials, groups: Vec<Group>, entries: Vec<Entry>) {
        let mut header = Header::generate(6).unwrap();
        let bytes = dump_kdb(&mut header, &groups, &entries, &credentials).unwrap();
        let (parsed_header, parsed_groups, parsed_entries) =
            parse_kdb(&bytes, &credentials).unwrap();

        assert_eq!(parsed_header.ngroups, groups.len() as u32);
        assert_eq!(parsed_header.nentries, entries.len() as u32);
        assert_eq!(parsed_groups, groups);
        assert_eq!(parsed_entries, entries);
    }

    #[test]
    fn round_trips_an_empty_database() {
        roundtrip_with(Credentials::new().with_password("hunter2"), vec![], vec![]);
    }

    #[test]
    fn round_trips_groups_and_entries() {
        let group = Group {
            groupid: 1,
            name: "Internet".into(),
            ..Group::default()
        };
        let mut entry = Entry::default();
        entry.group_id = 1;
        entry.title = "Example".into();
        entry.set_password("s3cr3t");
        roundtrip_with(
            Credentials::new().with_password("hunter2"),
            vec![group],
            vec![entry],
        );
    }

    #[test]
    fn rejects_wrong_password_as_incorrect_key() {
        let mut header = Header::generate(6).unwrap();
        let bytes = dump_kdb(
            &mut header,
            &[],
            &[],
            &Credentials::new().with_password("right"),
        )
        .unwrap();

        let err = parse_kdb(&bytes, &Credentials::new().with_password("wrong")).unwrap_err();
        assert!(matches!(
            err,
            DatabaseOpenError::Key(DatabaseKeyError::IncorrectKey)
        ));
    }

    #[test]
    fn rejects_truncated_file() {
        let err = parse_kdb(&[0u8; 10], &Credentials::new().with_password("x")).unwrap_err();
        assert!(matches!(
            err,
            DatabaseOpenError::DatabaseIntegrity(DatabaseIntegrityError::InvalidFixedHeader {
                ..
            })
        ));
    }
}
