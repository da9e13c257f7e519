//! Error types returned by this crate

use thiserror::Error;

/// Errors constructing a cipher or MAC from key material of the wrong length
#[derive(Debug, Error)]
pub enum CryptographyError {
    #[error("Invalid key or IV length")]
    InvalidLength(#[from] cipher::InvalidLength),

    #[error("Payload is not padded correctly")]
    UnpadError(#[from] cipher::block_padding::UnpadError),
}

/// Errors stemming from a corrupted or malformed database
#[derive(Debug, Error)]
pub enum DatabaseIntegrityError {
    #[error("Invalid signature: expected {expected:#010x}, found {found:#010x}")]
    BadSignature { expected: u32, found: u32 },

    #[error("Unsupported database version {version:#010x}")]
    UnsupportedVersion { version: u32 },

    #[error("Unsupported cipher (header flags {flags:#010x})")]
    UnsupportedCipher { flags: u32 },

    #[error("Header is too short: got {size} bytes, need at least 124")]
    InvalidFixedHeader { size: usize },

    #[error("Decrypted payload is implausible (size {size})")]
    ImplausiblePayload { size: usize },

    #[error("{0} bytes of unparsed data follow the last entry record")]
    TrailingGarbage(usize),

    #[error("Field of type {field_type:#06x} has size {size}, exceeding the {limit} byte cap")]
    FieldTooLarge {
        field_type: u16,
        size: u32,
        limit: u32,
    },

    #[error("Buffer ended while reading a field")]
    Truncated,

    #[error("Field of type {field_type:#06x} has malformed data (size {size})")]
    MalformedField { field_type: u16, size: u32 },

    #[error("Group level jumped from {current_level} to {group_level} (only +1 allowed)")]
    InvalidGroupLevel { group_level: u16, current_level: i32 },

    #[error("Group id {0} is used by more than one group")]
    DuplicateGroupId(u32),

    #[error("system randomness source is unavailable: {0}")]
    RandomnessUnavailable(#[from] getrandom::Error),

    #[error("group path must contain at least one non-empty segment")]
    EmptyGroupPath,

    #[error(transparent)]
    Cryptography(#[from] CryptographyError),
}

/// A wrong key and a damaged file look the same from the outside; this keeps both
/// branches returning the same diagnostic so callers cannot distinguish them.
#[derive(Debug, Error)]
pub enum DatabaseKeyError {
    #[error("No password or key file was supplied")]
    MissingCredentials,

    #[error("Wrong key or damaged file")]
    IncorrectKey,
}

/// Errors that can occur while opening a database
#[derive(Debug, Error)]
pub enum DatabaseOpenError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Key(#[from] DatabaseKeyError),

    #[error(transparent)]
    DatabaseIntegrity(#[from] DatabaseIntegrityError),
}

/// Errors that can occur while saving a database
#[derive(Debug, Error)]
pub enum DatabaseSaveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Key(#[from] DatabaseKeyError),

    #[error(transparent)]
    Cryptography(#[from] CryptographyError),

    #[error("No destination path was given and this database was not opened from a file")]
    MissingPath,
}

/// Errors reconstructing or flattening the implicit group hierarchy
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error(transparent)]
    Malformed(#[from] DatabaseIntegrityError),
}
