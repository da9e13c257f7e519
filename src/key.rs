//! Composite key assembly from the credentials supplied by the caller.

use cipher::generic_array::{typenum::U32, GenericArray};
use secrecy::{ExposeSecret, SecretBox};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypt::calculate_sha256;
use crate::error::DatabaseKeyError;

/// The credentials used to derive a database's encryption key: a password,
/// a 32-byte file key, or both. Key-file path discovery and hex decoding are
/// the caller's job; this type only ever holds the already-decoded 32 raw
/// bytes.
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[zeroize(skip)]
    password: Option<SecretBox<String>>,
    file_key: Option<[u8; 32]>,
}

impl Credentials {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(SecretBox::new(Box::new(password.to_string())));
        self
    }

    pub fn with_file_key(mut self, file_key: [u8; 32]) -> Self {
        self.file_key = Some(file_key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.file_key.is_none()
    }

    /// Assemble the 32-byte composite key per spec.md 4.4:
    /// password-only -> SHA256(password); file-key-only -> the file key
    /// itself; both -> SHA256(SHA256(password) || file_key); neither ->
    /// `MissingCredentials`.
    pub(crate) fn composite_key(&self) -> Result<GenericArray<u8, U32>, DatabaseKeyError> {
        match (&self.password, &self.file_key) {
            (None, None) => Err(DatabaseKeyError::MissingCredentials),
            (Some(password), None) => {
                Ok(calculate_sha256(&[password.expose_secret().as_bytes()]))
            }
            (None, Some(file_key)) => Ok(GenericArray::clone_from_slice(file_key)),
            (Some(password), Some(file_key)) => {
                let password_hash = calculate_sha256(&[password.expose_secret().as_bytes()]);
                Ok(calculate_sha256(&[&password_hash, file_key]))
            }
        }
    }
}
