//! A reader and writer for KeePass v1 (`.kdb`) password database files.
//!
//! ```no_run
//! use kdb1::{Credentials, Database};
//!
//! let credentials = Credentials::new().with_password("hunter2");
//! let db = Database::open("my.kdb", credentials)?;
//! if let Some(entry) = db.get("Email") {
//!     println!("{}", entry.username);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod codec;
pub(crate) mod crypt;
pub mod db;
pub mod error;
mod header;
mod key;
mod random;
mod tlv;

pub use crate::db::entry::{Binary, Entry};
pub use crate::db::group::Group;
pub use crate::db::hierarchy::{GroupNode, RootNode};
pub use crate::db::{AddMode, Database, GroupQuery};
pub use crate::header::{EncryptionType, Header};
pub use crate::key::Credentials;
