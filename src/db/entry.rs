//! The `EntryInfo` TLV record.

use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, SecretBox};
use uuid::Uuid;

use crate::codec;
use crate::error::DatabaseIntegrityError;
use crate::tlv::{self, UnknownField};

/// The group id reserved for the implicit "Meta-Info" bookkeeping entries
/// that KeePass1 stores alongside real entries (custom icons, search
/// history, ...). Callers that iterate user-visible entries should filter
/// these out; this crate never hides them on its own.
pub const METAINFO_GROUP_ID: u32 = 0;
pub const METAINFO_TITLE: &str = "Meta-Info";

/// A binary attachment: a name plus raw bytes, carried as two sibling TLV
/// fields (0x000D, 0x000E) rather than one compound record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Binary {
    pub name: String,
    pub data: Vec<u8>,
}

/// One entry record. Entries belong to a group purely by `group_id`; unlike
/// [`crate::db::group::Group`] they carry no notion of their own position in
/// the hierarchy.
#[derive(Debug, Clone)]
pub struct Entry {
    pub uuid: Uuid,
    pub group_id: u32,
    pub image_id: u32,
    pub title: String,
    pub url: String,
    pub username: String,
    password: Option<SecretBox<String>>,
    pub notes: String,
    pub creation_time: NaiveDateTime,
    pub last_mod_time: NaiveDateTime,
    pub last_access_time: NaiveDateTime,
    pub expire_time: NaiveDateTime,
    pub binary: Option<Binary>,
    pub unknown_fields: Vec<UnknownField>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
            && self.group_id == other.group_id
            && self.image_id == other.image_id
            && self.title == other.title
            && self.url == other.url
            && self.username == other.username
            && self.password() == other.password()
            && self.notes == other.notes
            && self.creation_time == other.creation_time
            && self.last_mod_time == other.last_mod_time
            && self.last_access_time == other.last_access_time
            && self.expire_time == other.expire_time
            && self.binary == other.binary
            && self.unknown_fields == other.unknown_fields
    }
}

impl Eq for Entry {}

impl Default for Entry {
    fn default() -> Self {
        let now = crate::db::group::default_timestamp();
        Entry {
            uuid: Uuid::nil(),
            group_id: 0,
            image_id: 0,
            title: String::new(),
            url: String::new(),
            username: String::new(),
            password: None,
            notes: String::new(),
            creation_time: now,
            last_mod_time: now,
            last_access_time: now,
            expire_time: crate::db::group::never_expires(),
            binary: None,
            unknown_fields: Vec::new(),
        }
    }
}

impl Entry {
    pub fn password(&self) -> &str {
        self.password
            .as_ref()
            .map(|secret| secret.expose_secret().as_str())
            .unwrap_or("")
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(SecretBox::new(Box::new(password.into())));
    }

    /// Whether this is one of the synthetic `Meta-Info` bookkeeping entries
    /// rather than a user-created one.
    pub fn is_metainfo(&self) -> bool {
        self.group_id == METAINFO_GROUP_ID && self.title == METAINFO_TITLE
    }

    /// This entry's UUID as lowercase hex, the form spec.md 6.1 calls out as
    /// "hex-exposed" rather than the raw 16 bytes carried on the wire.
    pub fn uuid_hex(&self) -> String {
        codec::decode_ascii_hex(self.uuid.as_bytes())
    }

    /// Set this entry's UUID from a 32-character hex string, the inverse of
    /// [`Entry::uuid_hex`].
    pub fn set_uuid_hex(&mut self, hex: &str) -> Result<(), DatabaseIntegrityError> {
        let malformed = || DatabaseIntegrityError::MalformedField {
            field_type: 0x0001,
            size: hex.len() as u32,
        };
        let bytes = codec::encode_ascii_hex(hex).map_err(|_| malformed())?;
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| malformed())?;
        self.uuid = Uuid::from_bytes(bytes);
        Ok(())
    }

    pub(crate) fn decode(data: &mut &[u8]) -> Result<Entry, DatabaseIntegrityError> {
        let mut entry = Entry::default();
        let mut binary_name: Option<String> = None;
        let mut binary_data: Option<Vec<u8>> = None;

        loop {
            let field = tlv::read_field(data)?;
            match field.field_type {
                0x0000 => {}
                0x0001 => entry.uuid = decode_uuid(field.field_type, field.data)?,
                0x0002 => entry.group_id = codec::decode_u32(field.field_type, field.data)?,
                0x0003 => entry.image_id = codec::decode_u32(field.field_type, field.data)?,
                0x0004 => entry.title = codec::decode_string(field.data),
                0x0005 => entry.url = codec::decode_string(field.data),
                0x0006 => entry.username = codec::decode_string(field.data),
                0x0007 => entry.set_password(codec::decode_string(field.data)),
                0x0008 => entry.notes = codec::decode_string(field.data),
                0x0009 => entry.creation_time = codec::decode_datetime(field.field_type, field.data)?,
                0x000A => entry.last_mod_time = codec::decode_datetime(field.field_type, field.data)?,
                0x000B => entry.last_access_time = codec::decode_datetime(field.field_type, field.data)?,
                0x000C => entry.expire_time = codec::decode_datetime(field.field_type, field.data)?,
                0x000D => binary_name = Some(codec::decode_string(field.data)),
                0x000E => binary_data = Some(field.data.to_vec()),
                tlv::TERMINATOR => break,
                other => entry.unknown_fields.push(UnknownField {
                    field_type: other,
                    data: field.data.to_vec(),
                }),
            }
        }

        entry.binary = match (binary_name, binary_data) {
            (None, None) => None,
            (name, data) => Some(Binary {
                name: name.unwrap_or_default(),
                data: data.unwrap_or_default(),
            }),
        };

        Ok(entry)
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        tlv::write_field(&mut out, 0x0001, self.uuid.as_bytes());
        tlv::write_field(&mut out, 0x0002, &codec::encode_u32(self.group_id));
        tlv::write_field(&mut out, 0x0003, &codec::encode_u32(self.image_id));
        tlv::write_field(&mut out, 0x0004, &codec::encode_string(&self.title));
        tlv::write_field(&mut out, 0x0005, &codec::encode_string(&self.url));
        tlv::write_field(&mut out, 0x0006, &codec::encode_string(&self.username));
        tlv::write_field(&mut out, 0x0007, &codec::encode_string(self.password()));
        tlv::write_field(&mut out, 0x0008, &codec::encode_string(&self.notes));
        tlv::write_field(&mut out, 0x0009, &codec::encode_datetime(&self.creation_time));
        tlv::write_field(&mut out, 0x000A, &codec::encode_datetime(&self.last_mod_time));
        tlv::write_field(&mut out, 0x000B, &codec::encode_datetime(&self.last_access_time));
        tlv::write_field(&mut out, 0x000C, &codec::encode_datetime(&self.expire_time));
        if let Some(binary) = &self.binary {
            tlv::write_field(&mut out, 0x000D, &codec::encode_string(&binary.name));
            tlv::write_field(&mut out, 0x000E, &binary.data);
        }
        for field in &self.unknown_fields {
            tlv::write_field(&mut out, field.field_type, &field.data);
        }
        tlv::write_terminator(&mut out);
        out
    }
}

fn decode_uuid(field_type: u16, data: &[u8]) -> Result<Uuid, DatabaseIntegrityError> {
    let bytes: [u8; 16] = data.try_into().map_err(|_| DatabaseIntegrityError::MalformedField {
        field_type,
        size: data.len() as u32,
    })?;
    Ok(Uuid::from_bytes(bytes))
}
