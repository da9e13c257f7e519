//! The `GroupInfo` TLV record.

use chrono::NaiveDateTime;

use crate::codec;
use crate::error::DatabaseIntegrityError;
use crate::tlv::{self, UnknownField};

/// A group's id may be any 32-bit value except 0 and `0xFFFFFFFF`.
pub const RESERVED_GROUP_IDS: [u32; 2] = [0, 0xFFFF_FFFF];

/// One group record: a node in the implicit hierarchy described by `level`.
///
/// Groups are kept as a flat, ordered list on [`crate::Database`] -- see
/// [`crate::db::hierarchy`] for how the tree is rebuilt from `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub groupid: u32,
    pub name: String,
    pub creation_time: NaiveDateTime,
    pub last_mod_time: NaiveDateTime,
    pub last_access_time: NaiveDateTime,
    pub expire_time: NaiveDateTime,
    pub image_id: u32,
    pub level: u16,
    pub flags: u32,
    /// Fields whose type code this crate does not interpret, preserved
    /// verbatim for a lossless round-trip.
    pub unknown_fields: Vec<UnknownField>,
}

impl Default for Group {
    fn default() -> Self {
        let now = default_timestamp();
        Group {
            groupid: 0,
            name: String::new(),
            creation_time: now,
            last_mod_time: now,
            last_access_time: now,
            expire_time: never_expires(),
            image_id: 0,
            level: 0,
            flags: 0,
            unknown_fields: Vec::new(),
        }
    }
}

pub(crate) fn default_timestamp() -> NaiveDateTime {
    // KeePass1 has no notion of "unset"; field defaults use a fixed epoch
    // rather than wall-clock time so encode/decode stays deterministic.
    chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub(crate) fn never_expires() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2999, 12, 28)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or_default()
}

impl Group {
    /// Decode one group record from the front of `data`, consuming up to and
    /// including its `0xFFFF` terminator.
    pub(crate) fn decode(data: &mut &[u8]) -> Result<Group, DatabaseIntegrityError> {
        let mut group = Group {
            // decode() always fills in every known field from the wire, so
            // these defaults are only ever observed if a well-formed record
            // omits a field, which encode() never produces but the format
            // technically allows.
            ..Group::default()
        };

        loop {
            let field = tlv::read_field(data)?;
            match field.field_type {
                0x0000 => {} // ignored
                0x0001 => group.groupid = codec::decode_u32(field.field_type, field.data)?,
                0x0002 => group.name = codec::decode_string(field.data),
                0x0003 => group.creation_time = codec::decode_datetime(field.field_type, field.data)?,
                0x0004 => group.last_mod_time = codec::decode_datetime(field.field_type, field.data)?,
                0x0005 => group.last_access_time = codec::decode_datetime(field.field_type, field.data)?,
                0x0006 => group.expire_time = codec::decode_datetime(field.field_type, field.data)?,
                0x0007 => group.image_id = codec::decode_u32(field.field_type, field.data)?,
                0x0008 => group.level = codec::decode_u16(field.field_type, field.data)?,
                0x0009 => group.flags = codec::decode_u32(field.field_type, field.data)?,
                tlv::TERMINATOR => break,
                other => group.unknown_fields.push(UnknownField {
                    field_type: other,
                    data: field.data.to_vec(),
                }),
            }
        }

        Ok(group)
    }

    /// Encode this group back to its TLV wire form, terminated by `0xFFFF`.
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        tlv::write_field(&mut out, 0x0001, &codec::encode_u32(self.groupid));
        tlv::write_field(&mut out, 0x0002, &codec::encode_string(&self.name));
        tlv::write_field(&mut out, 0x0003, &codec::encode_datetime(&self.creation_time));
        tlv::write_field(&mut out, 0x0004, &codec::encode_datetime(&self.last_mod_time));
        tlv::write_field(&mut out, 0x0005, &codec::encode_datetime(&self.last_access_time));
        tlv::write_field(&mut out, 0x0006, &codec::encode_datetime(&self.expire_time));
        tlv::write_field(&mut out, 0x0007, &codec::encode_u32(self.image_id));
        tlv::write_field(&mut out, 0x0008, &codec::encode_u16(self.level));
        tlv::write_field(&mut out, 0x0009, &codec::encode_u32(self.flags));
        for field in &self.unknown_fields {
            tlv::write_field(&mut out, field.field_type, &field.data);
        }
        tlv::write_terminator(&mut out);
        out
    }

    pub fn is_reserved_id(groupid: u32) -> bool {
        RESERVED_GROUP_IDS.contains(&groupid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Group {
        Group {
            groupid: 7,
            name: "Internet".into(),
            level: 0,
            ..Group::default()
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let group = sample();
        let encoded = group.encode();
        let mut cursor: &[u8] = &encoded;
        let decoded = Group::decode(&mut cursor).unwrap();
        assert_eq!(decoded, group);
        assert!(cursor.is_empty());
    }

    #[test]
    fn preserves_unknown_fields() {
        let mut encoded = Vec::new();
        crate::tlv::write_field(&mut encoded, 0x0001, &codec::encode_u32(3));
        crate::tlv::write_field(&mut encoded, 0x0002, &codec::encode_string("G"));
        crate::tlv::write_field(&mut encoded, 0x0042, b"mystery");
        crate::tlv::write_terminator(&mut encoded);

        let mut cursor: &[u8] = &encoded;
        let group = Group::decode(&mut cursor).unwrap();
        assert_eq!(
            group.unknown_fields,
            vec![UnknownField {
                field_type: 0x0042,
                data: b"mystery".to_vec(),
            }]
        );

        let re_encoded = group.encode();
        let mut cursor: &[u8] = &re_encoded;
        let round_tripped = Group::decode(&mut cursor).unwrap();
        assert_eq!(round_tripped, group);
    }

    #[test]
    fn empty_name_round_trips() {
        let mut group = sample();
        group.name = String::new();
        let encoded = group.encode();
        let mut cursor: &[u8] = &encoded;
        assert_eq!(Group::decode(&mut cursor).unwrap().name, "");
    }
}
