//! Framing for the `(type: u16, size: u32, data: [u8; size])` records that
//! make up the group and entry streams.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DatabaseIntegrityError;

/// Fields larger than this are rejected before any allocation of their size,
/// per the sanity cap on individual fields.
pub(crate) const MAX_FIELD_SIZE: u32 = 200_000;

/// Field type code marking the end of a group or entry record.
pub(crate) const TERMINATOR: u16 = 0xFFFF;

/// A single decoded `(type, size, data)` triple.
pub(crate) struct Field<'a> {
    pub field_type: u16,
    pub data: &'a [u8],
}

/// Read one field off the front of `data`, advancing `data` past it.
///
/// Returns `Truncated` if the header or declared payload runs past the end
/// of the buffer, and `FieldTooLarge` if the declared size exceeds
/// [`MAX_FIELD_SIZE`] -- checked before the payload slice is even taken.
pub(crate) fn read_field<'a>(data: &mut &'a [u8]) -> Result<Field<'a>, DatabaseIntegrityError> {
    if data.len() < 6 {
        return Err(DatabaseIntegrityError::Truncated);
    }

    let field_type = LittleEndian::read_u16(&data[0..2]);
    let field_size = LittleEndian::read_u32(&data[2..6]);

    if field_size > MAX_FIELD_SIZE {
        return Err(DatabaseIntegrityError::FieldTooLarge {
            field_type,
            size: field_size,
            limit: MAX_FIELD_SIZE,
        });
    }

    let field_size = field_size as usize;
    if data.len() < 6 + field_size {
        return Err(DatabaseIntegrityError::Truncated);
    }

    let field_data = &data[6..6 + field_size];
    *data = &data[6 + field_size..];

    Ok(Field {
        field_type,
        data: field_data,
    })
}

/// Append a field to `out` in wire form.
pub(crate) fn write_field(out: &mut Vec<u8>, field_type: u16, data: &[u8]) {
    let mut head = [0u8; 6];
    LittleEndian::write_u16(&mut head[0..2], field_type);
    LittleEndian::write_u32(&mut head[2..6], data.len() as u32);
    out.extend_from_slice(&head);
    out.extend_from_slice(data);
}

/// Append the `0xFFFF, 0` record terminator.
pub(crate) fn write_terminator(out: &mut Vec<u8>) {
    write_field(out, TERMINATOR, &[]);
}

/// A field whose type code this crate does not interpret, kept verbatim so
/// that decoding and re-encoding a record is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnknownField {
    pub field_type: u16,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_field_and_advances() {
        let mut data: &[u8] = &[0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0xAA, 0xBB, 0xFF, 0xFF];
        let field = read_field(&mut data).unwrap();
        assert_eq!(field.field_type, 1);
        assert_eq!(field.data, &[0xAA, 0xBB]);
        assert_eq!(data, &[0xFF, 0xFF]);
    }

    #[test]
    fn rejects_oversized_field_before_reading_payload() {
        let mut head = vec![0x01, 0x00];
        head.extend_from_slice(&(MAX_FIELD_SIZE + 1).to_le_bytes());
        let mut data: &[u8] = &head;
        let err = read_field(&mut data).unwrap_err();
        assert!(matches!(err, DatabaseIntegrityError::FieldTooLarge { .. }));
    }

    #[test]
    fn rejects_truncated_header() {
        let mut data: &[u8] = &[0x01, 0x00, 0x02];
        assert!(matches!(
            read_field(&mut data).unwrap_err(),
            DatabaseIntegrityError::Truncated
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut data: &[u8] = &[0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0xAA];
        assert!(matches!(
            read_field(&mut data).unwrap_err(),
            DatabaseIntegrityError::Truncated
        ));
    }

    #[test]
    fn write_field_round_trips_through_read_field() {
        let mut out = Vec::new();
        write_field(&mut out, 0x0002, b"hi\0");
        write_terminator(&mut out);

        let mut cursor: &[u8] = &out;
        let field = read_field(&mut cursor).unwrap();
        assert_eq!(field.field_type, 0x0002);
        assert_eq!(field.data, b"hi\0");

        let term = read_field(&mut cursor).unwrap();
        assert_eq!(term.field_type, TERMINATOR);
        assert_eq!(term.data.len(), 0);
    }
}
