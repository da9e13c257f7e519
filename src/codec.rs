//! Wire-format codecs for the scalar value types carried by TLV fields.
//!
//! Each codec is a free `decode`/`encode` pair rather than a trait object: the
//! set of wire shapes is fixed and small, and a plain function keeps the call
//! sites (see [`crate::db::group`] and [`crate::db::entry`]) a direct match on
//! the field's type code.

use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDateTime;

use crate::error::DatabaseIntegrityError;

/// Decode a NUL-padded UTF-8 string field, stripping all embedded NUL bytes.
pub(crate) fn decode_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .chars()
        .filter(|&c| c != '\0')
        .collect()
}

/// Encode a string field, appending the single trailing NUL terminator.
pub(crate) fn encode_string(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 1);
    out.extend_from_slice(value.as_bytes());
    out.push(0);
    out
}

/// Decode a field as lowercase hex ASCII of its raw bytes.
pub(crate) fn decode_ascii_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode a lowercase-hex string back to raw bytes.
pub(crate) fn encode_ascii_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value)
}

pub(crate) fn decode_u16(field_type: u16, data: &[u8]) -> Result<u16, DatabaseIntegrityError> {
    if data.len() != 2 {
        return Err(DatabaseIntegrityError::MalformedField {
            field_type,
            size: data.len() as u32,
        });
    }
    Ok(LittleEndian::read_u16(data))
}

pub(crate) fn encode_u16(value: u16) -> [u8; 2] {
    let mut out = [0u8; 2];
    LittleEndian::write_u16(&mut out, value);
    out
}

pub(crate) fn decode_u32(field_type: u16, data: &[u8]) -> Result<u32, DatabaseIntegrityError> {
    if data.len() != 4 {
        return Err(DatabaseIntegrityError::MalformedField {
            field_type,
            size: data.len() as u32,
        });
    }
    Ok(LittleEndian::read_u32(data))
}

pub(crate) fn encode_u32(value: u32) -> [u8; 4] {
    let mut out = [0u8; 4];
    LittleEndian::write_u32(&mut out, value);
    out
}

/// Decode the 5-byte bit-packed KeePass v1 datetime.
///
/// Bit layout (MSB-first across the 40-bit word b0..b4):
/// year(14) month(4) day(5) hour(5) minute(6) second(6).
pub(crate) fn decode_datetime(
    field_type: u16,
    data: &[u8],
) -> Result<NaiveDateTime, DatabaseIntegrityError> {
    if data.len() != 5 {
        return Err(DatabaseIntegrityError::MalformedField {
            field_type,
            size: data.len() as u32,
        });
    }
    let b = data;
    let year = ((b[0] as u32) << 6) | (b[1] as u32 >> 2);
    let month = ((b[1] as u32 & 0b11) << 2) | (b[2] as u32 >> 6);
    let day = (b[2] as u32 & 0b0011_1111) >> 1;
    let hour = ((b[2] as u32 & 0b1) << 4) | (b[3] as u32 >> 4);
    let minute = ((b[3] as u32 & 0b1111) << 2) | (b[4] as u32 >> 6);
    let second = b[4] as u32 & 0b0011_1111;

    let malformed = || DatabaseIntegrityError::MalformedField {
        field_type,
        size: 5,
    };

    let date =
        chrono::NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(malformed)?;
    let time = chrono::NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(malformed)?;
    Ok(NaiveDateTime::new(date, time))
}

/// Encode a [`NaiveDateTime`] back into the 5-byte packed form. The inverse of
/// [`decode_datetime`]; truncates to whole seconds.
pub(crate) fn encode_datetime(value: &NaiveDateTime) -> [u8; 5] {
    use chrono::{Datelike, Timelike};

    let year = value.year() as u32 & 0x3FFF;
    let month = value.month();
    let day = value.day();
    let hour = value.hour();
    let minute = value.minute();
    let second = value.second();

    let b0 = (year >> 6) as u8;
    let b1 = (((year & 0x3F) << 2) | (month >> 2)) as u8;
    let b2 = (((month & 0b11) << 6) | ((day & 0b1_1111) << 1) | (hour >> 4)) as u8;
    let b3 = (((hour & 0b1111) << 4) | (minute >> 2)) as u8;
    let b4 = (((minute & 0b11) << 6) | (second & 0b11_1111)) as u8;

    [b0, b1, b2, b3, b4]
}
