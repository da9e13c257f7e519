//! Cryptographically secure randomness for UUIDs, group ids, and the
//! header's seeds/IV (the latter are generated directly in [`crate::header`]).
//!
//! The Python original's `gen_uuid` returns the literal integer `4` -- a
//! placeholder that was never wired up to real randomness. This module is
//! the fix: every value here comes from the OS CSPRNG via `getrandom`,
//! with failures propagated rather than panicked on, matching
//! [`crate::header::Header::generate`].

use byteorder::{ByteOrder, LittleEndian};

/// 16 cryptographically random bytes, suitable for an entry UUID.
pub(crate) fn gen_uuid_bytes() -> Result<[u8; 16], getrandom::Error> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes)?;
    Ok(bytes)
}

/// A uniformly distributed `u32` in `[low, high]` (inclusive on both ends),
/// drawn via rejection sampling to avoid modulo bias.
pub(crate) fn gen_range_u32_inclusive(low: u32, high: u32) -> Result<u32, getrandom::Error> {
    debug_assert!(low <= high);
    let span = high - low + 1;
    let limit = u32::MAX - (u32::MAX % span);

    loop {
        let mut bytes = [0u8; 4];
        getrandom::fill(&mut bytes)?;
        let candidate = LittleEndian::read_u32(&bytes);
        if candidate < limit {
            return Ok(low + (candidate % span));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_bytes_are_not_all_zero() {
        // Not a proof of randomness, just a smoke test that getrandom ran.
        assert_ne!(gen_uuid_bytes().unwrap(), [0u8; 16]);
    }

    #[test]
    fn range_stays_within_bounds() {
        for _ in 0..200 {
            let value = gen_range_u32_inclusive(1, 10).unwrap();
            assert!((1..=10).contains(&value));
        }
    }

    #[test]
    fn single_value_range_always_returns_that_value() {
        assert_eq!(gen_range_u32_inclusive(7, 7).unwrap(), 7);
    }
}
