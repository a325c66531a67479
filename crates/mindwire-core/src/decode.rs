//! Payload decoding: data items, value types, code filtering
//!
//! A validated payload is a run of data items:
//!
//! ```text
//! PAYLOAD := (ESCAPE* CODE VALUE)*
//! ESCAPE  := 0x55
//! CODE < 0x80  → VALUE is 1 byte
//! CODE ≥ 0x80  → VALUE := [LENGTH:1][DATA: LENGTH bytes]
//! ```
//!
//! ESCAPE markers historically extend the code space. The level is counted
//! and carried on each [`DataItem`] but never selects an extended code
//! page here; for the codes this crate handles the level is informational
//! only, and decoding treats it as a passthrough.

use heapless::FnvIndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

// ============================================================================
// Data Codes
// ============================================================================

/// Data codes emitted by ThinkGear-style headsets.
pub mod codes {
    /// Signal contact noise, 0 (clean) to 200 (off-head)
    pub const POOR_SIGNAL: u8 = 0x02;
    /// eSense attention, 0-100
    pub const ATTENTION: u8 = 0x04;
    /// eSense meditation, 0-100
    pub const MEDITATION: u8 = 0x05;
    /// Blink strength
    pub const BLINK: u8 = 0x16;
    /// Escape marker extending the code space
    pub const EXCODE: u8 = 0x55;
    /// Raw wave sample, signed 16-bit
    pub const RAW_WAVE: u8 = 0x80;
    /// Eight 24-bit band power values
    pub const EEG_POWER: u8 = 0x83;
}

/// Whether a code carries a length-prefixed multi-byte value.
#[must_use]
pub const fn is_multi_byte(code: u8) -> bool {
    code >= 0x80
}

/// Number of value bytes in an EEG power item (8 bands × 3 bytes).
pub const BAND_POWER_LEN: usize = 24;

// ============================================================================
// Decoded Values
// ============================================================================

/// A decoded data item value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataValue {
    /// Raw value byte of a single-byte item
    Byte(u8),
    /// Signed 16-bit raw wave sample (code 0x80)
    RawWave(i16),
    /// Band powers in fixed order: Delta, Theta, Low-Alpha, High-Alpha,
    /// Low-Beta, High-Beta, Low-Gamma, Mid-Gamma (code 0x83)
    BandPower([u32; 8]),
    /// Generic big-endian unsigned value of any other multi-byte code
    Unsigned(u64),
}

/// Decode a data item's value bytes according to its code.
///
/// - `0x80`: exactly 2 bytes, signed big-endian. Any other length is
///   rejected rather than padded or truncated.
/// - `0x83`: exactly 24 bytes as 8 big-endian 24-bit band powers.
/// - other single-byte codes: exactly 1 raw byte.
/// - other multi-byte codes: a big-endian unsigned integer of the value's
///   length; zero bytes decode to 0, more than 8 bytes are rejected.
///
/// # Errors
///
/// Returns [`DecodeError`] when the value length does not fit the code.
pub fn decode_value(code: u8, raw: &[u8]) -> Result<DataValue, DecodeError> {
    match code {
        codes::RAW_WAVE => {
            if raw.len() != 2 {
                return Err(DecodeError::WrongLength { code, length: raw.len(), expected: 2 });
            }
            Ok(DataValue::RawWave(i16::from_be_bytes([raw[0], raw[1]])))
        }
        codes::EEG_POWER => {
            if raw.len() != BAND_POWER_LEN {
                return Err(DecodeError::WrongLength {
                    code,
                    length: raw.len(),
                    expected: BAND_POWER_LEN,
                });
            }
            let mut bands = [0u32; 8];
            for (band, chunk) in bands.iter_mut().zip(raw.chunks_exact(3)) {
                *band = u32::from(chunk[0]) << 16 | u32::from(chunk[1]) << 8 | u32::from(chunk[2]);
            }
            Ok(DataValue::BandPower(bands))
        }
        code if !is_multi_byte(code) => {
            if raw.len() != 1 {
                return Err(DecodeError::WrongLength { code, length: raw.len(), expected: 1 });
            }
            Ok(DataValue::Byte(raw[0]))
        }
        _ => {
            if raw.len() > 8 {
                return Err(DecodeError::ValueTooWide { code, length: raw.len() });
            }
            let value = raw.iter().fold(0u64, |acc, &b| acc << 8 | u64::from(b));
            Ok(DataValue::Unsigned(value))
        }
    }
}

// ============================================================================
// Payload Walking
// ============================================================================

/// One data item within a payload, value bytes still raw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DataItem<'a> {
    /// Count of consecutive 0x55 escape markers preceding the code.
    /// Carried as a passthrough; never alters decoding here.
    pub excode_level: u8,
    /// Data code
    pub code: u8,
    /// Raw value bytes (one byte for single-byte codes)
    pub raw: &'a [u8],
}

/// Iterator over the data items of one payload.
///
/// Stops when the payload is exhausted, when a code or length byte is
/// missing, or when a multi-byte item declares more bytes than remain.
/// Truncation is graceful: items yielded earlier stay valid, the
/// remainder of the payload is discarded.
pub struct DataItems<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for DataItems<'a> {
    type Item = DataItem<'a>;

    fn next(&mut self) -> Option<DataItem<'a>> {
        let mut excode_level = 0u8;
        while let [codes::EXCODE, rest @ ..] = self.rest {
            excode_level = excode_level.saturating_add(1);
            self.rest = rest;
        }

        let (&code, rest) = self.rest.split_first()?;
        self.rest = rest;

        let length = if is_multi_byte(code) {
            let (&length, rest) = self.rest.split_first()?;
            self.rest = rest;
            usize::from(length)
        } else {
            1
        };

        if self.rest.len() < length {
            self.rest = &[];
            return None;
        }
        let (raw, rest) = self.rest.split_at(length);
        self.rest = rest;

        Some(DataItem { excode_level, code, raw })
    }
}

/// Walk the data items of a payload.
#[must_use]
pub fn data_items(payload: &[u8]) -> DataItems<'_> {
    DataItems { rest: payload }
}

// ============================================================================
// Code Filtering
// ============================================================================

/// Maximum entries a code interest set may map.
pub const MAX_INTEREST: usize = 8;

/// Decoded values keyed by the interest set's output names.
pub type DecodedValues<'a> = FnvIndexMap<&'a str, DataValue, MAX_INTEREST>;

/// Decode a payload, keeping only the codes named by `interest`.
///
/// `interest` maps data codes to output names; codes are expected to be
/// unique within one set, and at most [`MAX_INTEREST`] entries are
/// supported. Items whose code is absent from the set are still parsed to
/// keep the stream position correct, then discarded. Items whose value
/// bytes fail [`decode_value`] are skipped without aborting the walk. If
/// a code repeats within one payload, the last occurrence wins.
///
/// Codes not present in the payload are simply absent from the result.
pub fn decode_payload<'a>(payload: &[u8], interest: &[(u8, &'a str)]) -> DecodedValues<'a> {
    let mut values = DecodedValues::new();

    for item in data_items(payload) {
        let Some((_, name)) = interest.iter().find(|(code, _)| *code == item.code) else {
            continue;
        };
        if let Ok(value) = decode_value(item.code, item.raw) {
            let _ = values.insert(name, value);
        }
    }

    values
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ESENSE: &[(u8, &str)] = &[
        (codes::ATTENTION, "attention"),
        (codes::MEDITATION, "meditation"),
    ];

    #[test]
    fn test_empty_payload() {
        let values = decode_payload(&[], ESENSE);
        assert!(values.is_empty());
    }

    #[test]
    fn test_single_byte_item() {
        let values = decode_payload(&[0x04, 13], &[(0x04, "attention")]);
        assert_eq!(values.get("attention"), Some(&DataValue::Byte(13)));
    }

    #[test]
    fn test_uninteresting_items_are_skipped_in_place() {
        // 0x02 and a multi-byte 0x90 item precede the attention item; both
        // must be consumed so 0x04 is found at the right offset.
        let payload = [0x02, 26, 0x90, 0x03, 1, 2, 3, 0x04, 77];
        let values = decode_payload(&payload, ESENSE);
        assert_eq!(values.get("attention"), Some(&DataValue::Byte(77)));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_raw_wave_signed() {
        let values = decode_payload(&[0x80, 0x02, 0xFF, 0x38], &[(0x80, "raw")]);
        assert_eq!(values.get("raw"), Some(&DataValue::RawWave(-200)));
    }

    #[test]
    fn test_raw_wave_wrong_length_rejected() {
        assert_eq!(
            decode_value(codes::RAW_WAVE, &[0xFF]),
            Err(DecodeError::WrongLength { code: 0x80, length: 1, expected: 2 })
        );
        assert_eq!(
            decode_value(codes::RAW_WAVE, &[0xFF, 0x38, 0x00]),
            Err(DecodeError::WrongLength { code: 0x80, length: 3, expected: 2 })
        );

        // Within a payload the malformed item is skipped, not fatal.
        let payload = [0x80, 0x01, 0xFF, 0x04, 50];
        let values = decode_payload(&payload, &[(0x80, "raw"), (0x04, "attention")]);
        assert_eq!(values.get("raw"), None);
        assert_eq!(values.get("attention"), Some(&DataValue::Byte(50)));
    }

    #[test]
    fn test_band_power_order() {
        let mut payload = [0u8; 26];
        payload[0] = codes::EEG_POWER;
        payload[1] = BAND_POWER_LEN as u8;
        let bands = [10u32, 20, 30, 40, 50, 60, 70, 80];
        for (i, band) in bands.iter().enumerate() {
            payload[2 + i * 3..2 + i * 3 + 3].copy_from_slice(&band.to_be_bytes()[1..]);
        }

        let values = decode_payload(&payload, &[(codes::EEG_POWER, "eeg_power")]);
        assert_eq!(values.get("eeg_power"), Some(&DataValue::BandPower(bands)));
    }

    #[test]
    fn test_band_power_24_bit_range() {
        let mut raw = [0u8; 24];
        raw[0] = 0xFF;
        raw[1] = 0xFF;
        raw[2] = 0xFF;
        let Ok(DataValue::BandPower(bands)) = decode_value(codes::EEG_POWER, &raw) else {
            panic!("band power decode failed");
        };
        assert_eq!(bands[0], 0x00FF_FFFF);
        assert_eq!(bands[1], 0);
    }

    #[test]
    fn test_generic_unsigned() {
        assert_eq!(decode_value(0x90, &[]), Ok(DataValue::Unsigned(0)));
        assert_eq!(decode_value(0x90, &[0x01, 0x00]), Ok(DataValue::Unsigned(256)));
        assert_eq!(
            decode_value(0x90, &[0xFF; 9]),
            Err(DecodeError::ValueTooWide { code: 0x90, length: 9 })
        );
    }

    #[test]
    fn test_truncated_multi_byte_item_discards_remainder() {
        // attention decodes, then a 0x83 item declares 24 bytes with only
        // 3 remaining: the walk stops there.
        let payload = [0x04, 42, 0x83, 24, 1, 2, 3];
        let values = decode_payload(
            &payload,
            &[(0x04, "attention"), (codes::EEG_POWER, "eeg_power")],
        );
        assert_eq!(values.get("attention"), Some(&DataValue::Byte(42)));
        assert_eq!(values.get("eeg_power"), None);
    }

    #[test]
    fn test_missing_length_byte_stops() {
        let values = decode_payload(&[0x04, 42, 0x83], ESENSE);
        assert_eq!(values.get("attention"), Some(&DataValue::Byte(42)));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_escape_markers_consumed() {
        for level in [1usize, 2, 7] {
            let mut payload = [0u8; 16];
            payload[..level].fill(codes::EXCODE);
            payload[level] = 0x04;
            payload[level + 1] = 13;
            let values = decode_payload(&payload[..level + 2], ESENSE);
            assert_eq!(values.get("attention"), Some(&DataValue::Byte(13)));
            assert_eq!(values.len(), 1);
        }
    }

    #[test]
    fn test_excode_level_counted() {
        let payload = [0x55, 0x55, 0x04, 13, 0x05, 60];
        let items: heapless::Vec<DataItem, 4> = data_items(&payload).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].excode_level, 2);
        assert_eq!(items[0].code, 0x04);
        assert_eq!(items[1].excode_level, 0);
        assert_eq!(items[1].code, 0x05);
    }

    #[test]
    fn test_trailing_escapes_produce_nothing() {
        let values = decode_payload(&[0x04, 13, 0x55, 0x55], ESENSE);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_repeated_code_last_wins() {
        let values = decode_payload(&[0x04, 10, 0x04, 90], ESENSE);
        assert_eq!(values.get("attention"), Some(&DataValue::Byte(90)));
    }
}
