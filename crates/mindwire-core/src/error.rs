//! Error types for frame reading and payload decoding
//!
//! All errors work in `no_std` environments and carry the context needed
//! for debugging without heap allocation. Frame-level failures are values,
//! not panics: everything except a broken byte source is recoverable by
//! simply reading the next frame.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::MAX_PAYLOAD_LEN;

// ============================================================================
// Frame Errors
// ============================================================================

/// Errors while reading one frame from a byte source.
///
/// Only [`FrameError::Source`] is fatal. Every other variant means the
/// current frame attempt is discarded; calling
/// [`read_frame`](crate::protocol::read_frame) again re-synchronizes from
/// the next bytes with no state carried across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError<E> {
    /// The underlying byte source failed (stream closed or broken)
    Source(E),
    /// Timed out while scanning for the 0xAA 0xAA sync marker
    SyncTimeout,
    /// Declared payload length exceeds the protocol maximum
    LengthOutOfRange {
        /// The length that was declared
        length: usize,
    },
    /// Fewer payload bytes arrived than the length byte declared
    ShortRead {
        /// Bytes received before the timeout
        received: usize,
        /// Bytes expected
        expected: usize,
    },
    /// The trailing checksum byte does not match the payload
    ChecksumMismatch {
        /// Checksum computed over the received payload
        expected: u8,
        /// Checksum byte received on the wire
        received: u8,
    },
}

impl<E> FrameError<E> {
    /// Whether this failure ends the session.
    ///
    /// Non-fatal failures are resolved by calling
    /// [`read_frame`](crate::protocol::read_frame) again.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

impl<E: fmt::Debug> fmt::Display for FrameError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "byte source failure: {e:?}"),
            Self::SyncTimeout => write!(f, "timed out scanning for sync marker"),
            Self::LengthOutOfRange { length } => {
                write!(f, "payload length {length} exceeds maximum {MAX_PAYLOAD_LEN}")
            }
            Self::ShortRead { received, expected } => {
                write!(f, "short read: got {received}/{expected} bytes")
            }
            Self::ChecksumMismatch { expected, received } => {
                write!(
                    f,
                    "checksum mismatch: computed 0x{expected:02X}, got 0x{received:02X}"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for FrameError<E> {}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for FrameError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Source(e) => defmt::write!(f, "source: {}", e),
            Self::SyncTimeout => defmt::write!(f, "sync timeout"),
            Self::LengthOutOfRange { length } => {
                defmt::write!(f, "length {} > {}", length, MAX_PAYLOAD_LEN);
            }
            Self::ShortRead { received, expected } => {
                defmt::write!(f, "short read: {}/{}", received, expected);
            }
            Self::ChecksumMismatch { expected, received } => {
                defmt::write!(f, "checksum: {:02X} != {:02X}", expected, received);
            }
        }
    }
}

// ============================================================================
// Value Decode Errors
// ============================================================================

/// Errors while decoding one data item's value bytes.
///
/// Decode errors never abort a payload walk: the offending item is skipped
/// and the stream position stays correct, because the item's length was
/// already consumed from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeError {
    /// Value byte run has the wrong length for its code
    WrongLength {
        /// Data code of the item
        code: u8,
        /// Length that arrived
        length: usize,
        /// Length the code requires
        expected: usize,
    },
    /// Generic unsigned value is wider than this crate represents
    ValueTooWide {
        /// Data code of the item
        code: u8,
        /// Length that arrived
        length: usize,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { code, length, expected } => {
                write!(f, "code 0x{code:02X}: value length {length}, expected {expected}")
            }
            Self::ValueTooWide { code, length } => {
                write!(f, "code 0x{code:02X}: {length} value bytes exceed 8-byte maximum")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::WrongLength { code, length, expected } => {
                defmt::write!(f, "0x{:02X}: len {} != {}", code, length, expected);
            }
            Self::ValueTooWide { code, length } => {
                defmt::write!(f, "0x{:02X}: len {} > 8", code, length);
            }
        }
    }
}
