//! Frame layer for the ThinkGear-style serial stream
//!
//! Wire format, bit-exact:
//!
//! ```text
//! [0xAA][0xAA][LEN:1][PAYLOAD: LEN bytes][CHECKSUM:1]
//! LEN ∈ [0, 169]
//! CHECKSUM = (~(sum(PAYLOAD) mod 256)) mod 256
//! ```
//!
//! The reader is self-synchronizing: any failure discards the current
//! attempt and the next call scans forward for the sync marker again. No
//! partial state is retained across calls, and nothing here allocates.

use heapless::Vec;

use crate::error::FrameError;

// ============================================================================
// Wire Constants
// ============================================================================

/// Sync marker byte; two in a row start a frame.
pub const SYNC: u8 = 0xAA;

/// Maximum payload length a frame may declare.
pub const MAX_PAYLOAD_LEN: usize = 169;

/// Maximum encoded frame size: sync pair + length + payload + checksum.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + 4;

/// Validated payload bytes of one frame.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// One complete encoded frame.
pub type FrameBuf = Vec<u8, MAX_FRAME_LEN>;

// ============================================================================
// Checksum
// ============================================================================

/// Compute the frame checksum over a payload.
///
/// Sums all bytes, keeps the low 8 bits, and inverts them (one's
/// complement). Total function: every byte sequence has a checksum.
#[must_use]
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    !sum
}

// ============================================================================
// Byte Source
// ============================================================================

/// A readable byte stream with timeout semantics.
///
/// `read` fills up to `buf.len()` bytes and returns how many arrived.
/// `Ok(0)` means the configured timeout elapsed with no data; that is a
/// recoverable condition, distinct from a parsed zero byte. `Err` means
/// the source itself is broken (stream closed), which is fatal to the
/// surrounding loop. The source's lifecycle is owned by the caller.
pub trait ByteSource {
    /// Fatal transport error produced by this source.
    type Error;

    /// Read up to `buf.len()` bytes, returning fewer on timeout.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// In-memory byte source over a slice, used for tests and stream replay.
///
/// Reading consumes the front of the slice; an exhausted slice behaves
/// like a permanent timeout.
impl ByteSource for &[u8] {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.len().min(buf.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}

fn read_byte<S: ByteSource>(source: &mut S) -> Result<Option<u8>, S::Error> {
    let mut buf = [0u8; 1];
    let n = source.read(&mut buf)?;
    Ok(if n == 0 { None } else { Some(buf[0]) })
}

// ============================================================================
// Frame Reading
// ============================================================================

/// Scan until two consecutive sync bytes are observed.
///
/// A sync byte followed by a non-sync byte restarts the search from the
/// non-matching byte, so overlapping candidates are not lost.
fn find_sync<S: ByteSource>(source: &mut S) -> Result<(), FrameError<S::Error>> {
    let mut last = match read_byte(source).map_err(FrameError::Source)? {
        Some(b) => b,
        None => return Err(FrameError::SyncTimeout),
    };

    loop {
        let next = match read_byte(source).map_err(FrameError::Source)? {
            Some(b) => b,
            None => return Err(FrameError::SyncTimeout),
        };

        if last == SYNC && next == SYNC {
            return Ok(());
        }
        last = next;
    }
}

/// Read and validate one frame, returning its payload.
///
/// # Errors
///
/// Returns [`FrameError::Source`] if the byte source fails (fatal), and a
/// recoverable variant for a sync-scan timeout, an out-of-range length
/// byte, a short payload read, or a checksum mismatch. On any recoverable
/// error the caller simply calls `read_frame` again; re-synchronization
/// needs no extra state.
pub fn read_frame<S: ByteSource>(source: &mut S) -> Result<Payload, FrameError<S::Error>> {
    find_sync(source)?;

    let length = match read_byte(source).map_err(FrameError::Source)? {
        Some(b) => usize::from(b),
        None => return Err(FrameError::ShortRead { received: 0, expected: 1 }),
    };
    if length > MAX_PAYLOAD_LEN {
        return Err(FrameError::LengthOutOfRange { length });
    }

    let mut payload = Payload::new();
    if payload.resize(length, 0).is_err() {
        // unreachable: length was bounded above
        return Err(FrameError::LengthOutOfRange { length });
    }

    let mut received = 0;
    while received < length {
        let n = source
            .read(&mut payload[received..])
            .map_err(FrameError::Source)?;
        if n == 0 {
            return Err(FrameError::ShortRead { received, expected: length });
        }
        received += n;
    }

    let expected = checksum(&payload);
    match read_byte(source).map_err(FrameError::Source)? {
        Some(received) if received == expected => Ok(payload),
        Some(received) => Err(FrameError::ChecksumMismatch { expected, received }),
        None => Err(FrameError::ShortRead { received: 0, expected: 1 }),
    }
}

/// Pull-based iterator of frame outcomes over a byte source.
///
/// Produced by [`frames`]. The sequence is infinite and restartable: each
/// `next` is one [`read_frame`] attempt, and the consumer decides whether
/// to keep pulling after a failure (typically: continue unless
/// [`FrameError::is_fatal`]).
pub struct Frames<'a, S> {
    source: &'a mut S,
}

impl<S: ByteSource> Iterator for Frames<'_, S> {
    type Item = Result<Payload, FrameError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(read_frame(self.source))
    }
}

/// Iterate frame outcomes from a byte source.
pub fn frames<S: ByteSource>(source: &mut S) -> Frames<'_, S> {
    Frames { source }
}

// ============================================================================
// Frame Encoding
// ============================================================================

/// Encode a payload into one complete frame.
///
/// Used by tests and by simulated devices; a real headset is the usual
/// producer.
///
/// # Errors
///
/// Returns [`FrameError::LengthOutOfRange`] if the payload exceeds
/// [`MAX_PAYLOAD_LEN`].
pub fn encode_frame(payload: &[u8]) -> Result<FrameBuf, FrameError<core::convert::Infallible>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::LengthOutOfRange { length: payload.len() });
    }

    let mut frame = FrameBuf::new();
    // capacity holds any payload that passed the length check
    let _ = frame.push(SYNC);
    let _ = frame.push(SYNC);
    let _ = frame.push(payload.len() as u8);
    let _ = frame.extend_from_slice(payload);
    let _ = frame.push(checksum(payload));

    Ok(frame)
}

// ============================================================================
// Tests
// ============================================================================
