//! Simulated headset byte source
//!
//! Generates well-formed frames with sinusoidally drifting attention,
//! meditation, and band power values, so the full decode path can run
//! without hardware.

use std::collections::VecDeque;
use std::time::Duration;

use mindwire_core::{codes, decode::BAND_POWER_LEN, encode_frame, ByteSource};

/// Interval between generated frames, roughly the eSense update rate.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Byte source producing a synthetic headset stream.
pub struct SimulatedSource {
    pending: VecDeque<u8>,
    tick: u64,
}

impl SimulatedSource {
    /// Create a source starting at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: VecDeque::new(), tick: 0 }
    }

    fn push_frame(&mut self) {
        let t = self.tick as f32 * 0.05;
        self.tick += 1;

        let attention = (60.0 + 30.0 * (0.7 * t).sin()).clamp(0.0, 100.0) as u8;
        let meditation = (50.0 + 25.0 * (0.4 * t).cos()).clamp(0.0, 100.0) as u8;

        let mut payload = vec![
            codes::POOR_SIGNAL, 0,
            codes::ATTENTION, attention,
            codes::MEDITATION, meditation,
        ];

        // Band powers arrive at a lower rate than the eSense values.
        if self.tick % 8 == 0 {
            payload.push(codes::EEG_POWER);
            payload.push(BAND_POWER_LEN as u8);
            for band in 0..8u32 {
                let level = 20_000.0 + 10_000.0 * (0.3 * t + band as f32).sin();
                let value = level.max(0.0) as u32;
                payload.extend_from_slice(&value.to_be_bytes()[1..]);
            }
        }

        if let Ok(frame) = encode_frame(&payload) {
            self.pending.extend(frame.iter().copied());
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for SimulatedSource {
    type Error = std::io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.pending.is_empty() {
            // Pace the stream like a real headset would.
            std::thread::sleep(FRAME_INTERVAL);
            self.push_frame();
        }

        let n = buf.len().min(self.pending.len());
        for slot in buf[..n].iter_mut() {
            *slot = self.pending.pop_front().unwrap_or(0);
        }
        Ok(n)
    }
}
