//! Mindwire Core - `no_std` compatible ThinkGear stream decoding
//!
//! This crate implements the length-prefixed, checksummed binary telemetry
//! protocol spoken by ThinkGear-style EEG headsets over a serial byte
//! stream. It covers frame synchronization and validation, payload data
//! item decoding, and exponential smoothing of the derived signal values.
//! It is designed to work in `no_std` environments (embedded hosts) as
//! well as `std` environments.
//!
//! # Modules
//!
//! - [`protocol`]: Frame layer (sync search, length, checksum, byte source)
//! - [`decode`]: Payload data items, value decoding, code filtering
//! - [`signal`]: Stateful aggregator with exponential smoothing
//! - [`error`]: Error types for framing and value decoding
//!
//! # Features
//!
//! - `std`: Enable standard library support
//! - `defmt`: Enable `defmt` formatting for embedded logging
//!
//! # Example
//!
//! ```rust
//! use mindwire_core::{encode_frame, read_frame, SignalAggregator, SmoothingConfig};
//!
//! // A payload carrying attention 80 and meditation 53
//! let frame = encode_frame(&[0x04, 80, 0x05, 53]).unwrap();
//!
//! let mut stream: &[u8] = &frame;
//! let payload = read_frame(&mut stream).unwrap();
//!
//! let mut signals = SignalAggregator::new(SmoothingConfig::default());
//! assert!((signals.update_attention(&payload) - 16.0).abs() < 1e-3);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "std")]
extern crate std;

pub mod decode;
pub mod error;
pub mod protocol;
pub mod signal;

// Re-export commonly used items at crate root
pub use decode::{
    codes, data_items, decode_payload, decode_value, DataItem, DataItems, DataValue,
    DecodedValues,
};
pub use error::{DecodeError, FrameError};
pub use protocol::{
    checksum, encode_frame, frames, read_frame, ByteSource, Frames, Payload, MAX_PAYLOAD_LEN,
    SYNC,
};
pub use signal::{SignalAggregator, SignalSnapshot, SmoothingConfig};
