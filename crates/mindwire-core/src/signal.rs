//! Stateful signal aggregation with exponential smoothing
//!
//! The aggregator owns one smoothed value per tracked signal and applies
//! `new = α·observed + (1−α)·previous` whenever a payload carries the
//! relevant code. It is a caller-owned value with explicit configuration,
//! not a process-wide singleton, and assumes at most one concurrent
//! caller; wrap it in external mutual exclusion if shared across threads.

use serde::{Deserialize, Serialize};

use crate::decode::{codes, decode_payload, DataValue};

/// Interest set for the eSense values carried as single-byte items.
const ESENSE_INTEREST: &[(u8, &str)] = &[
    (codes::ATTENTION, "attention"),
    (codes::MEDITATION, "meditation"),
];

/// Interest set for the band power item.
const POWER_INTEREST: &[(u8, &str)] = &[(codes::EEG_POWER, "eeg_power")];

/// Unweighted mean of the selected band power entries. Out-of-range
/// indices read as zero.
fn band_mean(bands: &[u32; 8], indices: [usize; 2]) -> f32 {
    let sum: f32 = indices
        .iter()
        .map(|&i| bands.get(i).copied().unwrap_or(0) as f32)
        .sum();
    sum / indices.len() as f32
}

// ============================================================================
// Configuration
// ============================================================================

/// Smoothing and band-aggregation configuration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Exponential smoothing factor α, 0 < α ≤ 1
    pub factor: f32,
    /// Band power indices averaged into the alpha signal
    pub alpha_bands: [usize; 2],
    /// Band power indices averaged into the beta signal
    pub beta_bands: [usize; 2],
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            factor: 0.2,
            // Low-Alpha, High-Alpha / Low-Beta, High-Beta
            alpha_bands: [2, 3],
            beta_bands: [4, 5],
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Current smoothed value of every tracked signal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// eSense attention, smoothed
    pub attention: f32,
    /// eSense meditation, smoothed
    pub meditation: f32,
    /// Mean of the configured alpha bands, smoothed
    pub alpha: f32,
    /// Mean of the configured beta bands, smoothed
    pub beta: f32,
}

/// Per-signal smoothing state over successive payloads.
///
/// Every smoothed value starts at 0.0 and persists for the life of the
/// aggregator. Each `update_*` call decodes the payload for its own
/// interest set, touches only its own state entry, and returns the stored
/// value unchanged (no decay) when the payload does not carry the
/// relevant code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalAggregator {
    config: SmoothingConfig,
    state: SignalSnapshot,
}

impl SignalAggregator {
    /// Create an aggregator with all signals at 0.0.
    #[must_use]
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config, state: SignalSnapshot::default() }
    }

    /// The configuration this aggregator was built with.
    #[must_use]
    pub const fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Current smoothed values without updating anything.
    #[must_use]
    pub const fn snapshot(&self) -> SignalSnapshot {
        self.state
    }

    fn smooth(&self, previous: f32, observed: f32) -> f32 {
        self.config.factor * observed + (1.0 - self.config.factor) * previous
    }


    /// Fold the payload's attention value (code 0x04) into the smoothed
    /// attention signal and return it.
    pub fn update_attention(&mut self, payload: &[u8]) -> f32 {
        let values = decode_payload(payload, ESENSE_INTEREST);
        if let Some(DataValue::Byte(observed)) = values.get("attention") {
            self.state.attention = self.smooth(self.state.attention, f32::from(*observed));
        }
        self.state.attention
    }

    /// Fold the payload's meditation value (code 0x05) into the smoothed
    /// meditation signal and return it.
    pub fn update_meditation(&mut self, payload: &[u8]) -> f32 {
        let values = decode_payload(payload, ESENSE_INTEREST);
        if let Some(DataValue::Byte(observed)) = values.get("meditation") {
            self.state.meditation = self.smooth(self.state.meditation, f32::from(*observed));
        }
        self.state.meditation
    }

    /// Fold the payload's alpha band powers (code 0x83) into the smoothed
    /// alpha signal and return it.
    pub fn update_alpha(&mut self, payload: &[u8]) -> f32 {
        let values = decode_payload(payload, POWER_INTEREST);
        if let Some(DataValue::BandPower(bands)) = values.get("eeg_power") {
            let observed = band_mean(bands, self.config.alpha_bands);
            self.state.alpha = self.smooth(self.state.alpha, observed);
        }
        self.state.alpha
    }

    /// Fold the payload's beta band powers (code 0x83) into the smoothed
    /// beta signal and return it.
    pub fn update_beta(&mut self, payload: &[u8]) -> f32 {
        let values = decode_payload(payload, POWER_INTEREST);
        if let Some(DataValue::BandPower(bands)) = values.get("eeg_power") {
            let observed = band_mean(bands, self.config.beta_bands);
            self.state.beta = self.smooth(self.state.beta, observed);
        }
        self.state.beta
    }

    /// Drive all four signal updates from one payload.
    pub fn update(&mut self, payload: &[u8]) -> SignalSnapshot {
        self.update_attention(payload);
        self.update_meditation(payload);
        self.update_alpha(payload);
        self.update_beta(payload);
        self.state
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::BAND_POWER_LEN;

    fn band_payload(bands: [u32; 8]) -> [u8; 26] {
        let mut payload = [0u8; 26];
        payload[0] = codes::EEG_POWER;
        payload[1] = BAND_POWER_LEN as u8;
        for (i, band) in bands.iter().enumerate() {
            payload[2 + i * 3..2 + i * 3 + 3].copy_from_slice(&band.to_be_bytes()[1..]);
        }
        payload
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_attention_smoothing_from_zero() {
        let mut signals = SignalAggregator::new(SmoothingConfig::default());
        assert!(close(signals.update_attention(&[0x04, 50]), 10.0));
        assert!(close(signals.update_attention(&[0x04, 50]), 18.0));
    }

    #[test]
    fn test_absent_code_returns_previous_value() {
        let mut signals = SignalAggregator::new(SmoothingConfig::default());
        signals.update_attention(&[0x04, 50]);
        // meditation-only payload: attention stays put, no decay
        assert!(close(signals.update_attention(&[0x05, 80]), 10.0));
    }

    #[test]
    fn test_alpha_band_mean_smoothing() {
        let payload = band_payload([10, 20, 30, 40, 50, 60, 70, 80]);
        let mut signals = SignalAggregator::new(SmoothingConfig::default());

        // mean(30, 40) = 35; 0.2 * 35 = 7.0
        assert!(close(signals.update_alpha(&payload), 7.0));
        // 0.2 * 35 + 0.8 * 7.0 = 12.6
        assert!(close(signals.update_alpha(&payload), 12.6));
    }

    #[test]
    fn test_beta_band_mean() {
        let payload = band_payload([10, 20, 30, 40, 50, 60, 70, 80]);
        let mut signals = SignalAggregator::new(SmoothingConfig::default());

        // mean(50, 60) = 55; 0.2 * 55 = 11.0
        assert!(close(signals.update_beta(&payload), 11.0));
    }

    #[test]
    fn test_updates_touch_only_their_own_entry() {
        let payload = band_payload([10, 20, 30, 40, 50, 60, 70, 80]);
        let mut signals = SignalAggregator::new(SmoothingConfig::default());

        signals.update_attention(&[0x04, 50]);
        signals.update_alpha(&payload);

        let snapshot = signals.snapshot();
        assert!(close(snapshot.attention, 10.0));
        assert!(close(snapshot.alpha, 7.0));
        assert!(close(snapshot.meditation, 0.0));
        assert!(close(snapshot.beta, 0.0));
    }

    #[test]
    fn test_custom_band_indices() {
        let config = SmoothingConfig {
            factor: 1.0,
            alpha_bands: [0, 7],
            ..SmoothingConfig::default()
        };
        let payload = band_payload([10, 20, 30, 40, 50, 60, 70, 80]);
        let mut signals = SignalAggregator::new(config);

        // α = 1.0: no history, straight mean(10, 80)
        assert!(close(signals.update_alpha(&payload), 45.0));
    }

    #[test]
    fn test_update_drives_all_signals() {
        let mut payload = [0u8; 30];
        payload[..4].copy_from_slice(&[0x04, 50, 0x05, 100]);
        payload[4..].copy_from_slice(&band_payload([10, 20, 30, 40, 50, 60, 70, 80]));

        let mut signals = SignalAggregator::new(SmoothingConfig::default());
        let snapshot = signals.update(&payload);

        assert!(close(snapshot.attention, 10.0));
        assert!(close(snapshot.meditation, 20.0));
        assert!(close(snapshot.alpha, 7.0));
        assert!(close(snapshot.beta, 11.0));
    }
}
