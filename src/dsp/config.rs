use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::dsp::PipelineError;
use crate::types::Band;
/// Tolerance used when turning second-based lengths into counts.
const COUNT_EPSILON: f64 = 1e-9;
/// Upper bound on raw buffer rows; about 18 hours at 256 Hz.
pub const MAX_BUFFER_SAMPLES: usize = 1 << 24;
/// Half-open frequency range `[low_hz, high_hz)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub low_hz: f64,
    pub high_hz: f64,
}
impl FrequencyRange {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz < self.high_hz
    }
}
/// Frequency range for each band. Bands must tile one contiguous span in
/// `Band::ALL` order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandRanges {
    pub delta: FrequencyRange,
    pub theta: FrequencyRange,
    pub alpha: FrequencyRange,
    pub beta: FrequencyRange,
}
impl Default for BandRanges {
    fn default() -> Self {
        Self {
            delta: FrequencyRange::new(1.0, 4.0),
            theta: FrequencyRange::new(4.0, 8.0),
            alpha: FrequencyRange::new(8.0, 12.0),
            beta: FrequencyRange::new(12.0, 30.0),
        }
    }
}
impl BandRanges {
    pub fn get(&self, band: Band) -> FrequencyRange {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
        }
    }
    /// The band whose range holds `freq_hz`, if any.
    pub fn band_for(&self, freq_hz: f64) -> Option<Band> {
        Band::ALL
            .iter()
            .copied()
            .find(|&band| self.get(band).contains(freq_hz))
    }
    /// Whole analysed span, from the lowest band edge to the highest.
    pub fn span(&self) -> FrequencyRange {
        FrequencyRange::new(self.delta.low_hz, self.beta.high_hz)
    }
    pub fn validate(&self, nyquist_hz: f64) -> Result<(), PipelineError> {
        for band in Band::ALL {
            let range = self.get(band);
            if !(range.low_hz >= 0.0 && range.low_hz < range.high_hz) {
                return Err(PipelineError::Configuration(format!(
                    "band {band} must satisfy 0 <= low < high, got [{}, {})",
                    range.low_hz, range.high_hz
                )));
            }
        }
        for pair in Band::ALL.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            let lower_high = self.get(lower).high_hz;
            let upper_low = self.get(upper).low_hz;
            if upper_low < lower_high {
                return Err(PipelineError::BandOverlap { lower, upper });
            }
            if upper_low > lower_high {
                return Err(PipelineError::BandGap { lower, upper });
            }
        }
        if self.beta.high_hz > nyquist_hz {
            return Err(PipelineError::Configuration(format!(
                "highest band edge {} Hz is above the Nyquist frequency {} Hz",
                self.beta.high_hz, nyquist_hz
            )));
        }
        Ok(())
    }
}
/// How bin powers inside a band are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandAggregation {
    /// Integrated power: sum of the band's bins.
    #[default]
    Sum,
    /// Mean bin power, as the classic muse-lsl band-power helper computes it.
    Mean,
}
/// What the pipeline does before its buffers hold real data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPolicy {
    /// Buffers count as full from the start; early epochs and the band-power
    /// average include zero-initialised slots, so the first metrics are biased.
    #[default]
    ZeroPadded,
    /// Epochs fail with `InsufficientData` until enough samples arrived, and the
    /// average only covers band-power vectors that were actually computed.
    WaitForFill,
}
/// Mains interference rejection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotchConfig {
    pub enabled: bool,
    pub freq_hz: f64,
    pub quality: f64,
    /// Number of identical notch biquads in cascade.
    pub sections: usize,
}
impl Default for NotchConfig {
    fn default() -> Self {
        // Roughly the 55-65 Hz band-stop used with Muse headsets.
        Self {
            enabled: true,
            freq_hz: 60.0,
            quality: 6.0,
            sections: 2,
        }
    }
}
impl NotchConfig {
    pub fn validate(&self, sample_rate_hz: f64) -> Result<(), PipelineError> {
        if !self.enabled {
            return Ok(());
        }
        let nyquist = sample_rate_hz * 0.5;
        if !(self.freq_hz > 0.0 && self.freq_hz < nyquist) {
            return Err(PipelineError::Configuration(format!(
                "notch frequency {} Hz must lie in (0, {nyquist}) Hz",
                self.freq_hz
            )));
        }
        if !(self.quality > 0.0) {
            return Err(PipelineError::Configuration(format!(
                "notch quality must be positive, got {}",
                self.quality
            )));
        }
        if self.sections == 0 {
            return Err(PipelineError::Configuration(
                "notch filter needs at least one section".into(),
            ));
        }
        Ok(())
    }
}
/// Band ratio used as the feedback metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub numerator: Band,
    pub denominator: Band,
}
impl Default for MetricConfig {
    fn default() -> Self {
        // Beta protocol: concentration rises with beta over theta.
        Self {
            numerator: Band::Beta,
            denominator: Band::Theta,
        }
    }
}
/// Session parameters, built once and handed to the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw buffer retention, seconds.
    pub buffer_length_s: f64,
    /// Analysis window, seconds.
    pub epoch_length_s: f64,
    /// Overlap between consecutive epochs, seconds.
    pub overlap_length_s: f64,
    /// Stream channel indices fed to the pipeline.
    pub channels: Vec<usize>,
    pub bands: BandRanges,
    pub aggregation: BandAggregation,
    pub startup: StartupPolicy,
    pub notch: NotchConfig,
    pub metric: MetricConfig,
}
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_length_s: 5.0,
            epoch_length_s: 1.0,
            overlap_length_s: 0.8,
            channels: vec![0],
            bands: BandRanges::default(),
            aggregation: BandAggregation::default(),
            startup: StartupPolicy::default(),
            notch: NotchConfig::default(),
            metric: MetricConfig::default(),
        }
    }
}
impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
    pub fn shift_length_s(&self) -> f64 {
        self.epoch_length_s - self.overlap_length_s
    }
    pub fn buffer_samples(&self, sample_rate_hz: f64) -> usize {
        seconds_to_samples(self.buffer_length_s, sample_rate_hz)
    }
    pub fn epoch_samples(&self, sample_rate_hz: f64) -> usize {
        seconds_to_samples(self.epoch_length_s, sample_rate_hz)
    }
    /// Samples to pull per cycle so that each cycle advances by one shift.
    pub fn chunk_samples(&self, sample_rate_hz: f64) -> usize {
        ((self.shift_length_s() * sample_rate_hz + COUNT_EPSILON).floor() as usize).max(1)
    }
    /// Epochs that fit in the buffer window: `floor((buffer - epoch) / shift) + 1`.
    pub fn history_len(&self) -> usize {
        let epochs = (self.buffer_length_s - self.epoch_length_s) / self.shift_length_s();
        (epochs + COUNT_EPSILON).floor() as usize + 1
    }
    pub fn validate(
        &self,
        sample_rate_hz: f64,
        stream_channels: usize,
    ) -> Result<(), PipelineError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(PipelineError::InvalidSampleRate);
        }
        let lengths = [
            self.buffer_length_s,
            self.epoch_length_s,
            self.overlap_length_s,
        ];
        if lengths.iter().any(|len| !len.is_finite()) {
            return Err(PipelineError::Configuration(
                "buffer, epoch and overlap lengths must be finite".into(),
            ));
        }
        if !(self.epoch_length_s > 0.0 && self.buffer_length_s > 0.0) {
            return Err(PipelineError::Configuration(
                "buffer and epoch lengths must be positive".into(),
            ));
        }
        if self.overlap_length_s < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "overlap length must not be negative, got {}",
                self.overlap_length_s
            )));
        }
        if !(self.shift_length_s() > 0.0) {
            return Err(PipelineError::Configuration(format!(
                "shift length (epoch {} s - overlap {} s) must be positive",
                self.epoch_length_s, self.overlap_length_s
            )));
        }
        // history_len is bounded by buffer_samples once a shift spans a sample
        if self.shift_length_s() * sample_rate_hz + COUNT_EPSILON < 1.0 {
            return Err(PipelineError::Configuration(format!(
                "shift length {} s is shorter than one sample at {sample_rate_hz} Hz",
                self.shift_length_s()
            )));
        }
        let buffer_samples = self.buffer_samples(sample_rate_hz);
        if buffer_samples > MAX_BUFFER_SAMPLES {
            return Err(PipelineError::Configuration(format!(
                "buffer of {buffer_samples} samples exceeds the {MAX_BUFFER_SAMPLES} sample limit"
            )));
        }
        if self.epoch_length_s > self.buffer_length_s {
            return Err(PipelineError::Configuration(format!(
                "epoch length {} s exceeds buffer length {} s",
                self.epoch_length_s, self.buffer_length_s
            )));
        }
        if self.epoch_samples(sample_rate_hz) < 2 {
            return Err(PipelineError::Configuration(
                "epoch must span at least two samples".into(),
            ));
        }
        if self.channels.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one channel must be selected".into(),
            ));
        }
        for (i, &channel) in self.channels.iter().enumerate() {
            if channel >= stream_channels {
                return Err(PipelineError::Configuration(format!(
                    "channel {channel} selected but the stream has {stream_channels} channels"
                )));
            }
            if self.channels[..i].contains(&channel) {
                return Err(PipelineError::Configuration(format!(
                    "channel {channel} selected twice"
                )));
            }
        }
        self.bands.validate(sample_rate_hz * 0.5)?;
        self.notch.validate(sample_rate_hz)?;
        if self.metric.numerator == self.metric.denominator {
            return Err(PipelineError::Configuration(format!(
                "metric numerator and denominator are both {}",
                self.metric.numerator
            )));
        }
        Ok(())
    }
}
fn seconds_to_samples(seconds: f64, sample_rate_hz: f64) -> usize {
    (seconds * sample_rate_hz).round() as usize
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults_match_reference_session() {
        let config = PipelineConfig::default();
        assert_eq!(config.buffer_samples(256.0), 1280);
        assert_eq!(config.epoch_samples(256.0), 256);
        assert_eq!(config.chunk_samples(256.0), 51);
        assert_eq!(config.history_len(), 21);
        assert!(config.validate(256.0, 4).is_ok());
    }
    #[test]
    fn non_positive_shift_is_rejected() {
        let mut config = PipelineConfig::default();
        config.overlap_length_s = 1.0;
        assert!(matches!(
            config.validate(256.0, 1),
            Err(PipelineError::Configuration(_))
        ));
        config.overlap_length_s = 1.5;
        assert!(config.validate(256.0, 1).is_err());
    }
    #[test]
    fn sub_sample_shift_is_rejected() {
        let config = PipelineConfig {
            overlap_length_s: 1.0 - 1e-12,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(256.0, 1),
            Err(PipelineError::Configuration(_))
        ));
        // exactly one sample per shift is the smallest accepted step
        let config = PipelineConfig {
            overlap_length_s: 1.0 - 1.0 / 256.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate(256.0, 1).is_ok());
        assert_eq!(config.chunk_samples(256.0), 1);
        assert!(config.history_len() <= config.buffer_samples(256.0) + 1);
    }
    #[test]
    fn oversized_or_non_finite_buffer_is_rejected() {
        for buffer_length_s in [f64::INFINITY, f64::NAN, 1.0e9] {
            let config = PipelineConfig {
                buffer_length_s,
                ..PipelineConfig::default()
            };
            assert!(matches!(
                config.validate(256.0, 1),
                Err(PipelineError::Configuration(_))
            ));
        }
        let config = PipelineConfig {
            overlap_length_s: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(config.validate(256.0, 1).is_err());
    }
    #[test]
    fn non_positive_sample_rate_is_rejected() {
        let config = PipelineConfig::default();
        assert!(matches!(
            config.validate(0.0, 1),
            Err(PipelineError::InvalidSampleRate)
        ));
        assert!(matches!(
            config.validate(-256.0, 1),
            Err(PipelineError::InvalidSampleRate)
        ));
    }
    #[test]
    fn overlapping_bands_are_rejected() {
        let mut bands = BandRanges::default();
        bands.theta = FrequencyRange::new(3.0, 8.0);
        assert!(matches!(
            bands.validate(128.0),
            Err(PipelineError::BandOverlap {
                lower: Band::Delta,
                upper: Band::Theta
            })
        ));
    }
    #[test]
    fn gapped_bands_are_rejected() {
        let mut bands = BandRanges::default();
        bands.beta = FrequencyRange::new(13.0, 30.0);
        assert!(matches!(
            bands.validate(128.0),
            Err(PipelineError::BandGap {
                lower: Band::Alpha,
                upper: Band::Beta
            })
        ));
    }
    #[test]
    fn bands_above_nyquist_are_rejected() {
        assert!(BandRanges::default().validate(20.0).is_err());
    }
    #[test]
    fn band_lookup_uses_half_open_ranges() {
        let bands = BandRanges::default();
        assert_eq!(bands.band_for(0.5), None);
        assert_eq!(bands.band_for(1.0), Some(Band::Delta));
        assert_eq!(bands.band_for(4.0), Some(Band::Theta));
        assert_eq!(bands.band_for(11.99), Some(Band::Alpha));
        assert_eq!(bands.band_for(12.0), Some(Band::Beta));
        assert_eq!(bands.band_for(30.0), None);
    }
    #[test]
    fn channel_selection_is_checked_against_stream() {
        let mut config = PipelineConfig::default();
        config.channels = vec![0, 4];
        assert!(config.validate(256.0, 4).is_err());
        config.channels = vec![1, 1];
        assert!(config.validate(256.0, 4).is_err());
        config.channels = vec![];
        assert!(config.validate(256.0, 4).is_err());
    }
    #[test]
    fn notch_must_sit_below_nyquist() {
        let mut config = PipelineConfig::default();
        config.notch.freq_hz = 128.0;
        assert!(config.validate(256.0, 1).is_err());
        config.notch.enabled = false;
        assert!(config.validate(256.0, 1).is_ok());
    }
    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "overlap_length_s": 0.5,
                "channels": [1, 2],
                "startup": "wait_for_fill",
                "notch": { "freq_hz": 50.0 },
                "metric": { "numerator": "theta", "denominator": "beta" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.buffer_length_s, 5.0);
        assert_eq!(config.overlap_length_s, 0.5);
        assert_eq!(config.channels, vec![1, 2]);
        assert_eq!(config.startup, StartupPolicy::WaitForFill);
        assert_eq!(config.notch.freq_hz, 50.0);
        assert_eq!(config.notch.sections, 2);
        assert_eq!(config.metric.numerator, Band::Theta);
        assert_eq!(config.history_len(), 9);
    }
    #[test]
    fn invalid_json_is_a_configuration_error() {
        let err = PipelineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
        assert!(err.is_configuration());
    }
}
