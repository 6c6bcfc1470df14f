use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;
use ndarray::{s, Axis};
use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use crate::dsp::config::{BandAggregation, BandRanges};
use crate::dsp::epoch::Epoch;
use crate::dsp::PipelineError;
use crate::types::{Band, BandPowerVector};
/// Windowed FFT band-power estimator for a fixed epoch length.
///
/// Every call detrends each channel, applies the same Hamming window, and sums the
/// one-sided power spectrum over a precomputed bin-to-band partition.
pub struct SpectralBandPower {
    sample_rate_hz: f64,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    partition: Vec<Option<Band>>, // bin -> band
    bins_per_band: [usize; Band::COUNT],
    aggregation: BandAggregation,
}
impl fmt::Debug for SpectralBandPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralBandPower")
            .field("sample_rate_hz", &self.sample_rate_hz)
            .field("window_len", &self.window.len())
            .field("bins_per_band", &self.bins_per_band)
            .field("aggregation", &self.aggregation)
            .finish()
    }
}
impl SpectralBandPower {
    pub fn new(
        sample_rate_hz: f64,
        window_len: usize,
        bands: &BandRanges,
        aggregation: BandAggregation,
    ) -> Result<Self, PipelineError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(PipelineError::InvalidSampleRate);
        }
        if window_len < 2 {
            return Err(PipelineError::Configuration(format!(
                "spectral window needs at least two samples, got {window_len}"
            )));
        }
        bands.validate(sample_rate_hz * 0.5)?;
        let bin_hz = sample_rate_hz / window_len as f64;
        let partition: Vec<Option<Band>> = (0..window_len / 2 + 1)
            .map(|k| bands.band_for(k as f64 * bin_hz))
            .collect();
        let mut bins_per_band = [0usize; Band::COUNT];
        for band in partition.iter().flatten() {
            bins_per_band[band.index()] += 1;
        }
        if let Some(&empty) = Band::ALL.iter().find(|b| bins_per_band[b.index()] == 0) {
            return Err(PipelineError::EmptyBand(empty));
        }
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(window_len);
        Ok(Self {
            sample_rate_hz,
            window: hamming_window(window_len),
            fft,
            partition,
            bins_per_band,
            aggregation,
        })
    }
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
    pub fn bin_count(&self) -> usize {
        self.partition.len()
    }
    pub fn bin_frequencies(&self) -> Vec<f64> {
        let bin_hz = self.sample_rate_hz / self.window_len() as f64;
        (0..self.bin_count()).map(|k| k as f64 * bin_hz).collect()
    }
    /// Band that owns bin `k`; `None` for bins outside every band or past Nyquist.
    pub fn band_of_bin(&self, k: usize) -> Option<Band> {
        self.partition.get(k).copied().flatten()
    }
    pub fn bins_in(&self, band: Band) -> usize {
        self.bins_per_band[band.index()]
    }
    /// One-sided power spectrum of a single channel, `window_len / 2 + 1` bins.
    ///
    /// `samples` must hold exactly `window_len` values.
    pub fn power_spectrum(&self, samples: &[f64]) -> Result<Vec<f64>, PipelineError> {
        let n = self.window_len();
        if samples.len() != n {
            return Err(PipelineError::EpochTooShort {
                required: n,
                actual: samples.len(),
            });
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let mut buffer: Vec<Complex64> = samples
            .iter()
            .zip(&self.window)
            .map(|(&v, &w)| Complex64::new((v - mean) * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);
        let norm = 1.0 / (n as f64 * n as f64);
        let nyquist_bin = if n % 2 == 0 { Some(n / 2) } else { None };
        Ok(buffer[..self.bin_count()]
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let power = c.norm_sqr() * norm;
                // Fold the negative-frequency half onto the positive bins.
                if k == 0 || Some(k) == nyquist_bin {
                    power
                } else {
                    2.0 * power
                }
            })
            .collect())
    }
    /// Band powers of the newest `window_len` rows, averaged over channels.
    pub fn compute(&self, epoch: &Epoch) -> Result<BandPowerVector, PipelineError> {
        let n = self.window_len();
        if epoch.nrows() < n {
            return Err(PipelineError::EpochTooShort {
                required: n,
                actual: epoch.nrows(),
            });
        }
        if epoch.ncols() == 0 {
            return Err(PipelineError::ChannelMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let tail = epoch.slice(s![epoch.nrows() - n.., ..]);
        let mut totals = [0.0f64; Band::COUNT];
        for channel in tail.axis_iter(Axis(1)) {
            let samples = channel.to_vec();
            let spectrum = self.power_spectrum(&samples)?;
            for (power, band) in spectrum.iter().zip(&self.partition) {
                if let Some(band) = band {
                    totals[band.index()] += power;
                }
            }
        }
        let channels = epoch.ncols() as f64;
        let mut powers = BandPowerVector::zeros();
        for band in Band::ALL {
            let mut value = totals[band.index()] / channels;
            if self.aggregation == BandAggregation::Mean {
                value /= self.bins_per_band[band.index()] as f64;
            }
            powers[band] = value;
        }
        Ok(powers)
    }
}
/// Symmetric Hamming window, `0.54 - 0.46 cos(2 pi i / (n - 1))`.
pub fn hamming_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    const FS: f64 = 256.0;
    fn estimator(aggregation: BandAggregation) -> SpectralBandPower {
        SpectralBandPower::new(FS, 256, &BandRanges::default(), aggregation).unwrap()
    }
    fn sine_epoch(freq_hz: f64, amplitude: f64, len: usize) -> Epoch {
        Array2::from_shape_fn((len, 1), |(i, _)| {
            amplitude * (2.0 * PI * freq_hz * i as f64 / FS).sin()
        })
    }
    #[test]
    fn spectrum_has_half_plus_one_bins() {
        let bp = estimator(BandAggregation::Sum);
        assert_eq!(bp.bin_count(), 129);
        let freqs = bp.bin_frequencies();
        assert_eq!(freqs[1], 1.0);
        assert_eq!(freqs[128], 128.0);
    }
    #[test]
    fn every_bin_in_the_span_maps_to_exactly_one_band() {
        let bands = BandRanges::default();
        for (fs, len) in [(256.0, 256), (250.0, 250), (256.0, 200), (512.0, 384)] {
            let bp = SpectralBandPower::new(fs, len, &bands, BandAggregation::Sum).unwrap();
            let span = bands.span();
            for (k, freq) in bp.bin_frequencies().into_iter().enumerate() {
                let owners: Vec<Band> = Band::ALL
                    .iter()
                    .copied()
                    .filter(|&b| bands.get(b).contains(freq))
                    .collect();
                if span.contains(freq) {
                    assert_eq!(owners.len(), 1, "bin {k} at {freq} Hz");
                    assert_eq!(bp.band_of_bin(k), Some(owners[0]));
                } else {
                    assert!(owners.is_empty());
                    assert_eq!(bp.band_of_bin(k), None);
                }
            }
            let counted: usize = Band::ALL.iter().map(|&b| bp.bins_in(b)).sum();
            let in_span = bp
                .bin_frequencies()
                .into_iter()
                .filter(|&f| span.contains(f))
                .count();
            assert_eq!(counted, in_span);
        }
    }
    #[test]
    fn pure_alpha_sinusoid_lands_in_alpha() {
        let bp = estimator(BandAggregation::Sum);
        let powers = bp.compute(&sine_epoch(10.0, 20.0, 256)).unwrap();
        let total = powers.total();
        assert!(powers[Band::Alpha] > 0.9 * total, "{powers:?}");
        assert!(powers[Band::Delta] < 1e-3 * powers[Band::Alpha]);
        assert!(powers[Band::Beta] < 1e-2 * powers[Band::Alpha]);
    }
    #[test]
    fn pure_beta_sinusoid_lands_in_beta() {
        let bp = estimator(BandAggregation::Sum);
        let powers = bp.compute(&sine_epoch(20.0, 5.0, 256)).unwrap();
        assert!(powers[Band::Beta] > 0.9 * powers.total(), "{powers:?}");
        assert!(powers[Band::Delta] < 1e-3 * powers[Band::Beta]);
        assert!(powers[Band::Theta] < 1e-3 * powers[Band::Beta]);
    }
    #[test]
    fn flat_epoch_gives_exact_zeros() {
        let bp = estimator(BandAggregation::Mean);
        let flat = Array2::from_elem((256, 2), 431.5);
        assert_eq!(bp.compute(&flat).unwrap(), BandPowerVector::zeros());
    }
    #[test]
    fn short_epoch_is_rejected() {
        let bp = estimator(BandAggregation::Sum);
        assert!(matches!(
            bp.compute(&sine_epoch(10.0, 1.0, 255)),
            Err(PipelineError::EpochTooShort { required: 256, actual: 255 })
        ));
    }
    #[test]
    fn longer_epoch_uses_newest_rows() {
        let bp = estimator(BandAggregation::Sum);
        let mut epoch = Array2::<f64>::zeros((300, 1));
        epoch
            .slice_mut(s![44.., ..])
            .assign(&sine_epoch(10.0, 3.0, 256));
        let expected = bp.compute(&sine_epoch(10.0, 3.0, 256)).unwrap();
        assert_eq!(bp.compute(&epoch).unwrap(), expected);
    }
    #[test]
    fn mean_aggregation_divides_by_bin_count() {
        let sum = estimator(BandAggregation::Sum);
        let mean = estimator(BandAggregation::Mean);
        let epoch = sine_epoch(6.0, 2.0, 256);
        let total = sum.compute(&epoch).unwrap();
        let averaged = mean.compute(&epoch).unwrap();
        for band in Band::ALL {
            let expected = total[band] / sum.bins_in(band) as f64;
            assert!((averaged[band] - expected).abs() <= 1e-12 * expected.abs().max(1.0));
        }
        assert_eq!(sum.bins_in(Band::Beta), 18);
    }
    #[test]
    fn channels_are_averaged() {
        let bp = estimator(BandAggregation::Sum);
        let single = bp.compute(&sine_epoch(10.0, 4.0, 256)).unwrap();
        let mut pair = Array2::<f64>::zeros((256, 2));
        pair.column_mut(0).assign(&sine_epoch(10.0, 4.0, 256).column(0));
        let averaged = bp.compute(&pair).unwrap();
        for band in Band::ALL {
            assert!((averaged[band] - single[band] / 2.0).abs() < 1e-9);
        }
    }
    #[test]
    fn coarse_resolution_leaving_a_band_empty_is_rejected() {
        // 64 Hz / 16 samples = 4 Hz bins: delta [1, 4) owns no bin.
        let bands = BandRanges::default();
        assert!(matches!(
            SpectralBandPower::new(64.0, 16, &bands, BandAggregation::Sum),
            Err(PipelineError::EmptyBand(Band::Delta))
        ));
    }
    #[test]
    fn hamming_window_is_symmetric() {
        let w = hamming_window(9);
        assert!((w[0] - 0.08).abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        for i in 0..9 {
            assert!((w[i] - w[8 - i]).abs() < 1e-12);
        }
    }
}
