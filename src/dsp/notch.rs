use std::f64::consts::PI;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use crate::dsp::config::NotchConfig;
use crate::dsp::PipelineError;
#[derive(Clone, Copy, Debug, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}
impl BiquadCoeffs {
    fn notch(center_hz: f64, sample_rate_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * center_hz / sample_rate_hz;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        normalize(1.0, -2.0 * cos_w0, 1.0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
    }
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
    // Transposed direct form II.
    fn process(&self, z: &mut [f64; 2], input: f64) -> f64 {
        let y = self.b0 * input + z[0];
        z[0] = self.b1 * input - self.a1 * y + z[1];
        z[1] = self.b2 * input - self.a2 * y;
        y
    }
    /// Delay line holding a constant input `x` forever.
    fn steady_state(&self, x: f64) -> [f64; 2] {
        let g = self.dc_gain();
        [(g - self.b0) * x, (self.b2 - self.a2 * g) * x]
    }
}
fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> BiquadCoeffs {
    let a0_inv = 1.0 / a0;
    BiquadCoeffs {
        b0: b0 * a0_inv,
        b1: b1 * a0_inv,
        b2: b2 * a0_inv,
        a1: a1 * a0_inv,
        a2: a2 * a0_inv,
    }
}
/// Delay-line values for every channel and section, threaded from one chunk to the next.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    per_channel: Vec<Vec<[f64; 2]>>, // channel -> section -> [z1, z2]
}
impl FilterState {
    pub fn channels(&self) -> usize {
        self.per_channel.len()
    }
}
/// Cascade of identical notch biquads removing mains interference.
#[derive(Clone, Debug)]
pub struct NotchFilter {
    sections: Vec<BiquadCoeffs>,
}
impl NotchFilter {
    pub fn new(
        sample_rate_hz: f64,
        freq_hz: f64,
        quality: f64,
        sections: usize,
    ) -> Result<Self, PipelineError> {
        let config = NotchConfig {
            enabled: true,
            freq_hz,
            quality,
            sections,
        };
        config.validate(sample_rate_hz)?;
        let coeffs = BiquadCoeffs::notch(freq_hz, sample_rate_hz, quality);
        Ok(Self {
            sections: vec![coeffs; sections],
        })
    }
    /// `None` when the configuration disables the notch.
    pub fn from_config(
        config: &NotchConfig,
        sample_rate_hz: f64,
    ) -> Result<Option<Self>, PipelineError> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(sample_rate_hz, config.freq_hz, config.quality, config.sections).map(Some)
    }
    /// Filter `samples` (samples x channels) starting from `state`.
    ///
    /// A missing state is bootstrapped from the first row, so a constant input passes
    /// through without a start-up ramp. An empty chunk returns the state untouched.
    pub fn apply(
        &self,
        samples: ArrayView2<'_, f64>,
        state: Option<FilterState>,
    ) -> Result<(Array2<f64>, Option<FilterState>), PipelineError> {
        if samples.nrows() == 0 {
            return Ok((samples.to_owned(), state));
        }
        let mut state = match state {
            Some(state) => {
                if state.channels() != samples.ncols() {
                    return Err(PipelineError::ChannelMismatch {
                        expected: state.channels(),
                        actual: samples.ncols(),
                    });
                }
                state
            }
            None => self.initial_state(samples.row(0)),
        };
        let mut out = samples.to_owned();
        for (column, delays) in out
            .axis_iter_mut(Axis(1))
            .zip(state.per_channel.iter_mut())
        {
            for value in column {
                let mut x = *value;
                for (coeffs, z) in self.sections.iter().zip(delays.iter_mut()) {
                    x = coeffs.process(z, x);
                }
                *value = x;
            }
        }
        Ok((out, Some(state)))
    }
    pub fn initial_state(&self, first: ArrayView1<'_, f64>) -> FilterState {
        let per_channel = first
            .iter()
            .map(|&x0| {
                let mut x = x0;
                self.sections
                    .iter()
                    .map(|coeffs| {
                        let z = coeffs.steady_state(x);
                        x *= coeffs.dc_gain();
                        z
                    })
                    .collect()
            })
            .collect();
        FilterState { per_channel }
    }
}
