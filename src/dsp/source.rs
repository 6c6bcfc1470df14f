use std::collections::VecDeque;
use std::f64::consts::PI;
use std::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::dsp::PipelineError;
/// One chunk as delivered by the acquisition layer, channels x samples.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalBatch {
    pub sample_rate_hz: f64,
    pub samples: Vec<Vec<f64>>,
    pub channel_labels: Vec<String>,
    /// Stream index of the first sample, when the source counts samples.
    pub first_sample: Option<u64>,
}
impl SignalBatch {
    pub fn new(sample_rate_hz: f64, samples: Vec<Vec<f64>>, channel_labels: Vec<String>) -> Self {
        Self {
            sample_rate_hz,
            samples,
            channel_labels,
            first_sample: None,
        }
    }
    pub fn starting_at(mut self, first_sample: u64) -> Self {
        self.first_sample = Some(first_sample);
        self
    }
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(PipelineError::InvalidSampleRate);
        }
        if self.samples.len() != self.channel_labels.len() {
            return Err(PipelineError::MalformedChunk(format!(
                "{} channels of samples but {} labels",
                self.samples.len(),
                self.channel_labels.len()
            )));
        }
        Ok(())
    }
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }
    pub fn samples_per_channel(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples_per_channel() as f64 / self.sample_rate_hz)
    }
}
/// Yields chunks until the stream ends with `Ok(None)`.
pub trait SignalSource {
    fn next_batch(&mut self) -> Result<Option<SignalBatch>, PipelineError>;
}
/// Replays recorded chunks in order.
#[derive(Clone, Debug, Default)]
pub struct ManualSource {
    pending: VecDeque<SignalBatch>,
}
impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = SignalBatch>) -> Self {
        Self {
            pending: batches.into_iter().collect(),
        }
    }
    pub fn push(&mut self, batch: SignalBatch) {
        self.pending.push_back(batch);
    }
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}
impl SignalSource for ManualSource {
    fn next_batch(&mut self) -> Result<Option<SignalBatch>, PipelineError> {
        Ok(self.pending.pop_front())
    }
}
/// Sinusoidal component of a simulated channel.
#[derive(Clone, Copy, Debug)]
pub struct Rhythm {
    pub freq_hz: f64,
    pub amplitude: f64,
}
/// Synthetic headset: every channel carries the same rhythms plus uniform noise.
pub struct SimulatedSource {
    sample_rate_hz: f64,
    channel_labels: Vec<String>,
    chunk_samples: usize,
    rhythms: Vec<Rhythm>,
    noise_amplitude: f64,
    remaining_chunks: Option<usize>,
    sample_index: u64,
    rng: StdRng,
}
impl SimulatedSource {
    pub fn new(
        sample_rate_hz: f64,
        channel_labels: Vec<String>,
        chunk_samples: usize,
        seed: u64,
    ) -> Self {
        Self {
            sample_rate_hz,
            channel_labels,
            chunk_samples,
            rhythms: Vec::new(),
            noise_amplitude: 1.0,
            remaining_chunks: None,
            sample_index: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
    pub fn with_rhythm(mut self, freq_hz: f64, amplitude: f64) -> Self {
        self.rhythms.push(Rhythm {
            freq_hz,
            amplitude,
        });
        self
    }
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude.abs();
        self
    }
    /// Stop after `chunks` batches instead of streaming forever.
    pub fn limited_to(mut self, chunks: usize) -> Self {
        self.remaining_chunks = Some(chunks);
        self
    }
    pub fn set_rhythms(&mut self, rhythms: Vec<Rhythm>) {
        self.rhythms = rhythms;
    }
    fn next_value(&mut self, t: f64) -> f64 {
        let clean: f64 = self
            .rhythms
            .iter()
            .map(|r| r.amplitude * (2.0 * PI * r.freq_hz * t).sin())
            .sum();
        let noise = if self.noise_amplitude > 0.0 {
            self.rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
        } else {
            0.0
        };
        clean + noise
    }
}
impl SignalSource for SimulatedSource {
    fn next_batch(&mut self) -> Result<Option<SignalBatch>, PipelineError> {
        if let Some(remaining) = self.remaining_chunks.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        let mut samples = vec![Vec::with_capacity(self.chunk_samples); self.channel_labels.len()];
        for i in 0..self.chunk_samples {
            let t = (self.sample_index + i as u64) as f64 / self.sample_rate_hz;
            for channel in samples.iter_mut() {
                let value = self.next_value(t);
                channel.push(value);
            }
        }
        let batch = SignalBatch::new(self.sample_rate_hz, samples, self.channel_labels.clone())
            .starting_at(self.sample_index);
        self.sample_index += self.chunk_samples as u64;
        Ok(Some(batch))
    }
}
