use log::{debug, info, warn};
use ndarray::Array2;
use crate::dsp::buffer::RingBuffer;
use crate::dsp::config::PipelineConfig;
use crate::dsp::epoch::EpochExtractor;
use crate::dsp::error::PipelineError;
use crate::dsp::fft::SpectralBandPower;
use crate::dsp::metric::MetricEstimator;
use crate::dsp::notch::{FilterState, NotchFilter};
use crate::dsp::smoothing::SmoothingBuffer;
use crate::dsp::source::{SignalBatch, SignalSource};
use crate::types::BandPowerVector;
/// Result of one acquisition cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleOutput {
    /// Feedback metric from the smoothed band powers. May be `inf` or `NaN`.
    pub metric: f64,
    /// Band powers of this cycle's epoch.
    pub band_powers: BandPowerVector,
    /// Mean over the band-power history.
    pub smoothed: BandPowerVector,
}
/// Session state for one stream: raw buffer, notch state and band-power history.
///
/// Each instance owns all of its state; run one per stream or per session.
#[derive(Debug)]
pub struct FeedbackPipeline {
    config: PipelineConfig,
    sample_rate_hz: f64,
    stream_channels: usize,
    raw: RingBuffer<f64>,
    notch: Option<NotchFilter>,
    filter_state: Option<FilterState>,
    extractor: EpochExtractor,
    spectral: SpectralBandPower,
    smoothing: SmoothingBuffer,
    estimator: MetricEstimator,
    cycles: u64,
}
impl FeedbackPipeline {
    pub fn new(
        config: PipelineConfig,
        sample_rate_hz: f64,
        stream_channels: usize,
    ) -> Result<Self, PipelineError> {
        config.validate(sample_rate_hz, stream_channels)?;
        let buffer_samples = config.buffer_samples(sample_rate_hz);
        let epoch_samples = config.epoch_samples(sample_rate_hz);
        let raw = RingBuffer::new(buffer_samples, config.channels.len())?;
        let notch = NotchFilter::from_config(&config.notch, sample_rate_hz)?;
        let extractor = EpochExtractor::new(epoch_samples, config.startup);
        let spectral = SpectralBandPower::new(
            sample_rate_hz,
            epoch_samples,
            &config.bands,
            config.aggregation,
        )?;
        let smoothing = SmoothingBuffer::new(config.history_len(), config.startup)?;
        let estimator = MetricEstimator::from(config.metric);
        info!(
            "feedback pipeline ready: fs={sample_rate_hz} Hz, buffer={buffer_samples}, \
             epoch={epoch_samples}, history={}, channels={:?}, metric={}/{}",
            smoothing.capacity(),
            config.channels,
            estimator.numerator(),
            estimator.denominator()
        );
        Ok(Self {
            config,
            sample_rate_hz,
            stream_channels,
            raw,
            notch,
            filter_state: None,
            extractor,
            spectral,
            smoothing,
            estimator,
            cycles: 0,
        })
    }
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }
    pub fn stream_channels(&self) -> usize {
        self.stream_channels
    }
    /// Completed cycles since the session started.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
    pub fn raw_buffer(&self) -> &RingBuffer<f64> {
        &self.raw
    }
    pub fn smoothing(&self) -> &SmoothingBuffer {
        &self.smoothing
    }
    pub fn spectral(&self) -> &SpectralBandPower {
        &self.spectral
    }
    /// Samples to request from the acquisition layer per cycle.
    pub fn chunk_samples(&self) -> usize {
        self.config.chunk_samples(self.sample_rate_hz)
    }
    /// Run one cycle on a batch, checking it matches the session's rate.
    pub fn process_batch(&mut self, batch: &SignalBatch) -> Result<CycleOutput, PipelineError> {
        batch.validate()?;
        if batch.sample_rate_hz != self.sample_rate_hz {
            return Err(PipelineError::SampleRateMismatch {
                expected: self.sample_rate_hz,
                actual: batch.sample_rate_hz,
            });
        }
        self.process_chunk(&batch.samples)
    }
    /// Run one cycle on `chunk` (stream channels x samples).
    ///
    /// The chunk is validated in full before any state changes, so a rejected chunk
    /// leaves the buffers and filter state as they were.
    pub fn process_chunk(&mut self, chunk: &[Vec<f64>]) -> Result<CycleOutput, PipelineError> {
        let selected = self.select_channels(chunk)?;
        let (filtered, filter_state) = match &self.notch {
            Some(notch) => notch.apply(selected.view(), self.filter_state.clone())?,
            None => (selected, None),
        };
        self.raw.append(filtered.view())?;
        if self.notch.is_some() {
            self.filter_state = filter_state;
        }
        let epoch = self.extractor.latest(&self.raw)?;
        let band_powers = self.spectral.compute(&epoch)?;
        self.smoothing.append(&band_powers)?;
        let smoothed = self.smoothing.mean()?;
        let metric = self.estimator.compute(&smoothed);
        self.cycles += 1;
        if metric.is_finite() {
            debug!(
                "cycle {}: samples={}, metric={metric:.4}, smoothed={:?}",
                self.cycles,
                filtered.nrows(),
                smoothed.as_slice()
            );
        } else {
            warn!(
                "cycle {}: non-finite metric {metric} ({} = {}, {} = {})",
                self.cycles,
                self.estimator.numerator(),
                smoothed[self.estimator.numerator()],
                self.estimator.denominator(),
                smoothed[self.estimator.denominator()]
            );
        }
        Ok(CycleOutput {
            metric,
            band_powers,
            smoothed,
        })
    }
    /// Back to session start: zeroed buffers, no filter state.
    pub fn reset(&mut self) {
        self.raw.reset();
        self.filter_state = None;
        self.smoothing.reset();
        self.cycles = 0;
    }
    fn select_channels(&self, chunk: &[Vec<f64>]) -> Result<Array2<f64>, PipelineError> {
        if chunk.len() != self.stream_channels {
            return Err(PipelineError::MalformedChunk(format!(
                "chunk has {} channels, stream has {}",
                chunk.len(),
                self.stream_channels
            )));
        }
        let samples = chunk.first().map(|c| c.len()).unwrap_or(0);
        if let Some(ragged) = chunk.iter().position(|c| c.len() != samples) {
            return Err(PipelineError::MalformedChunk(format!(
                "channel {ragged} has {} samples, channel 0 has {samples}",
                chunk[ragged].len()
            )));
        }
        if samples > self.raw.capacity() {
            return Err(PipelineError::ChunkExceedsCapacity {
                rows: samples,
                capacity: self.raw.capacity(),
            });
        }
        let selected = &self.config.channels;
        for &channel in selected {
            if let Some(i) = chunk[channel].iter().position(|v| !v.is_finite()) {
                return Err(PipelineError::MalformedChunk(format!(
                    "non-finite sample at channel {channel}, index {i}"
                )));
            }
        }
        Ok(Array2::from_shape_fn((samples, selected.len()), |(i, j)| {
            chunk[selected[j]][i]
        }))
    }
}
/// Pulls batches from a source and feeds them through a pipeline built lazily
/// from the first batch's rate and channel count.
pub struct FeedbackSession<S: SignalSource> {
    source: S,
    config: PipelineConfig,
    pipeline: Option<FeedbackPipeline>,
    next_sample: Option<u64>,
    dropped_samples: u64,
}
impl<S: SignalSource> FeedbackSession<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            pipeline: None,
            next_sample: None,
            dropped_samples: 0,
        }
    }
    /// One acquisition cycle; `Ok(None)` once the source is exhausted.
    pub fn pump_once(&mut self) -> Result<Option<CycleOutput>, PipelineError> {
        let Some(batch) = self.source.next_batch()? else {
            return Ok(None);
        };
        self.track_position(&batch);
        let pipeline = self.ensure_pipeline(&batch)?;
        pipeline.process_batch(&batch).map(Some)
    }
    /// Samples skipped by the source, judged from batch stream positions.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples
    }
    pub fn pipeline(&self) -> Option<&FeedbackPipeline> {
        self.pipeline.as_ref()
    }
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
    /// End the session and hand back the source.
    pub fn into_source(self) -> S {
        self.source
    }
    fn track_position(&mut self, batch: &SignalBatch) {
        let Some(first) = batch.first_sample else {
            return;
        };
        match self.next_sample {
            Some(expected) if first > expected => {
                self.dropped_samples += first - expected;
                warn!("stream gap: expected sample {expected}, got {first}");
            }
            Some(expected) if first < expected => {
                warn!("stream rewound: expected sample {expected}, got {first}");
            }
            _ => {}
        }
        self.next_sample = Some(first + batch.samples_per_channel() as u64);
    }
    fn ensure_pipeline(
        &mut self,
        batch: &SignalBatch,
    ) -> Result<&mut FeedbackPipeline, PipelineError> {
        if self.pipeline.is_none() {
            batch.validate()?;
            self.pipeline = Some(FeedbackPipeline::new(
                self.config.clone(),
                batch.sample_rate_hz,
                batch.num_channels(),
            )?);
        }
        self.pipeline
            .as_mut()
            .ok_or_else(|| PipelineError::Configuration("pipeline was not initialised".into()))
    }
}
