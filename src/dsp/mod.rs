// src/dsp/mod.rs
pub mod buffer;
pub mod config;
pub mod epoch;
pub mod error;
pub mod fft;
pub mod metric;
pub mod notch;
pub mod pipeline;
pub mod smoothing;
pub mod source;
// 公开导出，方便外部调用
pub use buffer::RingBuffer;
pub use config::{
    BandAggregation, BandRanges, FrequencyRange, MetricConfig, NotchConfig, PipelineConfig,
    StartupPolicy,
};
pub use epoch::{Epoch, EpochExtractor};
pub use error::PipelineError;
pub use fft::{hamming_window, SpectralBandPower};
pub use metric::MetricEstimator;
pub use notch::{FilterState, NotchFilter};
pub use pipeline::{CycleOutput, FeedbackPipeline, FeedbackSession};
pub use smoothing::SmoothingBuffer;
pub use source::{ManualSource, Rhythm, SignalBatch, SignalSource, SimulatedSource};
