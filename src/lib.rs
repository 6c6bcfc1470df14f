//! Streaming EEG band-power pipeline producing a neurofeedback metric.
//!
//! Raw chunks pass through a notch filter into a ring buffer; the newest epoch is
//! windowed and transformed into delta/theta/alpha/beta powers, which are averaged
//! over recent epochs and turned into a band ratio.
pub mod dsp;
pub mod types;
pub use dsp::{CycleOutput, FeedbackPipeline, FeedbackSession, PipelineConfig, PipelineError};
pub use types::{Band, BandPowerVector};
