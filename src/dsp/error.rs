use thiserror::Error;
use crate::types::Band;
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("sample rate mismatch: expected {expected}, got {actual}")]
    SampleRateMismatch { expected: f64, actual: f64 },
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("frequency bands {lower} and {upper} overlap")]
    BandOverlap { lower: Band, upper: Band },
    #[error("gap between frequency bands {lower} and {upper}")]
    BandGap { lower: Band, upper: Band },
    #[error("band {0} contains no frequency bins at this resolution")]
    EmptyBand(Band),
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("malformed chunk: {0}")]
    MalformedChunk(String),
    #[error("chunk exceeds buffer capacity: {rows} rows, capacity {capacity}")]
    ChunkExceedsCapacity { rows: usize, capacity: usize },
    #[error("insufficient data: requested {requested} samples, {available} available")]
    InsufficientData { requested: usize, available: usize },
    #[error("epoch too short: window needs {required} samples, got {actual}")]
    EpochTooShort { required: usize, actual: usize },
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
impl PipelineError {
    /// True for errors raised while building a pipeline rather than while running a cycle.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidSampleRate
                | PipelineError::Configuration(_)
                | PipelineError::BandOverlap { .. }
                | PipelineError::BandGap { .. }
                | PipelineError::EmptyBand(_)
                | PipelineError::Io(_)
                | PipelineError::Json(_)
        )
    }
}
