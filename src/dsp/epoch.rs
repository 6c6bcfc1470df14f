use ndarray::Array2;
use crate::dsp::buffer::RingBuffer;
use crate::dsp::config::StartupPolicy;
use crate::dsp::PipelineError;
/// Newest samples of the raw buffer, samples x channels. Owned, so it outlives later appends.
pub type Epoch = Array2<f64>;
/// Slices the analysis window off the tail of the raw buffer.
#[derive(Clone, Copy, Debug)]
pub struct EpochExtractor {
    epoch_samples: usize,
    startup: StartupPolicy,
}
impl EpochExtractor {
    pub fn new(epoch_samples: usize, startup: StartupPolicy) -> Self {
        Self {
            epoch_samples,
            startup,
        }
    }
    pub fn epoch_samples(&self) -> usize {
        self.epoch_samples
    }
    pub fn latest(&self, buffer: &RingBuffer<f64>) -> Result<Epoch, PipelineError> {
        if self.epoch_samples > buffer.capacity() {
            return Err(PipelineError::InsufficientData {
                requested: self.epoch_samples,
                available: buffer.capacity(),
            });
        }
        if self.startup == StartupPolicy::WaitForFill && buffer.filled() < self.epoch_samples {
            return Err(PipelineError::InsufficientData {
                requested: self.epoch_samples,
                available: buffer.filled(),
            });
        }
        buffer.latest(self.epoch_samples)
    }
}
