use ndarray::Axis;
use crate::dsp::buffer::RingBuffer;
use crate::dsp::config::StartupPolicy;
use crate::dsp::PipelineError;
use crate::types::{Band, BandPowerVector};
/// Recent band-power vectors, averaged to steady the metric.
///
/// With `StartupPolicy::ZeroPadded` the average always spans the full history,
/// zero-initialised slots included, so the first outputs lean toward zero until
/// the history has been filled once.
#[derive(Clone, Debug)]
pub struct SmoothingBuffer {
    history: RingBuffer<f64>,
    startup: StartupPolicy,
}
impl SmoothingBuffer {
    pub fn new(capacity: usize, startup: StartupPolicy) -> Result<Self, PipelineError> {
        Ok(Self {
            history: RingBuffer::new(capacity, Band::COUNT)?,
            startup,
        })
    }
    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }
    pub fn filled(&self) -> usize {
        self.history.filled()
    }
    pub fn append(&mut self, powers: &BandPowerVector) -> Result<(), PipelineError> {
        self.history.push_row(powers.as_slice())
    }
    /// Elementwise mean over the held vectors.
    pub fn mean(&self) -> Result<BandPowerVector, PipelineError> {
        let rows = match self.startup {
            StartupPolicy::ZeroPadded => self.capacity(),
            StartupPolicy::WaitForFill => self.filled(),
        };
        if rows == 0 {
            return Ok(BandPowerVector::zeros());
        }
        let sums = self.history.latest(rows)?.sum_axis(Axis(0));
        let mut mean = BandPowerVector::zeros();
        for band in Band::ALL {
            mean[band] = sums[band.index()] / rows as f64;
        }
        Ok(mean)
    }
    pub fn reset(&mut self) {
        self.history.reset();
    }
}
