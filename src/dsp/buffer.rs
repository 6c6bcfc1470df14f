use ndarray::{s, Array2, ArrayView2, Axis};
use crate::dsp::PipelineError;
/// Fixed-capacity FIFO of `capacity` rows x `dim` columns.
///
/// Rows are stored circularly; `head` is the physical slot of the oldest row,
/// which is also where the next appended row lands. The buffer starts zero-filled
/// at full length, and `filled` tracks how many rows have actually been appended.
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    data: Array2<T>,
    head: usize,
    filled: usize,
}
impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize, dim: usize) -> Result<Self, PipelineError> {
        if capacity == 0 || dim == 0 {
            return Err(PipelineError::Configuration(format!(
                "ring buffer needs non-zero capacity and dim, got {capacity}x{dim}"
            )));
        }
        Ok(Self {
            data: Array2::from_elem((capacity, dim), T::default()),
            head: 0,
            filled: 0,
        })
    }
    pub fn capacity(&self) -> usize {
        self.data.nrows()
    }
    pub fn dim(&self) -> usize {
        self.data.ncols()
    }
    /// Rows appended since creation (or the last reset), saturating at capacity.
    pub fn filled(&self) -> usize {
        self.filled
    }
    pub fn is_full(&self) -> bool {
        self.filled == self.capacity()
    }
    /// Shift in `rows` (samples x dim), discarding the same number of oldest rows.
    /// Nothing is written unless the whole chunk fits.
    pub fn append(&mut self, rows: ArrayView2<'_, T>) -> Result<(), PipelineError> {
        if rows.ncols() != self.dim() {
            return Err(PipelineError::ChannelMismatch {
                expected: self.dim(),
                actual: rows.ncols(),
            });
        }
        if rows.nrows() > self.capacity() {
            return Err(PipelineError::ChunkExceedsCapacity {
                rows: rows.nrows(),
                capacity: self.capacity(),
            });
        }
        for row in rows.axis_iter(Axis(0)) {
            self.data.row_mut(self.head).assign(&row);
            self.advance();
        }
        Ok(())
    }
    pub fn push_row(&mut self, row: &[T]) -> Result<(), PipelineError> {
        if row.len() != self.dim() {
            return Err(PipelineError::ChannelMismatch {
                expected: self.dim(),
                actual: row.len(),
            });
        }
        for (slot, value) in self.data.row_mut(self.head).iter_mut().zip(row) {
            *slot = *value;
        }
        self.advance();
        Ok(())
    }
    /// Owned copy of the newest `n` rows, oldest first.
    pub fn latest(&self, n: usize) -> Result<Array2<T>, PipelineError> {
        let capacity = self.capacity();
        if n > capacity {
            return Err(PipelineError::InsufficientData {
                requested: n,
                available: capacity,
            });
        }
        let start = (self.head + capacity - n) % capacity;
        let mut out = Array2::from_elem((n, self.dim()), T::default());
        if start + n <= capacity {
            out.assign(&self.data.slice(s![start..start + n, ..]));
        } else {
            let first = capacity - start;
            out.slice_mut(s![..first, ..])
                .assign(&self.data.slice(s![start.., ..]));
            out.slice_mut(s![first.., ..])
                .assign(&self.data.slice(s![..n - first, ..]));
        }
        Ok(out)
    }
    /// Whole buffer in arrival order.
    pub fn to_array(&self) -> Array2<T> {
        let capacity = self.capacity();
        let mut out = Array2::from_elem((capacity, self.dim()), T::default());
        out.slice_mut(s![..capacity - self.head, ..])
            .assign(&self.data.slice(s![self.head.., ..]));
        out.slice_mut(s![capacity - self.head.., ..])
            .assign(&self.data.slice(s![..self.head, ..]));
        out
    }
    pub fn reset(&mut self) {
        self.data.fill(T::default());
        self.head = 0;
        self.filled = 0;
    }
    fn advance(&mut self) {
        self.head = (self.head + 1) % self.capacity();
        self.filled = (self.filled + 1).min(self.capacity());
    }
}
