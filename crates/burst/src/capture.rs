/// A fixed-capacity buffer that fills front to back and reports how much of
/// an input slice it consumed. Used to collect burst samples across window
/// boundaries without copying more than once.
pub struct CaptureBuffer<T> {
    data: Vec<T>,
    length: usize,
}

impl<T: Default + Copy> CaptureBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity],
            length: 0,
        }
    }

    /// Empties the buffer. Capacity is retained.
    pub fn reset(&mut self) {
        self.length = 0;
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_full(&self) -> bool {
        self.length == self.capacity()
    }

    /// Copies from `buf` until the capacity is reached.
    /// Returns the number of elements consumed.
    pub fn consume(&mut self, buf: &[T]) -> usize {
        let remain = self.capacity() - self.length;
        let total_read = buf.len().min(remain);
        self.data[self.length..self.length + total_read].copy_from_slice(&buf[..total_read]);
        self.length += total_read;
        total_read
    }

    /// The collected prefix of the buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.length]
    }
}
