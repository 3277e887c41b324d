//! Time-domain tap on the engine output, for oscilloscope-style readers.

/// Fixed-capacity history of the most recent output samples.
pub struct ScopeTap {
    buffer: Vec<f32>,
    head: usize,
    filled: usize,
}

impl ScopeTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            head: 0,
            filled: 0,
        }
    }

    pub fn push_block(&mut self, block: &[f32]) {
        let capacity = self.buffer.len();
        for &sample in block {
            self.buffer[self.head] = sample;
            self.head = (self.head + 1) % capacity;
        }
        self.filled = (self.filled + block.len()).min(capacity);
    }

    /// Copy up to `out.len()` of the newest samples, oldest first.
    pub fn read(&self, out: &mut [f32]) -> usize {
        let capacity = self.buffer.len();
        let count = out.len().min(self.filled);
        let start = (self.head + capacity - count) % capacity;
        for (i, slot) in out.iter_mut().take(count).enumerate() {
            *slot = self.buffer[(start + i) % capacity];
        }
        count
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.head = 0;
        self.filled = 0;
    }
}
