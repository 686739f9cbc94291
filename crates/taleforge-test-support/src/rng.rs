//! Test RNGs: deterministic `DeterministicRng` implementations.

use taleforge_core::rng::DeterministicRng;

/// Always rolls the minimum. Suitable for tests that ignore dice values.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// Replays a fixed list of rolls, e.g. to pin the initiative order.
///
/// Panics once the sequence is exhausted, which flags tests that roll more
/// often than they expect.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given rolls.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }

    /// Rolls not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.index)
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
        let value = self.values[self.index];
        self.index += 1;
        value
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}
