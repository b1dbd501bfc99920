use std::collections::VecDeque;

/// Bounded FIFO of the most recent raw values for one observation key.
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl ObservationWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        self.evict();
    }

    /// Changes the capacity, dropping the oldest values if it shrinks.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict();
    }

    fn evict(&mut self) {
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn values(&self) -> &VecDeque<f64> {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self::new(1)
    }
}
