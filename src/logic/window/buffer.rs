//! Sliding Window - bounded FIFO buffer
//!
//! Oldest value is evicted when the window is full. Overflow is not an error.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    values: VecDeque<T>,
    capacity: usize,
    total_pushed: u64,
}

impl<T: Clone> SlidingWindow<T> {
    /// `capacity` is clamped to at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            total_pushed: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.total_pushed += 1;
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn status(&self) -> WindowStatus {
        WindowStatus {
            current_size: self.values.len(),
            capacity: self.capacity,
            total_recorded: self.total_pushed,
            fill_percent: self.values.len() as f32 / self.capacity as f32 * 100.0,
        }
    }
}

/// Window status information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub current_size: usize,
    pub capacity: usize,
    pub total_recorded: u64,
    pub fill_percent: f32,
}
