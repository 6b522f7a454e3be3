use common::storage::types::course::Course;

/// Groups extracted records into publish batches.
///
/// Owned by the single task that consumes the coordinator's result stream,
/// so `add` is never raced. Batch order is arrival order; document
/// completion order is already unordered upstream.
#[derive(Debug)]
pub struct BatchAccumulator {
    batch_size: usize,
    pending: Vec<Course>,
}

impl BatchAccumulator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            pending: Vec::with_capacity(batch_size),
        }
    }

    /// Append a record; returns a full batch exactly when the threshold is
    /// reached.
    pub fn add(&mut self, course: Course) -> Option<Vec<Course>> {
        self.pending.push(course);
        if self.pending.len() >= self.batch_size {
            let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size));
            return Some(batch);
        }
        None
    }

    /// Flush the below-threshold remainder at end-of-run. `None` when
    /// nothing is pending; no record is ever dropped for batch size.
    pub fn drain(&mut self) -> Option<Vec<Course>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
