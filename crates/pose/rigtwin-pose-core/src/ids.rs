//! Identifiers and a simple allocator for scheduled work.

use serde::{Deserialize, Serialize};

/// Handle of one scheduled interpolation in the active set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u32);

/// Handle of one chained multi-snapshot playback.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub u32);

/// Monotonic allocator for TaskId and SequenceId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_task: u32,
    next_sequence: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_task(&mut self) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task = self.next_task.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_sequence(&mut self) -> SequenceId {
        let id = SequenceId(self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_task(), TaskId(0));
        assert_eq!(alloc.alloc_task(), TaskId(1));
        assert_eq!(alloc.alloc_sequence(), SequenceId(0));
        assert_eq!(alloc.alloc_sequence(), SequenceId(1));
    }
}
