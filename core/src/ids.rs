//! Per-session handle ids

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Issues sequential ids for track handles.
///
/// Clones share the same sequence; a fresh allocator starts over at 0, so
/// each session can own its own sequence.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: Arc<AtomicI64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_shared_between_clones() {
        let ids = IdAllocator::new();
        let clone = ids.clone();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(clone.next_id(), 1);
        assert_eq!(ids.next_id(), 2);

        assert_eq!(IdAllocator::new().next_id(), 0, "sessions do not share ids");
    }
}
