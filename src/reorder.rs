use std::collections::HashMap;

use crate::frame::{outcome_index, FrameIndex, FrameOutcome};

/// Bounded reassembly of out-of-order worker completions.
///
/// Workers finish tasks in whatever order the OS schedules them; the
/// consumer needs them strictly by index. Entries are keyed by index and a
/// single cursor advances one step per release, the same pattern used for
/// network packet reordering. Failed frames travel through the buffer as
/// `Err` entries so every frame before a failure is still released in
/// position, never silently skipped.
///
/// The buffer never grows past the number of tasks the scheduler allows in
/// flight at once; that bound is enforced by the scheduler, not here.
#[derive(Debug, Default)]
pub struct ReorderBuffer {
    pending: HashMap<u64, FrameOutcome>,
    next_expected: u64,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a completed (or failed) frame under its index. Indices are
    /// assigned once at dispatch, so a duplicate insert is a scheduler bug.
    pub fn insert(&mut self, outcome: FrameOutcome) {
        let index = outcome_index(&outcome).0;
        debug_assert!(index >= self.next_expected, "insert below release cursor");
        let prev = self.pending.insert(index, outcome);
        debug_assert!(prev.is_none(), "duplicate frame index {index}");
    }

    /// Release the frame at the cursor if it has arrived, advancing the
    /// cursor. `None` means the consumer must wait for more completions.
    pub fn take(&mut self) -> Option<FrameOutcome> {
        let outcome = self.pending.remove(&self.next_expected)?;
        self.next_expected += 1;
        Some(outcome)
    }

    pub fn next_expected(&self) -> FrameIndex {
        FrameIndex(self.next_expected)
    }

    /// Completed-but-unreleased frames currently held.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CompletedFrame, FrameError};
    use rand::seq::SliceRandom;
    use rand::{rngs::StdRng, SeedableRng};

    fn ok(index: u64) -> FrameOutcome {
        Ok(CompletedFrame {
            index: FrameIndex(index),
            payload: vec![index as u8],
        })
    }

    fn failed(index: u64) -> FrameOutcome {
        Err(FrameError {
            index: FrameIndex(index),
            message: "boom".into(),
        })
    }

    #[test]
    fn releases_in_index_order_for_any_arrival_order() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let mut arrivals: Vec<u64> = (0..20).collect();
            arrivals.shuffle(&mut rng);

            let mut buf = ReorderBuffer::new();
            let mut released = Vec::new();
            for index in arrivals {
                buf.insert(ok(index));
                while let Some(outcome) = buf.take() {
                    released.push(outcome.unwrap().index.0);
                }
            }
            assert_eq!(released, (0..20).collect::<Vec<_>>());
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn blocks_on_gaps() {
        let mut buf = ReorderBuffer::new();
        buf.insert(ok(1));
        buf.insert(ok(2));
        assert!(buf.take().is_none());
        assert_eq!(buf.len(), 2);

        buf.insert(ok(0));
        assert_eq!(buf.take().unwrap().unwrap().index, FrameIndex(0));
        assert_eq!(buf.take().unwrap().unwrap().index, FrameIndex(1));
        assert_eq!(buf.take().unwrap().unwrap().index, FrameIndex(2));
        assert!(buf.take().is_none());
    }

    #[test]
    fn never_releases_twice() {
        let mut buf = ReorderBuffer::new();
        buf.insert(ok(0));
        assert!(buf.take().is_some());
        assert!(buf.take().is_none());
        assert_eq!(buf.next_expected(), FrameIndex(1));
    }

    #[test]
    fn failures_are_released_in_position() {
        let mut buf = ReorderBuffer::new();
        buf.insert(failed(1));
        buf.insert(ok(0));
        buf.insert(ok(2));

        assert!(buf.take().unwrap().is_ok());
        let failure = buf.take().unwrap();
        assert_eq!(failure.unwrap_err().index, FrameIndex(1));
        assert!(buf.take().unwrap().is_ok());
    }
}
