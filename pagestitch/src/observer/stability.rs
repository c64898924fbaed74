//! Stabilization tracking for tile discovery.

/// Outcome of recording one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The count grew since the previous poll.
    Progressed { count: usize },
    /// The count did not change; `stable_polls` consecutive polls so far.
    Unchanged { stable_polls: u32 },
    /// The count has been unchanged for `threshold` consecutive polls.
    Stable { count: usize },
}

/// Counts consecutive polls without a new tile.
///
/// Growth resets the counter; once it reaches the threshold discovery is
/// considered complete.
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    threshold: u32,
    last_count: usize,
    unchanged: u32,
}

impl StabilityTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            last_count: 0,
            unchanged: 0,
        }
    }

    /// Records the tile count observed by one poll.
    pub fn record(&mut self, count: usize) -> PollOutcome {
        if count > self.last_count {
            self.last_count = count;
            self.unchanged = 0;
            return PollOutcome::Progressed { count };
        }

        self.unchanged += 1;
        if self.unchanged >= self.threshold {
            PollOutcome::Stable {
                count: self.last_count,
            }
        } else {
            PollOutcome::Unchanged {
                stable_polls: self.unchanged,
            }
        }
    }

    pub fn last_count(&self) -> usize {
        self.last_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_stops_on_third_repeat() {
        let mut tracker = StabilityTracker::new(3);
        let outcomes: Vec<_> = [0, 3, 6, 6, 6, 6]
            .iter()
            .map(|&c| tracker.record(c))
            .collect();

        assert_eq!(outcomes[0], PollOutcome::Unchanged { stable_polls: 1 });
        assert_eq!(outcomes[1], PollOutcome::Progressed { count: 3 });
        assert_eq!(outcomes[2], PollOutcome::Progressed { count: 6 });
        assert_eq!(outcomes[3], PollOutcome::Unchanged { stable_polls: 1 });
        assert_eq!(outcomes[4], PollOutcome::Unchanged { stable_polls: 2 });
        assert_eq!(outcomes[5], PollOutcome::Stable { count: 6 });
    }

    #[test]
    fn test_growth_resets_counter() {
        let mut tracker = StabilityTracker::new(3);
        tracker.record(4);
        tracker.record(4);
        tracker.record(4);
        assert_eq!(tracker.record(5), PollOutcome::Progressed { count: 5 });
        assert_eq!(tracker.record(5), PollOutcome::Unchanged { stable_polls: 1 });
    }

    #[test]
    fn test_empty_view_stabilizes_at_zero() {
        let mut tracker = StabilityTracker::new(2);
        tracker.record(0);
        assert_eq!(tracker.record(0), PollOutcome::Stable { count: 0 });
    }
}
