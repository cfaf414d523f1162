//! Fixed-capacity uniform sample over a stream of unknown length.

use rand::Rng;
use rand::seq::SliceRandom;

/// Upper bound on eagerly reserved slots; large per-file bounds grow lazily.
const MAX_PREALLOCATED: usize = 1024;

/// Reservoir holding a uniform random sample of the values offered so far.
///
/// After `seen` offers, `items` is a uniformly chosen subset of size
/// `min(seen, capacity)`. The only exception is a merge from a smaller
/// reservoir, see [`Reservoir::merge_from_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservoir {
    capacity: usize,
    items: Vec<String>,
    seen: u64,
}

impl Reservoir {
    /// Create an empty reservoir. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: Vec::with_capacity(capacity.min(MAX_PREALLOCATED)),
            seen: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values this reservoir represents, including replayed merges.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<String> {
        self.items
    }

    /// Offer one value using the thread-local generator.
    pub fn observe(&mut self, value: impl Into<String>) {
        self.observe_with(value, &mut rand::rng());
    }

    /// Offer one value (Algorithm R).
    ///
    /// The `seen`-th value replaces a random slot with probability
    /// `capacity / seen`, keeping every offered value equally likely to be held.
    pub fn observe_with<R: Rng + ?Sized>(&mut self, value: impl Into<String>, rng: &mut R) {
        self.seen += 1;
        if self.items.len() < self.capacity {
            self.items.push(value.into());
            return;
        }
        let slot = rng.random_range(0..self.seen);
        if let Ok(slot) = usize::try_from(slot)
            && slot < self.capacity
        {
            self.items[slot] = value.into();
        }
    }

    /// Fold `other` into this reservoir using the thread-local generator.
    pub fn merge_from(&mut self, other: Reservoir) {
        self.merge_from_with(other, &mut rand::rng());
    }

    /// Fold `other` into this reservoir, weighting it by `other.seen`.
    ///
    /// The merged sample is drawn without replacement from the union of both
    /// populations: each slot comes from `self` with probability
    /// `remaining_self / (remaining_self + remaining_other)`, taking held items
    /// in random order. The result is distributed exactly like a reservoir fed
    /// both streams directly, provided `other` holds at least its share of the
    /// draw. When `other` runs out early (its capacity is smaller than ours)
    /// the remaining slots fall back to `self`, and if both run dry the merged
    /// reservoir holds fewer than `min(seen, capacity)` items.
    pub fn merge_from_with<R: Rng + ?Sized>(&mut self, other: Reservoir, rng: &mut R) {
        if other.seen == 0 {
            return;
        }
        let mut ours = std::mem::take(&mut self.items);
        let mut theirs = other.items;
        ours.shuffle(rng);
        theirs.shuffle(rng);
        let mut ours = ours.into_iter();
        let mut theirs = theirs.into_iter();

        let mut remaining_ours = self.seen;
        let mut remaining_theirs = other.seen;
        let total = self.seen + other.seen;
        let target = usize::try_from(total).map_or(self.capacity, |total| total.min(self.capacity));
        let mut merged = Vec::with_capacity(target.min(MAX_PREALLOCATED));

        while merged.len() < target {
            let take_ours = match (remaining_ours, remaining_theirs) {
                (0, 0) => break,
                (_, 0) => true,
                (0, _) => false,
                (ours_left, theirs_left) => rng.random_range(0..ours_left + theirs_left) < ours_left,
            };
            let next = if take_ours {
                remaining_ours -= 1;
                ours.next()
            } else {
                remaining_theirs -= 1;
                theirs.next()
            };
            match next {
                Some(value) => merged.push(value),
                None if take_ours => remaining_ours = 0,
                None => remaining_theirs = 0,
            }
        }

        self.items = merged;
        self.seen = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TRIALS: usize = 20_000;
    const TOLERANCE: f64 = 0.02;

    fn inclusion_rates(counts: &[usize]) -> Vec<f64> {
        counts
            .iter()
            .map(|count| *count as f64 / TRIALS as f64)
            .collect()
    }

    fn tally(counts: &mut [usize], items: &[String]) {
        for item in items {
            let index: usize = item.parse().unwrap();
            counts[index] += 1;
        }
    }

    #[test]
    fn fills_before_replacing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut reservoir = Reservoir::new(3);
        reservoir.observe_with("a", &mut rng);
        reservoir.observe_with("b", &mut rng);
        assert_eq!(reservoir.items(), ["a", "b"]);
        for value in ["c", "d", "e", "f"] {
            reservoir.observe_with(value, &mut rng);
        }
        assert_eq!(reservoir.len(), 3);
        assert_eq!(reservoir.seen(), 6);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut reservoir = Reservoir::new(0);
        reservoir.observe("only");
        assert_eq!(reservoir.capacity(), 1);
        assert_eq!(reservoir.items(), ["only"]);
    }

    #[test]
    fn every_value_is_kept_with_probability_capacity_over_n() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 10;
        let capacity = 3;
        let mut counts = vec![0usize; n];
        for _ in 0..TRIALS {
            let mut reservoir = Reservoir::new(capacity);
            for value in 0..n {
                reservoir.observe_with(value.to_string(), &mut rng);
            }
            assert_eq!(reservoir.len(), capacity);
            tally(&mut counts, reservoir.items());
        }
        let expected = capacity as f64 / n as f64;
        for rate in inclusion_rates(&counts) {
            assert!((rate - expected).abs() < TOLERANCE, "rate {rate} vs {expected}");
        }
    }

    #[test]
    fn merged_sub_streams_match_direct_sampling() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 12;
        let capacity = 4;
        let mut counts = vec![0usize; n];
        for _ in 0..TRIALS {
            let mut left = Reservoir::new(capacity);
            let mut right = Reservoir::new(capacity);
            for value in 0..5 {
                left.observe_with(value.to_string(), &mut rng);
            }
            for value in 5..n {
                right.observe_with(value.to_string(), &mut rng);
            }
            left.merge_from_with(right, &mut rng);
            assert_eq!(left.seen(), n as u64);
            assert_eq!(left.len(), capacity);
            tally(&mut counts, left.items());
        }
        let expected = capacity as f64 / n as f64;
        for rate in inclusion_rates(&counts) {
            assert!((rate - expected).abs() < TOLERANCE, "rate {rate} vs {expected}");
        }
    }

    #[test]
    fn merge_order_does_not_favour_later_reservoirs() {
        let mut rng = StdRng::seed_from_u64(3);
        let trials = 4_000;
        let mut late_hits = 0;
        for _ in 0..trials {
            let mut global = Reservoir::new(1);
            let mut big = Reservoir::new(1);
            for value in 0..999 {
                big.observe_with(value.to_string(), &mut rng);
            }
            let mut small = Reservoir::new(1);
            small.observe_with("999", &mut rng);
            global.merge_from_with(big, &mut rng);
            global.merge_from_with(small, &mut rng);
            assert_eq!(global.seen(), 1000);
            if global.items() == ["999"] {
                late_hits += 1;
            }
        }
        // Expected about 4.
        assert!(late_hits < 16, "late reservoir won {late_hits} times");
    }

    #[test]
    fn merge_into_empty_keeps_other_items_and_count() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut other = Reservoir::new(3);
        for value in 0..100 {
            other.observe_with(value.to_string(), &mut rng);
        }
        let held: Vec<String> = other.items().to_vec();
        let mut global = Reservoir::new(6);
        global.merge_from_with(other, &mut rng);
        assert_eq!(global.seen(), 100);
        assert_eq!(global.len(), 3);
        for item in global.items() {
            assert!(held.contains(item));
        }
    }

    #[test]
    fn merging_an_empty_reservoir_is_a_no_op() {
        let mut global = Reservoir::new(2);
        global.observe("a");
        let before = global.clone();
        global.merge_from(Reservoir::new(5));
        assert_eq!(global, before);
    }
}
