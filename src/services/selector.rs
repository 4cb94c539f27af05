use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Entry ordered by score; among equal scores the earlier insertion ranks higher
struct Ranked<T> {
    score: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Fixed-capacity "keep the best N" selector backed by a min-heap
///
/// Once full, a new item replaces the current minimum only when it scores
/// strictly higher.
pub struct BestOf<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked<T>>>,
    next_seq: u64,
}

impl<T> BestOf<T> {
    /// Creates an empty selector; a capacity of zero retains nothing
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
            next_seq: 0,
        }
    }

    /// Offers an item; returns whether it was retained
    ///
    /// Below capacity every item is kept. At capacity the item evicts the
    /// current minimum only if it scores strictly higher, so among equal
    /// scores the earliest offered items survive. O(log n) per call.
    pub fn push(&mut self, score: f64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let entry = Ranked {
            score,
            seq: self.next_seq,
            item,
        };
        self.next_seq += 1;

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut worst) if score > worst.0.score => {
                *worst = Reverse(entry);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Score of the worst retained item
    pub fn min_score(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.0.score)
    }

    /// Retained items in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.heap.iter().map(|entry| &entry.0.item)
    }

    /// Consumes the selector, returning items best first
    pub fn into_sorted_vec(self) -> Vec<T> {
        // ascending over Reverse is descending by score
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| entry.0.item)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_best_n() {
        let mut best = BestOf::new(3);
        for (score, name) in [(0.5, "a"), (0.9, "b"), (0.1, "c"), (0.7, "d"), (0.6, "e")] {
            best.push(score, name);
        }

        assert_eq!(best.len(), 3);
        assert_eq!(best.min_score(), Some(0.6));
        assert_eq!(best.into_sorted_vec(), vec!["b", "d", "e"]);
    }

    #[test]
    fn test_ties_do_not_replace_minimum() {
        let mut best = BestOf::new(2);
        assert!(best.push(0.5, "first"));
        assert!(best.push(0.5, "second"));
        assert!(!best.push(0.5, "third"));
        assert_eq!(best.into_sorted_vec(), vec!["first", "second"]);
    }

    #[test]
    fn test_iter_visits_every_retained_item() {
        let mut best = BestOf::new(2);
        for (score, name) in [(0.3, "a"), (0.8, "b"), (0.5, "c")] {
            best.push(score, name);
        }
        let mut seen: Vec<&str> = best.iter().copied().collect();
        seen.sort();
        assert_eq!(seen, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut best = BestOf::new(0);
        assert!(!best.push(1.0, "x"));
        assert!(best.is_empty());
        assert_eq!(best.min_score(), None);
    }
}
