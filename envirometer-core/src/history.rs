//! Fixed-Capacity Circular Buffer for Sensor History
//!
//! ## Overview
//!
//! Both engines in this crate keep a short sliding window of recent data:
//! the compensation engine retains the last N CPU-temperature samples, and
//! the trend estimator retains the last N published values per metric.
//! `History` is the shared ring buffer behind both.
//!
//! ## Design
//!
//! The buffer overwrites its oldest entry when full rather than failing the
//! push. For a sensor window that is always the right call: the most recent
//! data is the valuable data.
//!
//! Capacity is chosen at construction time, not compile time, because every
//! window size here comes from runtime configuration (`--cpu-history`,
//! `--lookback`/`--delay`). The backing store is `Vec<Option<T>>`: slots
//! start as `None` and are filled exactly once, after which the write
//! cursor wraps.
//!
//! ```text
//! History with capacity 5, after 7 pushes of A..G:
//!
//! Physical slots:  [F, G, C, D, E]   write_pos = 2
//! Logical order:   [C, D, E, F, G]   oldest → newest
//!
//! logical[i] maps to physical[(write_pos + i) % capacity] once full.
//! ```
//!
//! ## Invariants
//!
//! - `write_pos < capacity`
//! - `len <= capacity`
//! - `iter()` yields items in chronological (push) order
//!
//! Not thread safe; each instance is owned by exactly one logical thread
//! of control (see the concurrency notes in the crate docs).

/// Circular buffer holding the most recent `capacity` items pushed.
///
/// ## Example
///
/// ```
/// use envirometer_core::history::History;
///
/// let mut window: History<f64> = History::new(3);
/// for v in [1.0, 2.0, 3.0, 4.0] {
///     window.push(v);
/// }
/// // Oldest entry (1.0) was evicted.
/// let retained: Vec<f64> = window.iter().copied().collect();
/// assert_eq!(retained, vec![2.0, 3.0, 4.0]);
/// ```
#[derive(Debug, Clone)]
pub struct History<T: Copy> {
    /// Slot storage; `None` only until the slot's first write.
    data: Vec<Option<T>>,
    /// Index of the next write, wraps at `capacity`.
    write_pos: usize,
    /// Number of valid items, saturates at `capacity`.
    len: usize,
}

impl<T: Copy> History<T> {
    /// Create an empty buffer retaining at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Callers validate window sizes at
    /// configuration time, before any engine is constructed.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be at least 1");
        Self {
            data: vec![None; capacity],
            write_pos: 0,
            len: 0,
        }
    }

    /// Append an item, evicting the oldest when full.
    pub fn push(&mut self, item: T) {
        self.data[self.write_pos] = Some(item);
        self.write_pos = (self.write_pos + 1) % self.data.len();
        if self.len < self.data.len() {
            self.len += 1;
        }
    }

    /// Number of retained items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the buffer has started evicting on push.
    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Maximum number of retained items.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The least recent retained item.
    pub fn oldest(&self) -> Option<T> {
        self.get(0)
    }

    /// The most recent retained item.
    pub fn newest(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.get(self.len - 1)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(move |i| {
            self.data[self.physical_index(i)].as_ref()
        })
    }

    /// Drop all retained items, keeping the capacity.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Item by logical index (0 = oldest).
    fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        self.data[self.physical_index(index)]
    }

    /// Translate a logical index to a physical slot.
    ///
    /// Before the first wraparound the mapping is the identity; once full,
    /// the oldest item sits at `write_pos`.
    fn physical_index(&self, logical: usize) -> usize {
        if self.len < self.data.len() {
            logical
        } else {
            (self.write_pos + logical) % self.data.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let history: History<f64> = History::new(5);
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
        assert_eq!(history.capacity(), 5);
        assert!(history.oldest().is_none());
        assert!(history.newest().is_none());
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn zero_capacity_rejected() {
        let _: History<f64> = History::new(0);
    }

    #[test]
    fn push_and_retrieve() {
        let mut history = History::new(5);
        history.push(25.0);
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
        assert_eq!(history.oldest(), Some(25.0));
        assert_eq!(history.newest(), Some(25.0));
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut history = History::new(3);
        for i in 1..=4 {
            history.push(i);
        }
        assert_eq!(history.len(), 3);
        assert!(history.is_full());
        let retained: Vec<i32> = history.iter().copied().collect();
        assert_eq!(retained, vec![2, 3, 4]);
    }

    #[test]
    fn capacity_plus_one_pushes() {
        let cap = 10;
        let mut history = History::new(cap);
        for i in 1..=(cap as i64 + 1) {
            history.push(i);
        }
        let retained: Vec<i64> = history.iter().copied().collect();
        let expected: Vec<i64> = (2..=cap as i64 + 1).collect();
        assert_eq!(retained, expected);
    }

    #[test]
    fn iteration_order_survives_wraparound() {
        let mut history = History::new(4);
        for i in 0..11 {
            history.push(i);
        }
        let retained: Vec<i32> = history.iter().copied().collect();
        assert_eq!(retained, vec![7, 8, 9, 10]);
        assert_eq!(history.oldest(), Some(7));
        assert_eq!(history.newest(), Some(10));
    }

    #[test]
    fn clear_resets_contents_not_capacity() {
        let mut history = History::new(3);
        history.push(1.5);
        history.push(2.5);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 3);
        history.push(9.0);
        assert_eq!(history.newest(), Some(9.0));
    }
}
