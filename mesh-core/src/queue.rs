//! Bounded FIFO queues.
//!
//! The same queue shape backs three different buffers in this crate: a
//! route entry's pending-packet queue (capacity 8), the engine's outbound
//! transmit queue, and the application's inbound receive queue. All three
//! share the same requirement: no unbounded growth, oldest-drop on
//! overflow, and a counter so a caller can observe how much has been
//! silently discarded.
//!
//! [`BoundedQueue`] wraps a `heapless::Deque` rather than an SPSC
//! producer/consumer split: every queue here is read and written from code
//! that already holds the owning mutex (the routing-table lock for a
//! route's pending queue, the engine lock for the transmit queue), so
//! there's no need for a lock-free single-producer/single-consumer
//! structure — a plain bounded ring under an existing lock is simpler and
//! smaller.

use heapless::Deque;

/// A fixed-capacity FIFO that drops the oldest entry in favor of new ones.
pub struct BoundedQueue<T, const N: usize> {
    inner: Deque<T, N>,
    dropped: u32,
}

impl<T, const N: usize> BoundedQueue<T, N> {
    /// Creates a new, empty queue.
    pub const fn new() -> Self {
        BoundedQueue {
            inner: Deque::new(),
            dropped: 0,
        }
    }

    /// Returns the number of items currently queued.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns whether the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.inner.len() == N
    }

    /// Returns how many items have been dropped due to overflow so far.
    pub fn dropped_count(&self) -> u32 {
        self.dropped
    }

    /// Appends `item`. If the queue is full, the oldest item is discarded
    /// first and the drop counter is incremented.
    pub fn push(&mut self, item: T) {
        if self.inner.is_full() {
            self.inner.pop_front();
            self.dropped = self.dropped.wrapping_add(1);
        }
        // Capacity was just ensured, so this cannot fail.
        let _ = self.inner.push_back(item);
    }

    /// Removes and returns the oldest item, if any.
    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    /// Removes and returns every queued item, oldest first.
    ///
    /// A second call immediately after returns an empty iterator.
    pub fn drain(&mut self) -> Drain<'_, T, N> {
        Drain(&mut self.inner)
    }
}

impl<T, const N: usize> Default for BoundedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`BoundedQueue::drain`].
pub struct Drain<'a, T, const N: usize>(&'a mut Deque<T, N>);

impl<'a, T, const N: usize> Iterator for Drain<'a, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.pop_front()
    }
}

/// Runs a conformance test suite against an empty, freshly created queue.
///
/// A fixed sequence of assertions any `BoundedQueue<T, N>` instantiation
/// must satisfy, usable from a `#[test]` function with any element type and
/// capacity.
#[cfg(test)]
pub fn run_tests<const N: usize>() {
    assert!(N >= 2, "run_tests needs a capacity of at least 2");

    let mut q: BoundedQueue<u32, N> = BoundedQueue::new();
    assert!(q.is_empty());
    assert_eq!(q.pop(), None);
    assert_eq!(q.drain().next(), None);

    for i in 0..N as u32 {
        q.push(i);
    }
    assert!(q.is_full());
    assert_eq!(q.dropped_count(), 0);

    // One more push must evict the oldest entry (index 0) and count it.
    q.push(N as u32);
    assert_eq!(q.dropped_count(), 1);

    let drained: heapless::Vec<u32, N> = q.drain().collect();
    assert_eq!(drained.len(), N);
    assert_eq!(drained[0], 1, "oldest surviving entry should be index 1");
    assert_eq!(drained[N - 1], N as u32);

    assert!(q.is_empty());
    assert_eq!(q.drain().next(), None, "draining twice must yield nothing");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conformance_suite_cap_4() {
        run_tests::<4>();
    }

    #[test]
    fn conformance_suite_cap_8() {
        run_tests::<8>();
    }

    #[test]
    fn fifo_order_preserved() {
        let mut q: BoundedQueue<&str, 4> = BoundedQueue::new();
        q.push("a");
        q.push("b");
        q.push("c");
        assert_eq!(q.pop(), Some("a"));
        assert_eq!(q.pop(), Some("b"));
        assert_eq!(q.pop(), Some("c"));
        assert_eq!(q.pop(), None);
    }
}
