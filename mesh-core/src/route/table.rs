use heapless::Vec;

use crate::addr::Address;
use crate::concurrency::{LockId, ReentrantMutex};
use crate::route::entry::RouteEntry;
use crate::seq::Sequence;
use crate::time::{Duration, Instant};

/// Maximum number of simultaneously cached routes.
pub const CAPACITY: usize = 64;

/// Result of [`RouteTable::update_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// No live entry existed for this target; one was inserted.
    Created,
    /// An entry existed and was overwritten with newer/better data.
    Improved,
    /// An entry existed and neither its sequence nor its metric changed.
    Unchanged,
}

impl RouteState {
    /// Whether this outcome represents new information about the route.
    pub fn is_improved_or_new(self) -> bool {
        !matches!(self, RouteState::Unchanged)
    }
}

struct Inner {
    entries: Vec<RouteEntry, CAPACITY>,
}

impl Inner {
    fn position(&self, target: Address) -> Option<usize> {
        self.entries.iter().position(|e| e.target == target)
    }

    /// Removes every entry expired as of `now`.
    fn evict_expired(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.entries.len() {
            if !self.entries[i].is_live(now) {
                self.entries.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Removes the entry with the smallest `expires_at`.
    fn evict_earliest(&mut self) {
        if let Some((idx, _)) = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.expires_at.raw_millis())
        {
            self.entries.swap_remove(idx);
        }
    }

    fn make_room(&mut self, now: Instant) {
        if self.entries.len() < CAPACITY {
            return;
        }
        self.evict_expired(now);
        if self.entries.len() >= CAPACITY {
            self.evict_earliest();
        }
    }
}

/// Bounded mapping from destination address to [`RouteEntry`], guarded by a
/// single reentrant mutex.
pub struct RouteTable {
    inner: ReentrantMutex<Inner>,
}

impl RouteTable {
    /// Creates an empty routing table.
    pub const fn new() -> Self {
        RouteTable {
            inner: ReentrantMutex::new(Inner { entries: Vec::new() }),
        }
    }

    /// Number of live entries, without pruning expired ones.
    pub fn len(&self, lock: LockId) -> usize {
        self.inner.lock(lock, |inner| inner.entries.len())
    }

    /// Applies `f` to the live entry for `target`, if present and unexpired.
    pub fn with_entry<R>(
        &self,
        lock: LockId,
        target: Address,
        now: Instant,
        f: impl FnOnce(Option<&RouteEntry>) -> R,
    ) -> R {
        self.inner.lock(lock, |inner| {
            let entry = inner
                .position(target)
                .map(|i| &inner.entries[i])
                .filter(|e| e.is_live(now));
            f(entry)
        })
    }

    /// Applies `f` to the mutable live entry for `target`, if present and
    /// unexpired.
    pub fn with_entry_mut<R>(
        &self,
        lock: LockId,
        target: Address,
        now: Instant,
        f: impl FnOnce(Option<&mut RouteEntry>) -> R,
    ) -> R {
        self.inner.lock(lock, |inner| {
            let entry = inner
                .position(target)
                .filter(|&i| inner.entries[i].is_live(now))
                .map(|i| &mut inner.entries[i]);
            f(entry)
        })
    }

    /// Force-creates a fresh pending route entry for `target`, with
    /// `next_hop = Address::NULL`, evicting per the capacity rule if
    /// necessary, then runs `f` on the newly inserted entry.
    ///
    /// The placeholder's metric is seeded at `u8::MAX` rather than a
    /// realistic hop count: any genuine reply under the same sequence
    /// number, including a one-hop neighbor's `metric = 1`, must compare as
    /// an improvement and release the pending queue, never as a tie.
    pub fn create_pending<R>(
        &self,
        lock: LockId,
        target: Address,
        sequence: Sequence,
        now: Instant,
        lifetime: Duration,
        f: impl FnOnce(&mut RouteEntry) -> R,
    ) -> R {
        self.inner.lock(lock, |inner| {
            inner.make_room(now);
            let entry = RouteEntry::new(target, Address::NULL, u8::MAX, sequence, false, now, lifetime);
            let _ = inner.entries.push(entry);
            let idx = inner.position(target).expect("just inserted");
            f(&mut inner.entries[idx])
        })
    }

    /// Creates a new entry, overwrites an improved one, or leaves an
    /// unchanged one untouched (lifetime not refreshed on `Unchanged`).
    pub fn update_or_create(
        &self,
        lock: LockId,
        target: Address,
        next_hop: Address,
        sequence: Sequence,
        metric: u8,
        gateway_flag: bool,
        now: Instant,
        lifetime: Duration,
    ) -> RouteState {
        self.inner.lock(lock, |inner| {
            if let Some(idx) = inner.position(target).filter(|&i| inner.entries[i].is_live(now)) {
                let entry = &mut inner.entries[idx];
                let improved = sequence != entry.sequence || metric < entry.metric;
                if improved {
                    entry.next_hop = next_hop;
                    entry.sequence = sequence;
                    entry.metric = metric;
                    entry.gateway_flag = gateway_flag;
                    entry.update_lifetime(now, lifetime);
                    RouteState::Improved
                } else {
                    RouteState::Unchanged
                }
            } else {
                inner.make_room(now);
                let entry = RouteEntry::new(target, next_hop, metric, sequence, gateway_flag, now, lifetime);
                let _ = inner.entries.push(entry);
                RouteState::Created
            }
        })
    }

    /// Removes every expired entry. Called by the periodic sweep ahead of
    /// polling retries.
    pub fn evict_expired(&self, lock: LockId, now: Instant) {
        self.inner.lock(lock, |inner| inner.evict_expired(now));
    }

    /// Removes the entry for `target` outright (used once its retry budget
    /// is exhausted).
    pub fn remove(&self, lock: LockId, target: Address) {
        self.inner.lock(lock, |inner| {
            if let Some(idx) = inner.position(target) {
                inner.entries.swap_remove(idx);
            }
        });
    }

    /// Returns a snapshot of every currently-present target address, for
    /// the retry sweep to iterate without holding the lock across the
    /// send-path calls it makes for each one.
    pub fn snapshot_targets(&self, lock: LockId) -> Vec<Address, CAPACITY> {
        self.inner
            .lock(lock, |inner| inner.entries.iter().map(|e| e.target).collect())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::Address;

    const LOCK: LockId = LockId(0);

    #[test]
    fn create_then_unchanged_then_improved() {
        let table = RouteTable::new();
        let now = Instant::from_raw_millis(0);
        let lifetime = Duration::from_secs(30);
        let b = Address::from_raw(2);

        let s = table.update_or_create(LOCK, b, b, Sequence::from_raw(7), 1, false, now, lifetime);
        assert_eq!(s, RouteState::Created);

        let s = table.update_or_create(LOCK, b, b, Sequence::from_raw(7), 1, false, now, lifetime);
        assert_eq!(s, RouteState::Unchanged);

        let s = table.update_or_create(LOCK, b, b, Sequence::from_raw(7), 0, false, now, lifetime);
        assert_eq!(s, RouteState::Improved);

        let s = table.update_or_create(LOCK, b, b, Sequence::from_raw(8), 5, false, now, lifetime);
        assert_eq!(s, RouteState::Improved, "new sequence always wins regardless of metric");
    }

    #[test]
    fn eviction_prefers_earliest_expiry_when_full() {
        // Capacity 2, routes to B (expires t+20) and C (expires t+10); a
        // route to D arrives and must evict C.
        let table = RouteTable::new();
        let t0 = Instant::from_raw_millis(0);
        let b = Address::from_raw(2);
        let c = Address::from_raw(3);
        let d = Address::from_raw(4);

        table.update_or_create(LOCK, b, b, Sequence::ZERO, 1, false, t0, Duration::from_secs(20));
        table.update_or_create(LOCK, c, c, Sequence::ZERO, 1, false, t0, Duration::from_secs(10));
        for i in 0..CAPACITY - 2 {
            let addr = Address::from_raw(100 + i as u16);
            table.update_or_create(LOCK, addr, addr, Sequence::ZERO, 1, false, t0, Duration::from_secs(15));
        }
        assert_eq!(table.len(LOCK), CAPACITY);

        table.update_or_create(LOCK, d, d, Sequence::ZERO, 1, false, t0, Duration::from_secs(20));
        assert_eq!(table.len(LOCK), CAPACITY);

        table.with_entry(LOCK, c, t0, |entry| assert!(entry.is_none(), "C should have been evicted"));
        table.with_entry(LOCK, b, t0, |entry| assert!(entry.is_some(), "B should survive"));
        table.with_entry(LOCK, d, t0, |entry| assert!(entry.is_some(), "D should be inserted"));
    }

    #[test]
    fn one_hop_reply_resolves_a_pending_route_under_the_same_sequence() {
        // A direct neighbor's metric is 1, the cheapest real route possible.
        // It must still register as an improvement over the placeholder the
        // pending route was created with, not tie with it.
        let table = RouteTable::new();
        let now = Instant::from_raw_millis(0);
        let lifetime = Duration::from_secs(30);
        let b = Address::from_raw(2);
        let sequence = Sequence::from_raw(9);

        table.create_pending(LOCK, b, sequence, now, lifetime, |_| {});
        table.with_entry(LOCK, b, now, |entry| assert!(entry.unwrap().is_pending()));

        let s = table.update_or_create(LOCK, b, b, sequence, 1, false, now, lifetime);
        assert_eq!(s, RouteState::Improved, "a genuine reply must resolve the pending placeholder");
        table.with_entry(LOCK, b, now, |entry| assert!(!entry.unwrap().is_pending()));
    }
}
