use crate::addr::Address;
use crate::packet::Packet;
use crate::queue::BoundedQueue;
use crate::seq::Sequence;
use crate::time::{Duration, Instant};

/// Capacity of a route entry's pending-packet queue.
pub const PENDING_QUEUE_CAP: usize = 8;

/// A `RouteRequest` a route entry is retransmitting while the route is
/// unresolved, plus its retry bookkeeping.
struct PendingRequest {
    request: Packet,
    retries_left: u8,
    retry_interval: Duration,
    next_retry_at: Instant,
}

/// Outcome of [`RouteEntry::poll_retry`].
pub enum RetryOutcome {
    /// The retry deadline hasn't been reached yet.
    NotDue,
    /// The deadline was reached and a retry remains: retransmit `Packet`.
    Retry(Packet),
    /// The retry budget is exhausted; the entry should be removed and its
    /// pending queue dropped.
    Exhausted,
}

/// A cached route to one destination.
///
/// Owned exclusively by [`crate::route::table::RouteTable`]; nothing else
/// holds a reference to one across a lock release.
pub struct RouteEntry {
    pub target: Address,
    pub next_hop: Address,
    pub metric: u8,
    pub sequence: Sequence,
    pub gateway_flag: bool,
    pub expires_at: Instant,
    pending: BoundedQueue<Packet, PENDING_QUEUE_CAP>,
    pending_request: Option<PendingRequest>,
}

impl RouteEntry {
    /// Creates a resolved route entry. A `next_hop` of `Address::NULL`
    /// marks this as a pending placeholder instead.
    pub fn new(
        target: Address,
        next_hop: Address,
        metric: u8,
        sequence: Sequence,
        gateway_flag: bool,
        now: Instant,
        lifetime: Duration,
    ) -> Self {
        RouteEntry {
            target,
            next_hop,
            metric,
            sequence,
            gateway_flag,
            expires_at: now + lifetime,
            pending: BoundedQueue::new(),
            pending_request: None,
        }
    }

    /// Returns whether this entry is still valid at `now`.
    pub fn is_live(&self, now: Instant) -> bool {
        now.is_before(self.expires_at)
    }

    /// Returns whether this entry is a pending route: no resolved next hop
    /// yet, traffic queues instead of forwarding.
    pub fn is_pending(&self) -> bool {
        self.next_hop.is_null()
    }

    /// Refreshes `expires_at` to `now + lifetime`.
    pub fn update_lifetime(&mut self, now: Instant, lifetime: Duration) {
        self.expires_at = now + lifetime;
    }

    /// Appends `packet` to the pending queue. If the queue is full, the
    /// oldest queued packet is dropped (counted by the queue itself).
    pub fn enqueue_pending(&mut self, packet: Packet) {
        self.pending.push(packet);
    }

    /// Removes and returns every pending packet, oldest first. A second
    /// call immediately after returns nothing.
    pub fn drain_pending(&mut self) -> impl Iterator<Item = Packet> + '_ {
        self.pending.drain()
    }

    /// Records `request` as the `RouteRequest` to retransmit for this route,
    /// arming the first retry deadline `retry_interval` from `now`.
    pub fn attach_pending_request(
        &mut self,
        request: Packet,
        retries: u8,
        retry_interval: Duration,
        now: Instant,
    ) {
        self.pending_request = Some(PendingRequest {
            request,
            retries_left: retries,
            retry_interval,
            next_retry_at: now + retry_interval,
        });
    }

    /// Clears any pending `RouteRequest` — called when a `RouteAnnounce`
    /// resolves this route.
    pub fn clear_pending_request(&mut self) {
        self.pending_request = None;
    }

    /// Returns whether a `RouteRequest` is still outstanding for this route.
    pub fn has_pending_request(&self) -> bool {
        self.pending_request.is_some()
    }

    /// Checks the retry deadline against `now`. See [`RetryOutcome`].
    pub fn poll_retry(&mut self, now: Instant) -> RetryOutcome {
        let due = match &self.pending_request {
            Some(pending) => !now.is_before(pending.next_retry_at),
            None => return RetryOutcome::NotDue,
        };
        if !due {
            return RetryOutcome::NotDue;
        }

        let pending = self.pending_request.as_mut().expect("checked above");
        if pending.retries_left == 0 {
            self.pending_request = None;
            return RetryOutcome::Exhausted;
        }

        pending.retries_left -= 1;
        pending.next_retry_at = now + pending.retry_interval;
        // Resent unmodified: same sequence number on every retry.
        RetryOutcome::Retry(pending.request.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::data;

    fn request(ttl: u8) -> Packet {
        data::build(Address::from_raw(9), b"req", ttl).unwrap()
    }

    #[test]
    fn poll_retry_is_not_due_with_no_pending_request() {
        let mut entry = RouteEntry::new(
            Address::from_raw(2),
            Address::NULL,
            u8::MAX,
            Sequence::ZERO,
            false,
            Instant::from_raw_millis(0),
            Duration::from_secs(30),
        );
        assert!(matches!(entry.poll_retry(Instant::from_raw_millis(1_000)), RetryOutcome::NotDue));
    }

    #[test]
    fn poll_retry_waits_until_the_deadline_then_retries_then_exhausts() {
        let mut entry = RouteEntry::new(
            Address::from_raw(2),
            Address::NULL,
            u8::MAX,
            Sequence::from_raw(1),
            false,
            Instant::from_raw_millis(0),
            Duration::from_secs(30),
        );
        let retry_interval = Duration::from_secs(5);
        entry.attach_pending_request(request(64), 2, retry_interval, Instant::from_raw_millis(0));

        // Before the deadline: not due yet, and the retry budget is untouched.
        assert!(matches!(
            entry.poll_retry(Instant::from_raw_millis(1_000)),
            RetryOutcome::NotDue
        ));

        // At the deadline: first retry, one of two uses spent.
        let at_deadline = Instant::from_raw_millis(5_000);
        match entry.poll_retry(at_deadline) {
            RetryOutcome::Retry(packet) => assert_eq!(packet.target(), Address::from_raw(9)),
            _ => panic!("expected a retry at the deadline"),
        }

        // Second retry, the last one in the budget.
        let second_deadline = Instant::from_raw_millis(10_000);
        assert!(matches!(entry.poll_retry(second_deadline), RetryOutcome::Retry(_)));

        // Budget exhausted: the third deadline yields Exhausted, not another retry.
        let third_deadline = Instant::from_raw_millis(15_000);
        assert!(matches!(entry.poll_retry(third_deadline), RetryOutcome::Exhausted));

        // The pending request was cleared by the exhaustion; polling again
        // (even well past any deadline) reports NotDue, not another Exhausted.
        assert!(!entry.has_pending_request());
        assert!(matches!(
            entry.poll_retry(Instant::from_raw_millis(1_000_000)),
            RetryOutcome::NotDue
        ));
    }

    #[test]
    fn resend_reuses_the_same_packet_unmodified() {
        let mut entry = RouteEntry::new(
            Address::from_raw(2),
            Address::NULL,
            u8::MAX,
            Sequence::from_raw(3),
            false,
            Instant::from_raw_millis(0),
            Duration::from_secs(30),
        );
        entry.attach_pending_request(request(64), 3, Duration::from_secs(5), Instant::from_raw_millis(0));

        let first = match entry.poll_retry(Instant::from_raw_millis(5_000)) {
            RetryOutcome::Retry(packet) => packet,
            _ => panic!("expected a retry"),
        };
        let second = match entry.poll_retry(Instant::from_raw_millis(10_000)) {
            RetryOutcome::Retry(packet) => packet,
            _ => panic!("expected a retry"),
        };
        assert_eq!(first.frame().as_bytes(), second.frame().as_bytes());
    }

    #[test]
    fn pending_queue_drops_oldest_past_capacity() {
        let mut entry = RouteEntry::new(
            Address::from_raw(2),
            Address::NULL,
            u8::MAX,
            Sequence::ZERO,
            false,
            Instant::from_raw_millis(0),
            Duration::from_secs(30),
        );
        for i in 0..PENDING_QUEUE_CAP as u8 + 1 {
            entry.enqueue_pending(request(i + 1));
        }

        let drained: heapless::Vec<Packet, PENDING_QUEUE_CAP> = entry.drain_pending().collect();
        assert_eq!(drained.len(), PENDING_QUEUE_CAP);
        // The first enqueued packet (ttl 1) was the oldest and should have
        // been dropped to make room for the one past capacity.
        assert_eq!(drained[0].frame().ttl(), 2);
        assert_eq!(drained[PENDING_QUEUE_CAP - 1].frame().ttl(), PENDING_QUEUE_CAP as u8 + 1);

        // Draining again yields nothing.
        assert_eq!(entry.drain_pending().next(), None);
    }
}
