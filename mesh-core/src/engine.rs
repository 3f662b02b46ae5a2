//! The mesh engine: receive dispatch, send pipeline, retry sweep, and the
//! optional gateway announce tick.

use crate::addr::Address;
use crate::concurrency::{ReentrantMutex, MAIN};
use crate::config::{Config, EngineConfig};
use crate::packet::{data, route_announce, route_request, Intent, Packet, ProcessContext};
use crate::queue::BoundedQueue;
use crate::radio::Transmitter as _;
use crate::route::RouteTable;
use crate::seq::SequenceGenerator;
use crate::time::Timer as _;

/// Capacity of the outbound transmit queue.
pub const TX_QUEUE_CAP: usize = 16;

/// Capacity of the application-facing inbound receive queue.
pub const RX_QUEUE_CAP: usize = 16;

struct TxState {
    queue: BoundedQueue<Packet, TX_QUEUE_CAP>,
    transmitting: bool,
}

/// Error counters observable at the engine boundary.
#[derive(Default, Debug, Clone, Copy)]
pub struct Counters {
    pub crc_errors: u32,
    pub processed: u32,
    pub ignored: u32,
    pub expired: u32,
    pub dropped_pending: u32,
}

/// The central coordinator tying the radio, the routing table, and the
/// send/receive pipeline together.
pub struct Engine<C: Config> {
    config: EngineConfig,
    table: RouteTable,
    tx: ReentrantMutex<TxState>,
    rx_queue: ReentrantMutex<BoundedQueue<Packet, RX_QUEUE_CAP>>,
    sequence_gen: ReentrantMutex<SequenceGenerator>,
    counters: ReentrantMutex<Counters>,
    transmitter: ReentrantMutex<C::Transmitter>,
    timer: C::Timer,
}

impl<C: Config> Engine<C> {
    /// Creates a new engine. `transmitter` and `timer` are the
    /// platform-supplied radio and clock.
    pub fn new(config: EngineConfig, transmitter: C::Transmitter, timer: C::Timer) -> Self {
        Engine {
            config,
            table: RouteTable::new(),
            tx: ReentrantMutex::new(TxState {
                queue: BoundedQueue::new(),
                transmitting: false,
            }),
            rx_queue: ReentrantMutex::new(BoundedQueue::new()),
            sequence_gen: ReentrantMutex::new(SequenceGenerator::new()),
            counters: ReentrantMutex::new(Counters::default()),
            transmitter: ReentrantMutex::new(transmitter),
            timer,
        }
    }

    /// This node's own, invariant address.
    pub fn own_address(&self) -> Address {
        self.config.own_address
    }

    /// Enables or disables promiscuous delivery.
    pub fn set_promiscuous(&mut self, on: bool) {
        self.config.promiscuous = on;
    }

    /// Enables or disables verbose debug logging.
    pub fn set_debug(&mut self, on: bool) {
        self.config.debug = on;
    }

    /// A snapshot of the engine's error/activity counters.
    pub fn counters(&self) -> Counters {
        self.counters.lock(MAIN, |c| *c)
    }

    fn bump<F: FnOnce(&mut Counters)>(&self, f: F) {
        self.counters.lock(MAIN, |c| f(c));
    }

    fn process_context(&self, now: crate::time::Instant) -> ProcessContext<'_> {
        ProcessContext {
            own_address: self.config.own_address,
            gateway: self.config.gateway,
            debug: self.config.debug,
            table: &self.table,
            lock: MAIN,
            route_lifetime: self.config.route_lifetime,
            default_ttl: self.config.default_ttl,
            now,
        }
    }

    /// Dequeues the next packet addressed to this node.
    ///
    /// This is the non-blocking half of the application interface: the
    /// platform's application thread polls this and sleeps when it returns
    /// `None`.
    pub fn receive(&self) -> Option<Packet> {
        self.rx_queue.lock(MAIN, |q| q.pop())
    }

    /// Queues `packet` for transmission, resolving a route if necessary.
    ///
    /// TTL is decremented by each packet type's own `process` step before it
    /// returns `Intent::Send`, not here — `send` only ever receives packets
    /// that have already cleared that check (a fresh locally-originated
    /// packet, or a forwarded one whose TTL is already decremented).
    pub fn send(&self, mut packet: Packet) {
        {
            let frame = packet.frame_mut();
            frame.set_previous(self.config.own_address);
            if frame.source() == Address::NULL {
                frame.set_source(self.config.own_address);
            }
        }

        if packet.next_hop() == Address::NULL {
            let target = packet.target();
            let now = self.timer.now();

            let resolved = self.table.with_entry_mut(MAIN, target, now, |entry| match entry {
                Some(entry) if !entry.is_pending() => {
                    packet.frame_mut().set_next_hop(entry.next_hop);
                    Some(true)
                }
                Some(entry) => {
                    entry.enqueue_pending(packet.clone());
                    Some(false)
                }
                None => None,
            });

            match resolved {
                Some(true) => {}
                Some(false) => return,
                None => {
                    let sequence = self.sequence_gen.lock(MAIN, |g| g.next());
                    let request = match route_request::build(
                        target,
                        sequence,
                        1,
                        self.config.gateway,
                        self.config.default_ttl,
                    ) {
                        Ok(p) => p,
                        Err(_) => return,
                    };

                    self.table.create_pending(MAIN, target, sequence, now, self.config.route_lifetime, |entry| {
                        entry.enqueue_pending(packet.clone());
                        entry.attach_pending_request(
                            request.clone(),
                            self.config.retry_count,
                            self.config.retry_interval,
                            now,
                        );
                    });

                    packet = request;
                }
            }
        }

        self.enqueue_for_transmission(packet);
    }

    fn enqueue_for_transmission(&self, packet: Packet) {
        let should_kick = self.tx.lock(MAIN, |state| {
            let was_empty = state.queue.is_empty() && !state.transmitting;
            state.queue.push(packet);
            was_empty
        });

        if should_kick {
            self.pump_transmit_queue();
        }
    }

    fn pump_transmit_queue(&self) {
        let next = self.tx.lock(MAIN, |state| {
            if let Some(packet) = state.queue.pop() {
                state.transmitting = true;
                Some(packet)
            } else {
                state.transmitting = false;
                None
            }
        });

        if let Some(packet) = next {
            self.transmitter.lock(MAIN, |t| t.transmit_packet(packet.frame().as_bytes()));
        }
    }

    /// Receive entry point. `bytes` is the raw frame; `crc_ok` and
    /// `rssi` come from the radio.
    pub fn on_receive(&self, bytes: &[u8], crc_ok: bool, rssi: i16) {
        let _ = rssi;
        if !crc_ok {
            self.bump(|c| c.crc_errors += 1);
            return;
        }

        let packet = match Packet::classify(bytes) {
            Ok(p) => p,
            Err(_) => {
                self.bump(|c| c.crc_errors += 1);
                return;
            }
        };

        if self.config.promiscuous {
            self.rx_queue.lock(MAIN, |q| q.push(packet.clone()));
        }

        let addressed_to_us = packet.next_hop() == self.config.own_address || packet.next_hop() == Address::BROADCAST;
        if !addressed_to_us {
            self.bump(|c| c.ignored += 1);
            return;
        }

        self.bump(|c| c.processed += 1);

        let now = self.timer.now();
        let ctx = self.process_context(now);
        let intent = packet.process(&ctx);
        self.execute_intent(intent);
    }

    fn execute_intent(&self, intent: Intent) {
        match intent {
            Intent::None | Intent::Drop => {}
            Intent::Expired => {
                debug!("dropping packet with expired TTL");
                self.bump(|c| c.expired += 1);
            }
            Intent::Send(packet) => self.send(packet),
            Intent::Deliver(packet) => {
                self.rx_queue.lock(MAIN, |q| q.push(packet));
            }
            Intent::ReleaseRoute(target) => self.release_route(target),
        }
    }

    fn release_route(&self, target: Address) {
        use crate::route::entry::PENDING_QUEUE_CAP;

        let now = self.timer.now();
        let drained: heapless::Vec<Packet, PENDING_QUEUE_CAP> =
            self.table.with_entry_mut(MAIN, target, now, |entry| match entry {
                Some(entry) => {
                    entry.clear_pending_request();
                    entry.drain_pending().collect()
                }
                None => heapless::Vec::new(),
            });

        for packet in drained {
            self.send(packet);
        }
    }

    /// Invoked by the radio once the current frame is fully on air.
    pub fn on_transmit_complete(&self) {
        self.pump_transmit_queue();
    }

    /// One pass of the periodic retry sweep. Call every
    /// `config.sweep_interval`.
    pub fn run_retry_sweep(&self) {
        use crate::route::RetryOutcome;

        let now = self.timer.now();
        self.table.evict_expired(MAIN, now);

        let targets = self.table.snapshot_targets(MAIN);
        for target in targets {
            let outcome = self
                .table
                .with_entry_mut(MAIN, target, now, |entry| entry.map(|e| e.poll_retry(now)));

            match outcome {
                Some(RetryOutcome::Retry(packet)) => self.send(packet),
                Some(RetryOutcome::Exhausted) => {
                    self.bump(|c| c.dropped_pending += 1);
                    self.table.remove(MAIN, target);
                }
                Some(RetryOutcome::NotDue) | None => {}
            }
        }
    }

    /// One pass of the optional gateway announce worker. Call every
    /// `config.announce_interval`; a no-op unless `config.gateway` is set.
    pub fn run_announce_tick(&self) {
        if !self.config.gateway {
            return;
        }

        let sequence = self.sequence_gen.lock(MAIN, |g| g.next());
        if let Ok(packet) = route_announce::build(
            Address::BROADCAST,
            Address::BROADCAST,
            sequence,
            0,
            true,
            self.config.default_ttl,
        ) {
            self.send(packet);
        }
    }

    /// Queues a data packet originated by the local application.
    pub fn send_data(&self, target: Address, payload: &[u8]) {
        match data::build(target, payload, self.config.default_ttl) {
            Ok(packet) => self.send(packet),
            Err(_) => debug!("payload too large to queue"),
        }
    }
}
