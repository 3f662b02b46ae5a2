//! End-to-end tests driving a full [`Engine`] through its public interface:
//! received frames in, transmitted frames and delivered packets out.
//!
//! Unit tests embedded in `mesh-core` itself cover individual modules
//! (codec, routing table, packet builders) in isolation; this crate instead
//! wires a complete [`Engine`] to a mock radio and a hand-advanced clock and
//! checks the receive/send pipeline, the retry sweep, and the announce
//! worker behave as a deployed node would.

#![cfg(test)]

use std::cell::RefCell;
use std::rc::Rc;

use mesh_core::addr::Address;
use mesh_core::config::{Config, EngineConfig};
use mesh_core::engine::Engine;
use mesh_core::packet::{data, route_announce, route_request, Packet};
use mesh_core::radio::{RadioConfig, Transmitter};
use mesh_core::seq::Sequence;
use mesh_core::time::{Duration, Instant, MockTimer, Timer};

#[derive(Clone)]
struct SharedTimer(Rc<MockTimer>);

impl Timer for SharedTimer {
    fn now(&self) -> Instant {
        self.0.now()
    }
}

#[derive(Default)]
struct TransmitterState {
    sent: Vec<Vec<u8>>,
    configured: Vec<RadioConfig>,
}

#[derive(Clone, Default)]
struct SharedTransmitter(Rc<RefCell<TransmitterState>>);

impl Transmitter for SharedTransmitter {
    fn transmit_packet(&mut self, bytes: &[u8]) {
        self.0.borrow_mut().sent.push(bytes.to_vec());
    }

    fn configure(&mut self, config: RadioConfig) {
        self.0.borrow_mut().configured.push(config);
    }
}

struct TestConfig;

impl Config for TestConfig {
    type Timer = SharedTimer;
    type Transmitter = SharedTransmitter;
}

struct Node {
    engine: Engine<TestConfig>,
    timer: SharedTimer,
    transmitter: SharedTransmitter,
}

impl Node {
    fn new(own_address: Address) -> Self {
        let timer = SharedTimer(Rc::new(MockTimer::new()));
        let transmitter = SharedTransmitter::default();
        let config = EngineConfig::new(own_address);
        let engine = Engine::new(config, transmitter.clone(), timer.clone());
        Node { engine, timer, transmitter }
    }

    fn advance(&self, d: Duration) {
        self.timer.0.advance(d);
    }

    /// Transmitted frames since the last call, classified and drained.
    fn drain_sent(&self) -> Vec<Packet> {
        self.transmitter
            .0
            .borrow_mut()
            .sent
            .drain(..)
            .map(|bytes| Packet::classify(&bytes).expect("engine transmitted an unclassifiable frame"))
            .collect()
    }

    fn deliver_frame(&self, bytes: &[u8]) {
        self.engine.on_receive(bytes, true, -60);
    }
}

const A: u16 = 1;
const B: u16 = 2;
const C: u16 = 3;
const D: u16 = 4;

fn addr(raw: u16) -> Address {
    Address::from_raw(raw)
}

#[test]
fn route_request_to_self_is_answered_with_route_announce() {
    let node = Node::new(addr(A));

    let mut rreq = route_request::build(addr(A), Sequence::from_raw(7), 1, false, 64).unwrap();
    rreq.frame_mut().set_previous(addr(B));
    rreq.frame_mut().set_source(addr(B));
    let bytes = rreq.frame().as_bytes().to_vec();

    node.deliver_frame(&bytes);

    let sent = node.drain_sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Packet::RouteAnnounce(frame) => {
            assert_eq!(frame.source(), addr(A));
            assert_eq!(frame.previous(), addr(A));
            assert_eq!(frame.target(), addr(B));
            assert_eq!(frame.next_hop(), addr(B));
            assert_eq!(route_announce::sequence(frame), Sequence::from_raw(7));
            assert_eq!(route_announce::metric(frame), 1);
        }
        _ => panic!("expected a RouteAnnounce reply, got a different packet type instead"),
    }

    // The reverse route recorded for B is now usable directly: sending data
    // to B produces a Data frame, not another RouteRequest.
    node.engine.send_data(addr(B), b"hi");
    let sent = node.drain_sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Packet::Data(_)));
}

#[test]
fn flooded_route_request_not_for_us_updates_reverse_route_and_rebroadcasts() {
    let node = Node::new(addr(A));

    let mut rreq = route_request::build(addr(B), Sequence::from_raw(3), 2, false, 64).unwrap();
    rreq.frame_mut().set_previous(addr(C));
    rreq.frame_mut().set_source(addr(D));
    let bytes = rreq.frame().as_bytes().to_vec();

    node.deliver_frame(&bytes);

    let sent = node.drain_sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Packet::RouteRequest(frame) => {
            assert_eq!(frame.previous(), addr(A));
            assert_eq!(frame.source(), addr(D));
            assert_eq!(frame.target(), addr(B));
            assert_eq!(frame.next_hop(), Address::BROADCAST);
            assert_eq!(frame.ttl(), 63);
            assert_eq!(route_request::metric(frame), 3);
        }
        _ => panic!("expected a rebroadcast RouteRequest"),
    }

    // The reverse route to D via C is now live: a data packet to D goes out
    // over C without any further discovery.
    node.engine.send_data(addr(D), b"p");
    let sent = node.drain_sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Packet::Data(frame) => assert_eq!(frame.next_hop(), addr(C)),
        _ => panic!("expected the queued data packet to be resolved directly"),
    }
}

#[test]
fn deferred_send_is_queued_until_route_announce_resolves_it() {
    let node = Node::new(addr(A));

    node.engine.send_data(addr(B), b"hi");
    let sent = node.drain_sent();
    assert_eq!(sent.len(), 1);
    let sequence = match &sent[0] {
        Packet::RouteRequest(frame) => {
            assert_eq!(frame.target(), addr(B));
            assert_eq!(frame.next_hop(), Address::BROADCAST);
            route_request::sequence(frame)
        }
        _ => panic!("expected a RouteRequest for the unresolved destination"),
    };

    // A second send before the route resolves queues onto the same pending
    // route rather than issuing another RouteRequest.
    node.engine.send_data(addr(B), b"again");
    assert!(node.drain_sent().is_empty());

    let mut announce = route_announce::build(addr(A), addr(B), sequence, 1, false, 64).unwrap();
    announce.frame_mut().set_previous(addr(B));
    announce.frame_mut().set_source(addr(B));
    let bytes = announce.frame().as_bytes().to_vec();
    node.deliver_frame(&bytes);

    let sent = node.drain_sent();
    assert_eq!(sent.len(), 2, "both queued data packets should now flush");
    for packet in &sent {
        match packet {
            Packet::Data(frame) => {
                assert_eq!(frame.previous(), addr(A));
                assert_eq!(frame.source(), addr(A));
                assert_eq!(frame.next_hop(), addr(B));
                assert_eq!(frame.target(), addr(B));
            }
            _ => panic!("expected the queued data packets to be released as Data frames"),
        }
    }
}

#[test]
fn unresolved_route_retries_then_gives_up_and_drops_pending() {
    let node = Node::new(addr(A));
    let unreachable = addr(99);

    node.engine.send_data(unreachable, b"hello");
    let first = node.drain_sent();
    assert_eq!(first.len(), 1);
    assert!(matches!(first[0], Packet::RouteRequest(_)));

    let retry_interval = Duration::from_secs(5);
    let mut retransmissions = 0;
    for _ in 0..10 {
        node.advance(retry_interval);
        node.engine.run_retry_sweep();
        let sent = node.drain_sent();
        if sent.is_empty() {
            break;
        }
        assert!(sent.iter().all(|p| matches!(p, Packet::RouteRequest(_))));
        retransmissions += sent.len();
    }

    assert!(retransmissions > 0, "the unresolved route should have retried at least once");
    assert_eq!(node.engine.counters().dropped_pending, 1);

    // Further sweeps are quiet: the route and its pending packet are gone.
    node.advance(retry_interval);
    node.engine.run_retry_sweep();
    assert!(node.drain_sent().is_empty());
}

#[test]
fn data_packet_is_forwarded_with_decremented_ttl_via_known_route() {
    let node = Node::new(addr(A));

    // Learn a route to D via C first (mirrors the reverse route a
    // RouteRequest from D would install).
    let mut rreq = route_request::build(addr(B), Sequence::from_raw(1), 1, false, 64).unwrap();
    rreq.frame_mut().set_previous(addr(C));
    rreq.frame_mut().set_source(addr(D));
    node.deliver_frame(rreq.frame().as_bytes());
    node.drain_sent();

    let mut incoming = data::build(addr(D), b"p", 10).unwrap();
    incoming.frame_mut().set_previous(addr(B));
    incoming.frame_mut().set_source(addr(B));
    incoming.frame_mut().set_next_hop(addr(A));
    incoming.frame_mut().set_ttl(10);
    node.deliver_frame(incoming.frame().as_bytes());

    let sent = node.drain_sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Packet::Data(frame) => {
            assert_eq!(frame.source(), addr(B));
            assert_eq!(frame.previous(), addr(A));
            assert_eq!(frame.target(), addr(D));
            assert_eq!(frame.next_hop(), addr(C));
            assert_eq!(frame.ttl(), 9);
        }
        _ => panic!("expected the data packet to be forwarded"),
    }
}

#[test]
fn ttl_one_packet_not_for_us_is_dropped_without_forwarding() {
    let node = Node::new(addr(A));

    let mut incoming = data::build(addr(D), b"p", 1).unwrap();
    incoming.frame_mut().set_previous(addr(B));
    incoming.frame_mut().set_source(addr(B));
    incoming.frame_mut().set_next_hop(addr(A));
    incoming.frame_mut().set_ttl(1);
    node.deliver_frame(incoming.frame().as_bytes());

    assert!(node.drain_sent().is_empty());
    assert_eq!(node.engine.counters().expired, 1);
}

#[test]
fn bad_crc_frame_is_counted_and_not_processed() {
    let node = Node::new(addr(A));

    node.engine.on_receive(&[0u8; 20], false, -90);

    assert!(node.drain_sent().is_empty());
    assert_eq!(node.engine.counters().crc_errors, 1);
    assert_eq!(node.engine.counters().processed, 0);
}

#[test]
fn gateway_announce_tick_broadcasts_when_enabled() {
    let node = Node::new(addr(A));
    node.engine.run_announce_tick();
    assert!(node.drain_sent().is_empty(), "announce tick is a no-op for a non-gateway node");

    // There is no public setter for `gateway` on `EngineConfig` after
    // construction other than rebuilding the engine, so a gateway node is
    // exercised by constructing one directly.
    let mut config = EngineConfig::new(addr(A));
    config.gateway = true;
    let timer = SharedTimer(Rc::new(MockTimer::new()));
    let transmitter = SharedTransmitter::default();
    let engine: Engine<TestConfig> = Engine::new(config, transmitter.clone(), timer.clone());

    engine.run_announce_tick();
    let sent: Vec<Packet> = transmitter
        .0
        .borrow_mut()
        .sent
        .drain(..)
        .map(|bytes| Packet::classify(&bytes).unwrap())
        .collect();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Packet::RouteAnnounce(frame) => {
            assert_eq!(frame.target(), Address::BROADCAST);
            assert_eq!(frame.next_hop(), Address::BROADCAST);
            assert!(route_announce::gateway_flag(frame));
        }
        _ => panic!("expected a gateway RouteAnnounce broadcast"),
    }
}

#[test]
fn self_sourced_route_request_echo_is_dropped_without_rebroadcast() {
    // A flooded RouteRequest A originated can come back to A via a
    // neighbor's own rebroadcast (same source, decremented TTL, still
    // broadcast next_hop). A must not treat itself as a reverse-route
    // target, and must not rebroadcast its own request again.
    let node = Node::new(addr(A));

    let mut echo = route_request::build(addr(C), Sequence::from_raw(4), 1, false, 64).unwrap();
    echo.frame_mut().set_source(addr(A));
    echo.frame_mut().set_previous(addr(B));
    echo.frame_mut().set_ttl(63);
    node.deliver_frame(echo.frame().as_bytes());

    assert!(node.drain_sent().is_empty(), "must not rebroadcast its own echoed request");
    assert_eq!(node.engine.counters().processed, 1);
}

#[test]
fn self_sourced_route_announce_echo_is_dropped_without_rebroadcast() {
    let node = Node::new(addr(A));

    let mut echo = route_announce::build(addr(B), Address::BROADCAST, Sequence::from_raw(4), 0, true, 64).unwrap();
    echo.frame_mut().set_source(addr(A));
    echo.frame_mut().set_previous(addr(B));
    echo.frame_mut().set_ttl(63);
    node.deliver_frame(echo.frame().as_bytes());

    assert!(node.drain_sent().is_empty(), "must not rebroadcast its own echoed announce");
    assert_eq!(node.engine.counters().processed, 1);
}
