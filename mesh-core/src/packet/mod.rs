//! Typed views over the wire packet format.
//!
//! Packets are modeled as a tagged-variant sum type ([`Packet`]) rather than
//! each protocol being a class that calls back into the engine. A packet
//! owns its raw frame bytes; [`Packet::process`] inspects and updates the
//! routing table it is given a reference to, and returns an [`Intent`]
//! describing what the engine should do next, rather than acting on the
//! engine directly.

pub mod beacon;
pub mod data;
pub mod intent;
pub mod protocol;
pub mod route_announce;
pub mod route_error;
pub mod route_request;

pub use intent::Intent;
pub use protocol::Protocol;

use heapless::Vec;

use crate::addr::Address;
use crate::error::Error;
use crate::route::RouteTable;

/// Largest frame this crate will build or accept, header included.
///
/// Sized to the largest `max_total_bytes` in [`crate::regdomain::EU868`]'s
/// data-rate table; a frame that wouldn't fit any configured data rate is
/// rejected by the radio driver, not by this layer.
pub const MAX_PACKET_LEN: usize = 242;

/// The raw byte buffer backing every packet, with accessors for the six
/// shared header fields.
#[derive(Clone)]
pub struct RawFrame(Vec<u8, MAX_PACKET_LEN>);

impl RawFrame {
    pub(crate) fn with_capacity(len: usize) -> Result<Self, Error> {
        if len > MAX_PACKET_LEN {
            return Err(Error::Eof);
        }
        let mut buf = Vec::new();
        buf.resize_default(len).map_err(|_| Error::Eof)?;
        Ok(RawFrame(buf))
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < protocol::HEADER_LEN || bytes.len() > MAX_PACKET_LEN {
            return Err(Error::Eof);
        }
        let mut buf = Vec::new();
        buf.extend_from_slice(bytes).map_err(|_| Error::Eof)?;
        Ok(RawFrame(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn next_hop(&self) -> Address {
        Address::from_raw(protocol::NEXT_HOP.get_u16(&self.0))
    }

    pub fn set_next_hop(&mut self, addr: Address) {
        protocol::NEXT_HOP.set_u16(&mut self.0, addr.raw());
    }

    pub fn target(&self) -> Address {
        Address::from_raw(protocol::TARGET.get_u16(&self.0))
    }

    pub fn set_target(&mut self, addr: Address) {
        protocol::TARGET.set_u16(&mut self.0, addr.raw());
    }

    pub fn previous(&self) -> Address {
        Address::from_raw(protocol::PREVIOUS.get_u16(&self.0))
    }

    pub fn set_previous(&mut self, addr: Address) {
        protocol::PREVIOUS.set_u16(&mut self.0, addr.raw());
    }

    pub fn source(&self) -> Address {
        Address::from_raw(protocol::SOURCE.get_u16(&self.0))
    }

    pub fn set_source(&mut self, addr: Address) {
        protocol::SOURCE.set_u16(&mut self.0, addr.raw());
    }

    pub fn protocol_byte(&self) -> u8 {
        protocol::PROTOCOL.get_u8(&self.0)
    }

    pub fn ttl(&self) -> u8 {
        protocol::TTL.get_u8(&self.0)
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        protocol::TTL.set_u8(&mut self.0, ttl);
    }

    /// Decrements TTL by one. Returns `false` (and leaves TTL untouched) if
    /// TTL was already `1` — the caller must drop the packet instead of
    /// forwarding it.
    #[must_use]
    pub fn decrement_ttl(&mut self) -> bool {
        let ttl = self.ttl();
        if ttl <= 1 {
            return false;
        }
        self.set_ttl(ttl - 1);
        true
    }

    pub fn payload(&self) -> &[u8] {
        &self.0[protocol::HEADER_LEN..]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.0[protocol::HEADER_LEN..]
    }
}

/// A classified packet, tagged by protocol.
#[derive(Clone)]
pub enum Packet {
    Beacon(RawFrame),
    RouteAnnounce(RawFrame),
    RouteRequest(RawFrame),
    RouteError(RawFrame),
    Data(RawFrame),
}

impl Packet {
    /// Classifies `bytes` received off the wire into a typed [`Packet`],
    /// defaulting unrecognized protocol ids to [`Packet::Data`]. Frames
    /// shorter than the fixed header, or shorter than their protocol's
    /// minimum payload, are rejected.
    pub fn classify(bytes: &[u8]) -> Result<Self, Error> {
        let frame = RawFrame::from_bytes(bytes)?;
        let min_len = match Protocol::from(frame.protocol_byte()) {
            Protocol::Beacon => protocol::HEADER_LEN + beacon::NAME_LEN,
            Protocol::RouteAnnounce => protocol::HEADER_LEN + route_announce::PAYLOAD_LEN,
            Protocol::RouteRequest => protocol::HEADER_LEN + route_request::PAYLOAD_LEN,
            Protocol::RouteError => protocol::HEADER_LEN + route_error::PAYLOAD_LEN,
            Protocol::Unknown(_) => protocol::HEADER_LEN,
        };
        if bytes.len() < min_len {
            return Err(Error::Eof);
        }
        Ok(match Protocol::from(frame.protocol_byte()) {
            Protocol::Beacon => Packet::Beacon(frame),
            Protocol::RouteAnnounce => Packet::RouteAnnounce(frame),
            Protocol::RouteRequest => Packet::RouteRequest(frame),
            Protocol::RouteError => Packet::RouteError(frame),
            Protocol::Unknown(_) => Packet::Data(frame),
        })
    }

    pub fn frame(&self) -> &RawFrame {
        match self {
            Packet::Beacon(f)
            | Packet::RouteAnnounce(f)
            | Packet::RouteRequest(f)
            | Packet::RouteError(f)
            | Packet::Data(f) => f,
        }
    }

    pub fn frame_mut(&mut self) -> &mut RawFrame {
        match self {
            Packet::Beacon(f)
            | Packet::RouteAnnounce(f)
            | Packet::RouteRequest(f)
            | Packet::RouteError(f)
            | Packet::Data(f) => f,
        }
    }

    pub fn next_hop(&self) -> Address {
        self.frame().next_hop()
    }

    pub fn target(&self) -> Address {
        self.frame().target()
    }

    pub fn previous(&self) -> Address {
        self.frame().previous()
    }

    pub fn source(&self) -> Address {
        self.frame().source()
    }

    pub fn ttl(&self) -> u8 {
        self.frame().ttl()
    }

    /// Runs this packet's `process` behavior, returning the [`Intent`]
    /// describing what the engine should do next.
    pub fn process(self, ctx: &ProcessContext<'_>) -> Intent {
        match self {
            Packet::Beacon(frame) => beacon::process(frame, ctx),
            Packet::RouteAnnounce(frame) => route_announce::process(frame, ctx),
            Packet::RouteRequest(frame) => route_request::process(frame, ctx),
            Packet::RouteError(frame) => route_error::process(frame, ctx),
            Packet::Data(frame) => data::process(frame, ctx),
        }
    }
}

/// Everything a packet's `process` step needs to read the routing table or
/// this node's own identity — never a full `&mut Engine`.
pub struct ProcessContext<'a> {
    pub own_address: Address,
    pub gateway: bool,
    pub debug: bool,
    pub table: &'a RouteTable,
    pub lock: crate::concurrency::LockId,
    pub route_lifetime: crate::time::Duration,
    pub default_ttl: u8,
    pub now: crate::time::Instant,
}

/// Builds an outbound control packet with the shared header fields set:
/// `previous`/`next_hop` left for the send path to fill in (`NULL`, or
/// `BROADCAST` when `broadcast` is set), `source` left `NULL` (the send
/// path stamps it), `ttl` set to `default_ttl`.
pub(crate) fn new_control_frame(
    protocol: u8,
    payload_len: usize,
    target: Address,
    broadcast: bool,
    default_ttl: u8,
) -> Result<RawFrame, Error> {
    let mut frame = RawFrame::with_capacity(protocol::HEADER_LEN + payload_len)?;
    frame.set_next_hop(if broadcast { Address::BROADCAST } else { Address::NULL });
    frame.set_target(target);
    frame.set_previous(Address::NULL);
    frame.set_source(Address::NULL);
    protocol::PROTOCOL.set_u8(&mut frame.0, protocol);
    frame.set_ttl(default_ttl);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_unknown_protocol_as_data() {
        let mut bytes = [0u8; protocol::HEADER_LEN + 3];
        bytes[protocol::PROTOCOL.offset] = 200;
        bytes[protocol::HEADER_LEN..].copy_from_slice(b"abc");
        let packet = Packet::classify(&bytes).unwrap();
        assert!(matches!(packet, Packet::Data(_)));
    }

    #[test]
    fn classify_rejects_truncated_header() {
        let bytes = [0u8; 4];
        assert!(Packet::classify(&bytes).is_err());
    }

    #[test]
    fn ttl_decrement_reports_expiry() {
        let mut frame = RawFrame::with_capacity(protocol::HEADER_LEN).unwrap();
        frame.set_ttl(1);
        assert!(!frame.decrement_ttl());
        assert_eq!(frame.ttl(), 1);

        frame.set_ttl(5);
        assert!(frame.decrement_ttl());
        assert_eq!(frame.ttl(), 4);
    }

    #[test]
    fn round_trip_header_fields() {
        let mut frame = RawFrame::with_capacity(protocol::HEADER_LEN).unwrap();
        frame.set_next_hop(Address::BROADCAST);
        frame.set_target(Address::from_raw(5));
        frame.set_previous(Address::from_raw(1));
        frame.set_source(Address::from_raw(1));
        frame.set_ttl(64);

        let decoded = RawFrame::from_bytes(frame.as_bytes()).unwrap();
        assert_eq!(decoded.next_hop(), Address::BROADCAST);
        assert_eq!(decoded.target(), Address::from_raw(5));
        assert_eq!(decoded.ttl(), 64);
    }
}
