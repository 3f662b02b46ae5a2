//! RouteRequest (protocol id 2): asks the mesh to discover a path to `source`.

use crate::addr::Address;
use crate::codec::{read_bit, write_bit, Field};
use crate::error::Error;
use crate::packet::{new_control_frame, protocol, route_announce, Intent, Packet, ProcessContext, RawFrame};
use crate::seq::Sequence;

const FLAGS: Field = Field::at(protocol::HEADER_LEN, 1);
const SEQUENCE: Field = FLAGS.after(2);
const METRIC: Field = SEQUENCE.after(1);

const GATEWAY_BIT: u8 = 0;

/// Length of the RouteRequest payload (used by [`Packet::classify`]).
pub const PAYLOAD_LEN: usize = METRIC.end() - protocol::HEADER_LEN;

pub fn gateway_flag(frame: &RawFrame) -> bool {
    read_bit(FLAGS.get_u8(frame.as_bytes()), GATEWAY_BIT)
}

fn set_gateway_flag(frame: &mut RawFrame, value: bool) {
    let byte = write_bit(0, GATEWAY_BIT, value);
    FLAGS.set_u8(frame.as_bytes_mut(), byte);
}

pub fn sequence(frame: &RawFrame) -> Sequence {
    Sequence::from_raw(SEQUENCE.get_u16(frame.as_bytes()))
}

pub fn metric(frame: &RawFrame) -> u8 {
    METRIC.get_u8(frame.as_bytes())
}

fn set_metric(frame: &mut RawFrame, value: u8) {
    METRIC.set_u8(frame.as_bytes_mut(), value);
}

/// Builds an outbound RouteRequest. Always broadcast.
pub fn build(target: Address, sequence: Sequence, metric: u8, gateway: bool, default_ttl: u8) -> Result<Packet, Error> {
    let mut frame = new_control_frame(
        protocol::Protocol::RouteRequest.into(),
        PAYLOAD_LEN,
        target,
        true,
        default_ttl,
    )?;
    SEQUENCE.set_u16(frame.as_bytes_mut(), sequence.raw());
    set_metric(&mut frame, metric);
    set_gateway_flag(&mut frame, gateway);
    Ok(Packet::RouteRequest(frame))
}

pub(crate) fn process(frame: RawFrame, ctx: &ProcessContext<'_>) -> Intent {
    // The reverse route: a path back to whoever originated this request.
    // Skipped when we are the originator ourselves — a flooded request we
    // sent comes back to us via a neighbor's broadcast rebroadcast, and
    // `frame.source() == ctx.own_address` must never become a routing table
    // entry.
    let state = if frame.source() != ctx.own_address {
        ctx.table.update_or_create(
            ctx.lock,
            frame.source(),
            frame.previous(),
            sequence(&frame),
            metric(&frame),
            gateway_flag(&frame),
            ctx.now,
            ctx.route_lifetime,
        )
    } else {
        crate::route::RouteState::Unchanged
    };

    if frame.target() == ctx.own_address {
        let reply = route_announce::build(
            frame.source(),
            frame.previous(),
            sequence(&frame),
            metric(&frame),
            ctx.gateway,
            ctx.default_ttl,
        );
        return match reply {
            Ok(packet) => Intent::Send(packet),
            Err(_) => Intent::Drop,
        };
    }

    if frame.next_hop() == Address::BROADCAST && state.is_improved_or_new() {
        let mut out = frame;
        if !out.decrement_ttl() {
            return Intent::Expired;
        }
        set_metric(&mut out, metric(&out).saturating_add(1));
        out.set_next_hop(Address::NULL);
        return Intent::Send(Packet::RouteRequest(out));
    }

    Intent::Drop
}
