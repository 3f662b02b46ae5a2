//! Data (any protocol id not recognized as a control protocol): opaque
//! application payload.

use crate::addr::Address;
use crate::error::Error;
use crate::packet::{new_control_frame, Intent, Packet, ProcessContext, RawFrame};

/// Builds an outbound data packet carrying `payload` to `target`.
/// `next_hop` is left `NULL`; the send path resolves it.
pub fn build(target: Address, payload: &[u8], default_ttl: u8) -> Result<Packet, Error> {
    let mut frame = new_control_frame(0xFF, payload.len(), target, false, default_ttl)?;
    frame.payload_mut().copy_from_slice(payload);
    Ok(Packet::Data(frame))
}

pub(crate) fn process(frame: RawFrame, ctx: &ProcessContext<'_>) -> Intent {
    if frame.target() == ctx.own_address {
        return Intent::Deliver(Packet::Data(frame));
    }

    let mut out = frame;
    if !out.decrement_ttl() {
        return Intent::Expired;
    }
    out.set_next_hop(Address::NULL);
    Intent::Send(Packet::Data(out))
}
