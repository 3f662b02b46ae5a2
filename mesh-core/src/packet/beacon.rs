//! Beacon (protocol id 0): observational-only presence advertisement.

use crate::addr::Address;
use crate::codec::Field;
use crate::error::Error;
use crate::packet::{new_control_frame, protocol, Intent, Packet, ProcessContext, RawFrame};

/// Length of the name payload.
pub const NAME_LEN: usize = 16;

const NAME: Field = Field::at(protocol::HEADER_LEN, NAME_LEN);

/// Length of the full Beacon payload (used by [`Packet::classify`]).
pub const PAYLOAD_LEN: usize = NAME_LEN;

/// Returns the 16-byte name carried by a Beacon frame.
pub fn name(frame: &RawFrame) -> &[u8] {
    &frame.as_bytes()[NAME.offset..NAME.end()]
}

/// Builds an outbound Beacon: TTL 1, always broadcast.
pub fn build(own_name: &[u8; NAME_LEN]) -> Result<Packet, Error> {
    let mut frame = new_control_frame(protocol::Protocol::Beacon.into(), NAME_LEN, Address::BROADCAST, true, 1)?;
    frame.payload_mut()[..NAME_LEN].copy_from_slice(own_name);
    Ok(Packet::Beacon(frame))
}

pub(crate) fn process(frame: RawFrame, ctx: &ProcessContext<'_>) -> Intent {
    if ctx.debug {
        debug!(
            "beacon from {:?}: {:?}",
            frame.source(),
            crate::utils::HexSlice(name(&frame))
        );
    }
    Intent::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_ttl_one_and_broadcast() {
        let packet = build(b"node-one        ").unwrap();
        assert_eq!(packet.ttl(), 1);
        assert_eq!(packet.next_hop(), Address::BROADCAST);
    }
}
