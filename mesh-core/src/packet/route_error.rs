//! RouteError (protocol id 4): reserved. Defined on the wire, never
//! constructed by this engine.

use crate::codec::Field;
use crate::packet::{protocol, Intent, ProcessContext, RawFrame};
use crate::seq::Sequence;

const UNREACHABLE: Field = Field::at(protocol::HEADER_LEN, 2);
const SEQUENCE: Field = UNREACHABLE.after(2);
const REASON: Field = SEQUENCE.after(1);

/// Length of the RouteError payload (used by [`crate::packet::Packet::classify`]).
pub const PAYLOAD_LEN: usize = REASON.end() - protocol::HEADER_LEN;

pub fn unreachable_address(frame: &RawFrame) -> crate::addr::Address {
    crate::addr::Address::from_raw(UNREACHABLE.get_u16(frame.as_bytes()))
}

pub fn sequence(frame: &RawFrame) -> Sequence {
    Sequence::from_raw(SEQUENCE.get_u16(frame.as_bytes()))
}

pub fn reason_code(frame: &RawFrame) -> u8 {
    REASON.get_u8(frame.as_bytes())
}

pub(crate) fn process(frame: RawFrame, ctx: &ProcessContext<'_>) -> Intent {
    if ctx.debug {
        debug!(
            "route error for {:?} (reason {})",
            unreachable_address(&frame),
            reason_code(&frame)
        );
    }
    Intent::Drop
}
