use crate::codec::Field;

/// Link-layer recipient field, or the target/previous/source field — all
/// four address fields share this width.
pub const NEXT_HOP: Field = Field::at(0, 2);
pub const TARGET: Field = NEXT_HOP.after(2);
pub const PREVIOUS: Field = TARGET.after(2);
pub const SOURCE: Field = PREVIOUS.after(2);
pub const PROTOCOL: Field = SOURCE.after(1);
pub const TTL: Field = PROTOCOL.after(1);

/// Length of the fixed header every packet carries ahead of its payload.
pub const HEADER_LEN: usize = TTL.end();

enum_with_unknown! {
    /// The packet's protocol id (header byte 8).
    ///
    /// Any value this crate doesn't recognize as a control protocol is
    /// treated as opaque application data (`Unknown` carries the raw byte
    /// and [`Packet::classify`](crate::packet::Packet::classify) maps it to
    /// `Packet::Data`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Protocol(u8) {
        Beacon = 0,
        RouteAnnounce = 1,
        RouteRequest = 2,
        RouteError = 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_ten_bytes() {
        assert_eq!(HEADER_LEN, 10);
    }

    #[test]
    fn unrecognized_protocol_becomes_unknown() {
        assert_eq!(Protocol::from(99), Protocol::Unknown(99));
        assert_eq!(Protocol::from(2), Protocol::RouteRequest);
    }
}
