use crate::addr::Address;
use crate::packet::Packet;

/// What the engine should do after a packet's `process` step has run.
///
/// Per the design note on cyclic references, `process` never calls back
/// into the engine directly while the routing-table lock it took is still
/// held. It instead returns one of these, and the caller (the engine's
/// receive path) carries it out once `process` has returned and the lock
/// guard is dropped.
pub enum Intent {
    /// Nothing further to do.
    None,

    /// Drop the packet; no action.
    Drop,

    /// Drop the packet because its TTL reached zero while being forwarded.
    Expired,

    /// Hand `Packet` to the send path (a control-plane reply, a rebroadcast,
    /// or a data packet being relayed toward its target).
    Send(Packet),

    /// Deliver `Packet` to the application receive queue — this node is
    /// the final destination of a data packet.
    Deliver(Packet),

    /// A `RouteAnnounce` confirmed a route to `Address`; drain and resend
    /// its route entry's pending packets.
    ReleaseRoute(Address),
}
