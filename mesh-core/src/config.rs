//! Engine configuration trait and runtime parameters.

use crate::{radio::Transmitter, time::Timer};

/// Trait for mesh engine configurations.
///
/// Every application instantiates one type implementing `Config` and builds
/// an [`Engine`](crate::engine::Engine) generic over it. Platform code is
/// pulled in exactly once, at the `Engine<C>` type parameter, instead of
/// through scattered global statics.
pub trait Config {
    /// A time source with millisecond resolution.
    type Timer: Timer;

    /// The radio transmitter.
    type Transmitter: Transmitter;
}

/// Runtime parameters for an [`Engine`](crate::engine::Engine), set once at
/// startup from the persisted configuration store (see [`crate::config_store`]).
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// This node's own, invariant address.
    pub own_address: crate::addr::Address,

    /// Whether this node advertises itself as a gateway.
    pub gateway: bool,

    /// Whether a duplicate of every received packet is queued onto the
    /// application receive queue, regardless of destination.
    pub promiscuous: bool,

    /// Whether verbose `debug!`-level tracing is enabled.
    pub debug: bool,

    /// Default TTL assigned to packets originated by this node.
    pub default_ttl: u8,

    /// How long a route is trusted after it was last refreshed.
    pub route_lifetime: crate::time::Duration,

    /// How often the retry sweep runs.
    pub sweep_interval: crate::time::Duration,

    /// How long to wait between `RouteRequest` retransmissions for an
    /// unresolved route.
    pub retry_interval: crate::time::Duration,

    /// How many times an unresolved `RouteRequest` is retransmitted before
    /// the route (and its pending packets) is given up on.
    pub retry_count: u8,

    /// How often a gateway node broadcasts an unsolicited `RouteAnnounce`.
    /// Ignored when `gateway` is `false`.
    pub announce_interval: crate::time::Duration,
}

impl EngineConfig {
    /// Default parameters: 64-entry route table, 8-deep pending queues,
    /// 500 ms sweep, 5 retries at 5 s, 30 s route lifetime, 15 s announce
    /// interval, TTL 64.
    pub fn new(own_address: crate::addr::Address) -> Self {
        EngineConfig {
            own_address,
            gateway: false,
            promiscuous: false,
            debug: false,
            default_ttl: 64,
            route_lifetime: crate::time::Duration::from_secs(30),
            sweep_interval: crate::time::Duration::from_millis(500),
            retry_interval: crate::time::Duration::from_secs(5),
            retry_count: 5,
            announce_interval: crate::time::Duration::from_secs(15),
        }
    }
}
