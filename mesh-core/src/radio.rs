//! The interface the engine requires from the physical radio driver.
//!
//! Everything below this trait — channel/bandwidth/spreading-factor
//! programming, FIFO I/O, IRQ wiring — is out of scope for this crate; see
//! [`crate::regdomain`] for the read-only regulatory data a driver consults
//! when it carries out [`RadioConfig`].

use crate::regdomain::{DataRateId, Direction};

/// Upcalls the engine makes into the radio, and the one downcall the radio
/// makes into the engine.
///
/// A platform provides one implementation of this trait, wired to its actual
/// register-level driver, and hands it to [`crate::engine::Engine`] via
/// [`crate::config::Config::Transmitter`].
pub trait Transmitter {
    /// Starts transmission of one frame. Returns once the frame has been
    /// handed to the radio's FIFO, not once it's fully on air — the engine
    /// learns about completion through [`Engine::on_transmit_complete`]
    /// (called by the platform from the radio's "TX done" interrupt).
    ///
    /// [`Engine::on_transmit_complete`]: crate::engine::Engine::on_transmit_complete
    fn transmit_packet(&mut self, bytes: &[u8]);

    /// Applies a radio configuration selected from the regulatory domain.
    fn configure(&mut self, config: RadioConfig);
}

/// Parameters the engine selects (from [`crate::regdomain`]) and asks the
/// radio driver to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioConfig {
    /// Channel index within the regulatory domain's band.
    pub channel: u8,

    /// Which channel plan `channel` is drawn from — a channel index alone
    /// is ambiguous between a domain's up and down bands.
    pub direction: Direction,

    /// Data rate id, used to look up spreading factor / bandwidth / TX power.
    pub data_rate: DataRateId,

    /// Whether the radio's hardware CRC check is enabled.
    pub crc_enabled: bool,
}
