//! Regulatory domain table: channel bands and data-rate parameters.
//!
//! This is read-only data the firmware consults when asking the radio
//! driver to configure itself (see [`crate::radio::RadioConfig`]) — the
//! driver itself, and the question of whether these values meet any actual
//! regulatory filing, are out of scope. A small number of `const` arrays
//! indexed by channel/rate id, rather than a parsed or loaded configuration
//! format.

/// Identifies one entry in a [`RegulatoryDomain`]'s data-rate table.
pub type DataRateId = u8;

/// Which half of the regional band plan a channel index is drawn from.
///
/// A channel *index* alone is ambiguous: regional plans commonly number the
/// uplink and downlink channel ranges independently, both starting at index
/// `0`, so index `0` "up" and index `0` "down" are different physical
/// frequencies. Every channel lookup takes a `Direction` alongside the index
/// to resolve which one is meant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Node-to-gateway channel range.
    Up,
    /// Gateway-to-node channel range.
    Down,
}

/// A contiguous range of channel indices sharing one direction, one
/// frequency stepping, and one range of permitted data rates.
#[derive(Clone, Copy, Debug)]
pub struct ChannelBand {
    /// Whether this band is part of the up or down channel plan.
    pub direction: Direction,

    /// Inclusive range of channel indices this band covers.
    pub channel_range: (u8, u8),

    /// Inclusive range of data-rate ids usable on this band.
    pub data_rate_range: (DataRateId, DataRateId),

    /// Frequency of channel index `channel_range.0`, in Hz.
    pub base_freq_hz: u32,

    /// Frequency step between adjacent channel indices, in Hz.
    pub step_hz: u32,
}

impl ChannelBand {
    /// Returns whether `channel` falls within this band's range, regardless
    /// of direction.
    pub fn contains_channel(&self, channel: u8) -> bool {
        channel >= self.channel_range.0 && channel <= self.channel_range.1
    }

    /// Returns whether `channel`/`direction` together select this band.
    pub fn matches(&self, channel: u8, direction: Direction) -> bool {
        self.direction == direction && self.contains_channel(channel)
    }

    /// Returns the center frequency of `channel` within this band, or
    /// `None` if `channel` isn't in [`ChannelBand::channel_range`].
    pub fn frequency_hz(&self, channel: u8) -> Option<u32> {
        if !self.contains_channel(channel) {
            return None;
        }
        let steps = u32::from(channel - self.channel_range.0);
        Some(self.base_freq_hz + steps * self.step_hz)
    }
}

/// Radio parameters selected by a data-rate id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataRateParams {
    /// Chirp spread-spectrum spreading factor.
    pub spreading_factor: u8,

    /// Channel bandwidth, in Hz.
    pub bandwidth_hz: u32,

    /// Transmit power, in dBm.
    pub tx_power_dbm: i8,

    /// Largest application payload this rate can carry in one frame.
    pub max_user_payload: u8,

    /// Largest total frame size (header + payload) this rate can carry.
    pub max_total_bytes: u8,
}

/// A frequency plan plus a data-rate lookup table for one regulatory region.
pub struct RegulatoryDomain {
    /// Overall frequency range this domain's bands are allotted within, in Hz.
    pub freq_range_hz: (u32, u32),

    /// The channel bands making up this domain.
    pub bands: &'static [ChannelBand],

    /// Data-rate parameters, indexed by [`DataRateId`].
    pub data_rates: &'static [(DataRateId, DataRateParams)],
}

impl RegulatoryDomain {
    /// Looks up the band containing `channel` in the given `direction`, if
    /// any. The same channel index resolves to a different band (and
    /// frequency) depending on direction.
    pub fn band_for_channel(&self, channel: u8, direction: Direction) -> Option<&ChannelBand> {
        self.bands.iter().find(|b| b.matches(channel, direction))
    }

    /// Looks up the parameters for `rate`, if defined in this domain.
    pub fn data_rate(&self, rate: DataRateId) -> Option<DataRateParams> {
        self.data_rates
            .iter()
            .find(|(id, _)| *id == rate)
            .map(|(_, params)| *params)
    }
}

/// Illustrative EU 863-870 MHz ISM band plan with three up-channel bands,
/// three down-channel bands reusing the same indices, and six data rates,
/// shaped like the table a `sx127x`-family driver expects.
///
/// These values are representative, not a certified regulatory filing —
/// the firmware treats this table as external, read-only input.
pub static EU868: RegulatoryDomain = RegulatoryDomain {
    freq_range_hz: (863_000_000, 870_000_000),
    bands: &[
        ChannelBand {
            direction: Direction::Up,
            channel_range: (0, 2),
            data_rate_range: (0, 5),
            base_freq_hz: 868_100_000,
            step_hz: 200_000,
        },
        ChannelBand {
            direction: Direction::Up,
            channel_range: (3, 7),
            data_rate_range: (0, 5),
            base_freq_hz: 867_100_000,
            step_hz: 200_000,
        },
        ChannelBand {
            direction: Direction::Up,
            channel_range: (8, 8),
            data_rate_range: (6, 6),
            base_freq_hz: 868_300_000,
            step_hz: 0,
        },
        ChannelBand {
            direction: Direction::Down,
            channel_range: (0, 2),
            data_rate_range: (0, 5),
            base_freq_hz: 869_100_000,
            step_hz: 200_000,
        },
        ChannelBand {
            direction: Direction::Down,
            channel_range: (3, 7),
            data_rate_range: (0, 5),
            base_freq_hz: 868_700_000,
            step_hz: 100_000,
        },
        ChannelBand {
            direction: Direction::Down,
            channel_range: (8, 8),
            data_rate_range: (6, 6),
            base_freq_hz: 869_850_000,
            step_hz: 0,
        },
    ],
    data_rates: &[
        (0, DataRateParams { spreading_factor: 12, bandwidth_hz: 125_000, tx_power_dbm: 14, max_user_payload: 51, max_total_bytes: 64 }),
        (1, DataRateParams { spreading_factor: 11, bandwidth_hz: 125_000, tx_power_dbm: 14, max_user_payload: 51, max_total_bytes: 64 }),
        (2, DataRateParams { spreading_factor: 10, bandwidth_hz: 125_000, tx_power_dbm: 14, max_user_payload: 115, max_total_bytes: 128 }),
        (3, DataRateParams { spreading_factor: 9, bandwidth_hz: 125_000, tx_power_dbm: 14, max_user_payload: 115, max_total_bytes: 128 }),
        (4, DataRateParams { spreading_factor: 8, bandwidth_hz: 125_000, tx_power_dbm: 14, max_user_payload: 222, max_total_bytes: 242 }),
        (5, DataRateParams { spreading_factor: 7, bandwidth_hz: 125_000, tx_power_dbm: 14, max_user_payload: 222, max_total_bytes: 242 }),
        (6, DataRateParams { spreading_factor: 7, bandwidth_hz: 250_000, tx_power_dbm: 14, max_user_payload: 222, max_total_bytes: 242 }),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_frequency_steps_linearly() {
        let band = &EU868.bands[0];
        assert_eq!(band.frequency_hz(0), Some(868_100_000));
        assert_eq!(band.frequency_hz(1), Some(868_300_000));
        assert_eq!(band.frequency_hz(2), Some(868_500_000));
        assert_eq!(band.frequency_hz(3), None);
    }

    #[test]
    fn band_lookup_finds_containing_band() {
        assert!(EU868.band_for_channel(8, Direction::Up).is_some());
        assert!(EU868.band_for_channel(9, Direction::Up).is_none());
    }

    #[test]
    fn same_channel_index_resolves_to_a_different_band_per_direction() {
        // Channel 0 appears in both the up and down plans at different
        // frequencies; direction, not just the index, selects the band.
        let up = EU868.band_for_channel(0, Direction::Up).unwrap();
        let down = EU868.band_for_channel(0, Direction::Down).unwrap();
        assert_ne!(up.base_freq_hz, down.base_freq_hz);
        assert_eq!(up.frequency_hz(0), Some(868_100_000));
        assert_eq!(down.frequency_hz(0), Some(869_100_000));
    }

    #[test]
    fn data_rate_lookup() {
        let dr5 = EU868.data_rate(5).unwrap();
        assert_eq!(dr5.spreading_factor, 7);
        assert!(EU868.data_rate(200).is_none());
    }
}
