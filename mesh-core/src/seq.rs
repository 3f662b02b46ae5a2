//! Per-originator discovery sequence numbers.

use core::fmt;
use core::num::Wrapping;

/// A per-originator, monotonically increasing discovery sequence number.
///
/// `Sequence` wraps on overflow. Unlike a typical "newer wins" serial number
/// comparison, this mesh never compares two sequence numbers by ordering:
/// per the routing-table update rule, any sequence different from the one
/// currently cached for a target counts as a new discovery round, and the
/// smaller metric wins only when the sequence is unchanged. So `Sequence`
/// only needs equality, `Default`, and an incrementing constructor for the
/// local originator.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Sequence(u16);

impl Sequence {
    /// The zero sequence number (used as an initial/placeholder value).
    pub const ZERO: Self = Sequence(0);

    /// Wraps a raw sequence number, e.g. one just read off the wire.
    pub const fn from_raw(raw: u16) -> Self {
        Sequence(raw)
    }

    /// Returns the raw wire value.
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Returns the next sequence number, wrapping from `0xFFFF` back to `0`.
    #[must_use]
    pub fn next(&self) -> Self {
        Sequence((Wrapping(self.0) + Wrapping(1)).0)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out sequence numbers for packets this node originates.
///
/// One `SequenceGenerator` is owned by the engine; every `RouteRequest` or
/// gateway `RouteAnnounce` this node originates draws its sequence number
/// from here. Retries of an already-sent `RouteRequest` reuse the sequence
/// they were first assigned (see [`crate::route::entry::RouteEntry`]) rather
/// than drawing a new one.
#[derive(Default)]
pub struct SequenceGenerator(Sequence);

impl SequenceGenerator {
    /// Creates a generator starting at [`Sequence::ZERO`].
    pub const fn new() -> Self {
        SequenceGenerator(Sequence::ZERO)
    }

    /// Draws and returns the next sequence number.
    pub fn next(&mut self) -> Sequence {
        self.0 = self.0.next();
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around() {
        let s = Sequence::from_raw(0xFFFF);
        assert_eq!(s.next(), Sequence::from_raw(0));
    }

    #[test]
    fn generator_never_repeats_within_a_wrap() {
        let mut gen = SequenceGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert_eq!(a, Sequence::from_raw(1));
        assert_eq!(b, Sequence::from_raw(2));
    }
}
