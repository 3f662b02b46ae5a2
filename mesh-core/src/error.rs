use core::fmt;

/// Errors surfaced by the codec layer.
///
/// Errors from the wire or the radio itself (a bad CRC, a too-short frame, a
/// forwarded packet whose TTL just hit zero) never reach a `Result`: the
/// core never panics on input from the air, so those are counted, not
/// returned — see `Engine`'s counters and [`crate::route::table::RouteState`].
/// This type exists for the codec, which has a caller able to act on a
/// `Result` (the packet constructors and the config store).
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A buffer was too small to hold the data being read or written.
    Eof,

    /// A field held a value that isn't valid for its type.
    InvalidValue,

    /// Parsing didn't consume the entire buffer.
    IncompleteParse,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::Eof => "end of buffer",
            Error::InvalidValue => "invalid value for field",
            Error::IncompleteParse => "excess data in buffer",
        })
    }
}
