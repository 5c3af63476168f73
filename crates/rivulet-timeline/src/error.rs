use thiserror::Error;

/// Errors from interval construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An interval's end precedes its start, or a bound is not finite.
    #[error("invalid time interval: start={start}, end={end}")]
    InvalidInterval { start: f64, end: f64 },
}
