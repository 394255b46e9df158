use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::rwset::Port;

/// A register access denied by its conflict set.
///
/// This is the normal way for a rule to abort. Rule bodies propagate it with
/// `?`; the scheduler turns it into an abort count and never returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("{port} on `{register}` conflicts with an earlier access this cycle")]
pub struct Conflict {
    /// Name of the register whose conflict set refused the access.
    pub register: &'static str,
    /// Port that was refused.
    pub port: Port,
}

/// Outcome of a single register access or rule body.
pub type AccessResult<T> = Result<T, Conflict>;

/// Fatal failures surfaced by the simulation driver.
#[derive(Debug, Error)]
pub enum SimError {
    /// The trace file could not be created.
    #[error("cannot create trace file `{}`", .path.display())]
    TraceCreate {
        /// Requested trace location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Writing trace or dump output failed.
    #[error("failed to write simulation output")]
    Output(#[from] io::Error),
    /// A trace was requested with a sampling period of zero cycles.
    #[error("trace period must be at least one cycle")]
    ZeroTracePeriod,
}

/// Rejections from the bit-vector literal parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LiteralError {
    /// No digits were supplied.
    #[error("literal has no digits")]
    Empty,
    /// A character is not a digit of the requested radix.
    #[error("literal contains a digit outside its radix")]
    InvalidDigit,
    /// Only radix 2, 10 and 16 are accepted.
    #[error("unsupported literal radix {0}")]
    UnsupportedRadix(u32),
    /// The value does not fit the declared width.
    #[error("literal overflows its declared width")]
    Overflow,
    /// The value does not fit in 128 bits.
    #[error("literal exceeds 128 bits")]
    TooWide,
}

impl LiteralError {
    /// Aborts const evaluation with this error's message.
    ///
    /// # Panics
    ///
    /// Always.
    pub const fn reject(self) -> ! {
        match self {
            Self::Empty => panic!("literal has no digits"),
            Self::InvalidDigit => panic!("literal contains a digit outside its radix"),
            Self::UnsupportedRadix(_) => panic!("unsupported literal radix"),
            Self::Overflow => panic!("literal overflows its declared width"),
            Self::TooWide => panic!("literal exceeds 128 bits"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io;

    use super::{Conflict, SimError};
    use crate::rwset::Port;

    #[test]
    fn conflict_names_register_and_port() {
        let conflict = Conflict { register: "counter", port: Port::Write1 };
        assert_eq!(
            conflict.to_string(),
            "write1 on `counter` conflicts with an earlier access this cycle"
        );
    }

    #[test]
    fn trace_errors_keep_their_source() {
        let error = SimError::TraceCreate {
            path: "/nowhere/out.vcd".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(error.to_string(), "cannot create trace file `/nowhere/out.vcd`");
        assert!(error.source().is_some());
    }
}
