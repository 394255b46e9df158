//! Cycle-level runtime for atomic-rule hardware designs.
//!
//! Designs are a register file plus an ordered list of rules. Each cycle
//! every rule runs once, in priority order, against a tentative copy of the
//! committed registers; a rule that completes is merged back, a rule refused
//! by a register's conflict set leaves no effect.

/// Fixed-width bit-vectors and literal construction.
pub mod bits;
pub use bits::{Bits, FmtStyle, Repr, Storage, Styled, Unit, Width, Word, MAX_WIDTH, UNBOUNDED};

/// Bit-serialization of sequences and aggregates.
pub mod pack;
pub use pack::{pack, replace, unpack, Packable, Packer, Unpacker};

/// Per-register conflict sets and access ports.
pub mod rwset;
pub use rwset::{
    EhrRwSet, PlainRwSet, Port, ReadPort0, ReadPort1, RegisterKind, RwSet, WireRwSet, WritePort0,
    WritePort1,
};

/// Register files, logs and the rule access context.
pub mod log;
pub use log::{AccessLog, AccessLogEntry, Log, Register, RegisterFile, RegisterInfo, Tx};

/// Human-readable rendering and printing helpers.
pub mod display;
pub use display::{display, display_to, putstring, putstring_to, repr, FmtOpts};

/// Rules, commit strategies and the cycle scheduler.
pub mod rule;
pub use rule::{CycleReport, Footprint, Rule, RuleBody, RuleStats, Scheduler};

/// Simulation driver.
pub mod sim;
pub use sim::{init_and_run, init_and_trace, Simulation};

/// Waveform trace sinks.
pub mod trace;
pub use trace::{TraceHeader, TraceSink, TraceValue, TraceVar, VcdWriter};

/// Run configuration.
pub mod config;
pub use config::{SimConfig, TraceConfig, DEFAULT_CYCLES, DEFAULT_TIMESCALE, DEFAULT_TRACE_PERIOD};

/// Error types.
pub mod error;
pub use error::{AccessResult, Conflict, LiteralError, SimError};

#[cfg(test)]
use tempfile as _;
