use std::path::PathBuf;

use crate::error::SimError;

/// Cycles simulated when no count is given.
pub const DEFAULT_CYCLES: u64 = 1000;

/// Cycles between trace samples when no period is given.
pub const DEFAULT_TRACE_PERIOD: u64 = 1;

/// Duration of one cycle in trace output.
pub const DEFAULT_TIMESCALE: &str = "1 ps";

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Number of cycles to run.
    pub cycles: u64,
    /// Trace output; `None` runs silently and returns the final state.
    pub trace: Option<TraceConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { cycles: DEFAULT_CYCLES, trace: None }
    }
}

impl SimConfig {
    /// Checks the configuration before a run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ZeroTracePeriod`] for a trace period of zero.
    pub const fn validate(&self) -> Result<(), SimError> {
        match &self.trace {
            Some(trace) if trace.period == 0 => Err(SimError::ZeroTracePeriod),
            _ => Ok(()),
        }
    }
}

/// Waveform trace settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceConfig {
    /// Output VCD file.
    pub path: PathBuf,
    /// Cycles between samples.
    #[cfg_attr(feature = "serde", serde(default = "default_period"))]
    pub period: u64,
    /// Duration of one cycle.
    #[cfg_attr(feature = "serde", serde(default = "default_timescale"))]
    pub timescale: String,
}

impl TraceConfig {
    /// Trace to `path` with the default period and timescale.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), period: DEFAULT_TRACE_PERIOD, timescale: DEFAULT_TIMESCALE.to_owned() }
    }
}

#[cfg(feature = "serde")]
const fn default_period() -> u64 {
    DEFAULT_TRACE_PERIOD
}

#[cfg(feature = "serde")]
fn default_timescale() -> String {
    DEFAULT_TIMESCALE.to_owned()
}
