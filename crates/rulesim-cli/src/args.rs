use std::path::PathBuf;

use clap::Parser;
use rulesim_core::{SimConfig, TraceConfig, DEFAULT_CYCLES, DEFAULT_TIMESCALE, DEFAULT_TRACE_PERIOD};

use crate::designs::DesignName;

/// `rulesim <design> [cycles] [vcd-path] [period]`
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rulesim", version)]
#[command(about = "Run a built-in rule-based design, printing its final state or tracing it to VCD")]
pub struct Cli {
    /// Design to simulate.
    #[arg(value_enum)]
    pub design: DesignName,

    /// Number of cycles to run.
    #[arg(default_value_t = DEFAULT_CYCLES)]
    pub cycles: u64,

    /// Write a VCD trace here instead of printing the final state.
    pub vcd: Option<PathBuf>,

    /// Cycles between trace samples.
    #[arg(requires = "vcd", default_value_t = DEFAULT_TRACE_PERIOD, value_parser = clap::value_parser!(u64).range(1..))]
    pub period: u64,

    /// Duration of one cycle in the trace header.
    #[arg(long, requires = "vcd", default_value = DEFAULT_TIMESCALE)]
    pub timescale: String,
}

impl Cli {
    /// Run configuration described by the arguments.
    #[must_use]
    pub fn config(&self) -> SimConfig {
        SimConfig {
            cycles: self.cycles,
            trace: self.vcd.as_ref().map(|path| TraceConfig {
                path: path.clone(),
                period: self.period,
                timescale: self.timescale.clone(),
            }),
        }
    }
}
