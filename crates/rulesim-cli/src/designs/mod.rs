use std::io::Write;

use clap::ValueEnum;
use rulesim_core::{RegisterFile, Rule, SimConfig, SimError, Simulation};
use tracing::info;

/// Collatz iteration forwarded through an EHR.
pub mod collatz;
/// Values routed to a runtime-selected register through a wire.
pub mod scatter;
/// Two rules fighting over a plain flag.
pub mod toggle;

/// Designs selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DesignName {
    /// Plain-register toggle pair.
    Toggle,
    /// Collatz sequence on an EHR.
    Collatz,
    /// Dynamic-footprint scatter through a wire.
    Scatter,
}

impl DesignName {
    /// Runs the design under `config`, writing the final state to `out` when
    /// not tracing.
    ///
    /// # Errors
    ///
    /// Returns trace and output failures.
    pub fn execute(self, config: &SimConfig, out: &mut impl Write) -> Result<(), SimError> {
        match self {
            Self::Toggle => drive(toggle::rules(), config, out),
            Self::Collatz => drive(collatz::rules(), config, out),
            Self::Scatter => drive(scatter::rules(), config, out),
        }
    }
}

/// Builds a simulation from `rules`, runs it under `config` and dumps the
/// final state when no trace was requested.
///
/// # Errors
///
/// Returns trace and output failures.
pub fn drive<D: RegisterFile>(rules: Vec<Rule<D>>, config: &SimConfig, out: &mut impl Write) -> Result<(), SimError> {
    let mut sim = Simulation::new(rules);
    sim.execute(config)?;
    match &config.trace {
        Some(trace) => info!(path = %trace.path.display(), cycles = sim.cycle(), "trace written"),
        None => sim.dump(out)?,
    }
    Ok(())
}
