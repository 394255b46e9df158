//! Simulation driver.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, trace};

use crate::config::{SimConfig, DEFAULT_TIMESCALE};
use crate::error::SimError;
use crate::log::{Log, RegisterFile};
use crate::rule::{CycleReport, Rule, RuleStats, Scheduler};
use crate::trace::{TraceHeader, TraceSink, TraceValue, TraceVar, VcdWriter};

/// Owns the committed log across cycles and drives the scheduler.
#[derive(Debug)]
pub struct Simulation<D: RegisterFile> {
    log: Log<D>,
    scheduler: Scheduler<D>,
    cycle: u64,
}

impl<D: RegisterFile> Simulation<D> {
    /// Simulation starting from the register file's initial values.
    #[must_use]
    pub fn new(rules: Vec<Rule<D>>) -> Self {
        Self::with_state(D::init(), rules)
    }

    /// Simulation starting from `state`.
    #[must_use]
    pub fn with_state(state: D::State, rules: Vec<Rule<D>>) -> Self {
        Self { log: Log::new(state), scheduler: Scheduler::new(rules), cycle: 0 }
    }

    /// Cycles completed so far.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Committed register values.
    #[must_use]
    pub const fn state(&self) -> &D::State {
        &self.log.state
    }

    /// Copy of the committed register values.
    #[must_use]
    pub fn snapshot(&self) -> D::State {
        self.log.state.clone()
    }

    /// Per-rule statistics in priority order.
    pub fn stats(&self) -> impl Iterator<Item = (&'static str, RuleStats)> + '_ {
        self.scheduler.rules().iter().map(|rule| rule.name()).zip(self.scheduler.stats().iter().copied())
    }

    /// Runs a single cycle.
    pub fn step(&mut self) -> CycleReport {
        let report = self.scheduler.run_cycle(&mut self.log);
        trace!(cycle = self.cycle, committed = report.committed, aborted = report.aborted, "cycle done");
        self.cycle += 1;
        report
    }

    /// Runs `cycles` cycles.
    pub fn run(&mut self, cycles: u64) -> &mut Self {
        info!(cycles, start = self.cycle, "running simulation");
        for _ in 0..cycles {
            self.step();
        }
        info!(cycle = self.cycle, "simulation finished");
        self.log_stats();
        self
    }

    /// Runs `cycles` cycles, sampling every register into `sink` every
    /// `period` cycles.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ZeroTracePeriod`] for a zero period and
    /// [`SimError::Output`] when the sink fails.
    pub fn trace<S: TraceSink>(
        &mut self,
        sink: &mut S,
        header: &TraceHeader,
        cycles: u64,
        period: u64,
    ) -> Result<&mut Self, SimError> {
        if period == 0 {
            return Err(SimError::ZeroTracePeriod);
        }
        let vars: Vec<_> =
            D::REGISTERS.iter().map(|info| TraceVar { name: info.name, width: info.width }).collect();
        debug!(registers = vars.len(), period, timescale = %header.timescale, "starting trace");
        sink.begin(header, &vars)?;

        info!(cycles, start = self.cycle, period, "tracing simulation");
        let first = self.cycle;
        for offset in 0..cycles {
            if offset % period == 0 {
                self.sample(sink)?;
            }
            self.step();
        }
        sink.finish(self.cycle)?;
        info!(cycle = self.cycle, samples = cycles.div_ceil(period), first, "trace finished");
        self.log_stats();
        Ok(self)
    }

    /// Like [`trace`](Self::trace), writing a VCD file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TraceCreate`] when the file cannot be created, and
    /// the errors of [`trace`](Self::trace).
    pub fn trace_to_path(&mut self, path: &Path, cycles: u64, period: u64) -> Result<&mut Self, SimError> {
        let mut writer = VcdWriter::create(path)?;
        self.trace(&mut writer, &TraceHeader::new(DEFAULT_TIMESCALE), cycles, period)
    }

    /// Runs according to `config`: traced when it names a trace file, silent
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns configuration and trace I/O failures.
    pub fn execute(&mut self, config: &SimConfig) -> Result<&mut Self, SimError> {
        config.validate()?;
        match &config.trace {
            Some(trace) => {
                let mut writer = VcdWriter::create(&trace.path)?;
                let header = TraceHeader::new(trace.timescale.clone());
                self.trace(&mut writer, &header, config.cycles, trace.period)
            }
            None => Ok(self.run(config.cycles)),
        }
    }

    /// Writes one `name = value` line per register.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Output`] when writing fails.
    pub fn dump(&self, out: &mut impl Write) -> Result<(), SimError> {
        for info in D::REGISTERS {
            writeln!(out, "{} = {}", info.name, D::render(&self.log.state, info.field))?;
        }
        Ok(())
    }

    fn sample<S: TraceSink>(&self, sink: &mut S) -> Result<(), SimError> {
        let patterns: Vec<String> =
            D::REGISTERS.iter().map(|info| D::sample(&self.log.state, info.field)).collect();
        let values: Vec<TraceValue<'_>> = D::REGISTERS
            .iter()
            .zip(&patterns)
            .map(|(info, bits)| TraceValue { name: info.name, width: info.width, bits })
            .collect();
        sink.sample(self.cycle, &values)?;
        Ok(())
    }

    fn log_stats(&self) {
        for (rule, stats) in self.stats() {
            debug!(rule, commits = stats.commits, aborts = stats.aborts, "rule stats");
        }
    }
}

/// Builds a simulation from initial values and runs it for `cycles` cycles.
#[must_use]
pub fn init_and_run<D: RegisterFile>(rules: Vec<Rule<D>>, cycles: u64) -> D::State {
    Simulation::new(rules).run(cycles).snapshot()
}

/// Builds a simulation from initial values and traces every cycle to a VCD
/// file.
///
/// # Errors
///
/// Returns trace file failures.
pub fn init_and_trace<D: RegisterFile>(rules: Vec<Rule<D>>, path: &Path, cycles: u64) -> Result<(), SimError> {
    Simulation::new(rules).trace_to_path(path, cycles, 1)?;
    Ok(())
}
