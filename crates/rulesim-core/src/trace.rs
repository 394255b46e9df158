//! Waveform trace sinks.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::SimError;

/// Session header written once before any sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHeader {
    /// Producer and format version.
    pub version: String,
    /// Duration of one cycle, e.g. `1 ps`.
    pub timescale: String,
}

impl TraceHeader {
    /// Header stamped with this crate's version.
    #[must_use]
    pub fn new(timescale: impl Into<String>) -> Self {
        Self {
            version: concat!("rulesim ", env!("CARGO_PKG_VERSION")).to_owned(),
            timescale: timescale.into(),
        }
    }
}

/// A traced register declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceVar {
    /// Register name.
    pub name: &'static str,
    /// Width in bits.
    pub width: u32,
}

/// One sampled register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceValue<'a> {
    /// Register name.
    pub name: &'static str,
    /// Width in bits.
    pub width: u32,
    /// Exactly `width` binary digits, most significant first.
    pub bits: &'a str,
}

/// Append-only consumer of sampled register values.
pub trait TraceSink {
    /// Starts the session; `vars` lists registers in declaration order.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn begin(&mut self, header: &TraceHeader, vars: &[TraceVar]) -> io::Result<()>;

    /// Records the values held during `cycle`, in declaration order.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn sample(&mut self, cycle: u64, values: &[TraceValue<'_>]) -> io::Result<()>;

    /// Closes the session at `cycle`.
    ///
    /// # Errors
    ///
    /// Propagates write and flush failures.
    fn finish(&mut self, cycle: u64) -> io::Result<()>;
}

/// Value Change Dump writer.
///
/// Registers are declared under a single `top` scope and identified by their
/// names. Zero-width registers carry no information and are left out.
#[derive(Debug)]
pub struct VcdWriter<W: Write> {
    out: W,
}

impl VcdWriter<BufWriter<File>> {
    /// Creates (or truncates) a VCD file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TraceCreate`] when the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, SimError> {
        let file = File::create(path)
            .map_err(|source| SimError::TraceCreate { path: path.to_path_buf(), source })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> VcdWriter<W> {
    /// Writer emitting into `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for VcdWriter<W> {
    fn begin(&mut self, header: &TraceHeader, vars: &[TraceVar]) -> io::Result<()> {
        writeln!(self.out, "$version {} $end", header.version)?;
        writeln!(self.out, "$timescale {} $end", header.timescale)?;
        writeln!(self.out, "$scope module top $end")?;
        for var in vars.iter().filter(|var| var.width > 0) {
            writeln!(self.out, "$var reg {} {} {} $end", var.width, var.name, var.name)?;
        }
        writeln!(self.out, "$upscope $end")?;
        writeln!(self.out, "$enddefinitions $end")
    }

    fn sample(&mut self, cycle: u64, values: &[TraceValue<'_>]) -> io::Result<()> {
        writeln!(self.out, "#{cycle}")?;
        for value in values.iter().filter(|value| value.width > 0) {
            writeln!(self.out, "b{} {}", value.bits, value.name)?;
        }
        Ok(())
    }

    fn finish(&mut self, cycle: u64) -> io::Result<()> {
        writeln!(self.out, "#{cycle}")?;
        self.out.flush()
    }
}
