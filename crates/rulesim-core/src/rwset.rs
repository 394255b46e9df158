//! Per-register conflict sets.
//!
//! Each register kind records which of its ports were used during the
//! current cycle. Reads are checked against the committed set (what earlier
//! rules did); writes are checked against the tentative set (earlier rules
//! plus the running rule). The port traits exist only for the kinds that
//! expose that port, so an access through a missing port does not compile.

use std::fmt;

/// A register access port, listed in its forced logical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    /// Read of the value held at the start of the cycle.
    Read0,
    /// First write.
    Write0,
    /// Read that observes a same-cycle `write0`.
    Read1,
    /// Final write.
    Write1,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read0 => "read0",
            Self::Write0 => "write0",
            Self::Read1 => "read1",
            Self::Write1 => "write1",
        })
    }
}

/// Declared kind of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RegisterKind {
    /// Single write port, untracked reads.
    Plain,
    /// `write0` then `read1`.
    Wire,
    /// Ephemeral history register with two ordered read/write port pairs.
    Ehr,
}

impl RegisterKind {
    /// Ports the kind exposes, in logical order.
    #[must_use]
    pub const fn ports(self) -> &'static [Port] {
        match self {
            Self::Plain => &[Port::Read0, Port::Write0],
            Self::Wire => &[Port::Write0, Port::Read1],
            Self::Ehr => &[Port::Read0, Port::Write0, Port::Read1, Port::Write1],
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plain => "plain",
            Self::Wire => "wire",
            Self::Ehr => "ehr",
        })
    }
}

/// Common behaviour of every conflict set.
///
/// `Default` is the all-clear state every set returns to at cycle start.
pub trait RwSet: Copy + Default + Eq + fmt::Debug {
    /// Kind this set belongs to.
    const KIND: RegisterKind;

    /// Clears every port flag.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Registers exposing `read0`.
pub trait ReadPort0: RwSet {
    /// Whether `read0` is legal given the committed set.
    fn may_read0(committed: &Self) -> bool;
}

/// Registers exposing `read1`.
pub trait ReadPort1: RwSet {
    /// Whether `read1` is legal given the committed set.
    fn may_read1(committed: &Self) -> bool;
    /// Records a `read1` in the tentative set.
    fn mark_read1(&mut self);
}

/// Registers exposing `write0`.
pub trait WritePort0: RwSet {
    /// Whether `write0` is legal given the tentative set.
    fn may_write0(&self) -> bool;
    /// Records a `write0` in the tentative set.
    fn mark_write0(&mut self);
}

/// Registers exposing `write1`.
pub trait WritePort1: RwSet {
    /// Whether `write1` is legal given the tentative set.
    fn may_write1(&self) -> bool;
    /// Records a `write1` in the tentative set.
    fn mark_write1(&mut self);
}

/// Conflict set of a plain register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlainRwSet {
    /// `write0` happened.
    pub w0: bool,
}

impl RwSet for PlainRwSet {
    const KIND: RegisterKind = RegisterKind::Plain;
}

impl ReadPort0 for PlainRwSet {
    // Combinational read of a simple register: never tracked, never refused.
    fn may_read0(_committed: &Self) -> bool {
        true
    }
}

impl WritePort0 for PlainRwSet {
    fn may_write0(&self) -> bool {
        !self.w0
    }

    fn mark_write0(&mut self) {
        self.w0 = true;
    }
}

/// Conflict set of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WireRwSet {
    /// `read1` happened.
    pub r1: bool,
    /// `write0` happened.
    pub w0: bool,
}

impl RwSet for WireRwSet {
    const KIND: RegisterKind = RegisterKind::Wire;
}

impl ReadPort1 for WireRwSet {
    fn may_read1(_committed: &Self) -> bool {
        true
    }

    fn mark_read1(&mut self) {
        self.r1 = true;
    }
}

impl WritePort0 for WireRwSet {
    fn may_write0(&self) -> bool {
        !(self.r1 || self.w0)
    }

    fn mark_write0(&mut self) {
        self.w0 = true;
    }
}

/// Conflict set of an ephemeral history register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EhrRwSet {
    /// `read1` happened.
    pub r1: bool,
    /// `write0` happened.
    pub w0: bool,
    /// `write1` happened.
    pub w1: bool,
}

impl RwSet for EhrRwSet {
    const KIND: RegisterKind = RegisterKind::Ehr;
}

impl ReadPort0 for EhrRwSet {
    fn may_read0(committed: &Self) -> bool {
        !(committed.w0 || committed.w1)
    }
}

impl ReadPort1 for EhrRwSet {
    fn may_read1(committed: &Self) -> bool {
        !committed.w1
    }

    fn mark_read1(&mut self) {
        self.r1 = true;
    }
}

impl WritePort0 for EhrRwSet {
    fn may_write0(&self) -> bool {
        !(self.r1 || self.w0 || self.w1)
    }

    fn mark_write0(&mut self) {
        self.w0 = true;
    }
}

impl WritePort1 for EhrRwSet {
    fn may_write1(&self) -> bool {
        !self.w1
    }

    fn mark_write1(&mut self) {
        self.w1 = true;
    }
}
