//! Register files, logs and the per-rule access context.
//!
//! A [`Log`] is one view of the whole register file: a value for every
//! register plus its conflict set. The scheduler keeps two of them in sync,
//! the committed log and the tentative log the running rule writes to, and
//! copies individual fields between them to commit or roll back.

use std::fmt;
use std::hash::Hash;

use crate::error::{AccessResult, Conflict};
use crate::pack::Packable;
use crate::rwset::{Port, ReadPort0, ReadPort1, RegisterKind, RwSet, WritePort0, WritePort1};

/// Static description of one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterInfo<F> {
    /// Field identifier.
    pub field: F,
    /// Declared name.
    pub name: &'static str,
    /// Packed width in bits.
    pub width: u32,
    /// Declared kind.
    pub kind: RegisterKind,
}

/// A complete register layout, usually generated by [`register_file!`](crate::register_file!).
pub trait RegisterFile: Sized + 'static {
    /// Values of every register.
    type State: Clone + PartialEq + fmt::Debug;
    /// Conflict sets of every register; `Default` is the cleared state.
    type Conflicts: Clone + Default + PartialEq + fmt::Debug;
    /// Identifier naming a single register.
    type Field: Copy + Eq + Hash + fmt::Debug + 'static;

    /// Registers in declaration order.
    const REGISTERS: &'static [RegisterInfo<Self::Field>];

    /// Initial register values.
    fn init() -> Self::State;

    /// Copies one register's value and conflict set from `src` to `dst`.
    fn copy_field(field: Self::Field, dst: &mut Log<Self>, src: &Log<Self>);

    /// Packed value of `field` as exactly `width` binary digits.
    fn sample(state: &Self::State, field: Self::Field) -> String;

    /// Human-readable value of `field`.
    fn render(state: &Self::State, field: Self::Field) -> String;
}

/// Typed handle on one register of a [`RegisterFile`].
pub trait Register<D: RegisterFile>: Copy {
    /// Field identifier of this register.
    const FIELD: D::Field;
    /// Declared name.
    const NAME: &'static str;
    /// Stored value type.
    type Value: Packable + Clone + PartialEq + fmt::Debug;
    /// Conflict set type, which decides the available ports.
    type RwSet: RwSet;

    /// Borrows the value inside a state.
    fn value(state: &D::State) -> &Self::Value;
    /// Mutably borrows the value inside a state.
    fn value_mut(state: &mut D::State) -> &mut Self::Value;
    /// Borrows the conflict set.
    fn rwset(conflicts: &D::Conflicts) -> &Self::RwSet;
    /// Mutably borrows the conflict set.
    fn rwset_mut(conflicts: &mut D::Conflicts) -> &mut Self::RwSet;
}

/// Register values paired with their conflict sets.
pub struct Log<D: RegisterFile> {
    /// Register values.
    pub state: D::State,
    /// Conflict sets.
    pub rwset: D::Conflicts,
}

impl<D: RegisterFile> Log<D> {
    /// Log holding `state` with cleared conflict sets.
    #[must_use]
    pub fn new(state: D::State) -> Self {
        Self { state, rwset: D::Conflicts::default() }
    }

    /// Log holding the register file's initial values.
    #[must_use]
    pub fn initial() -> Self {
        Self::new(D::init())
    }

    /// Clears every conflict set.
    pub fn reset_rwset(&mut self) {
        self.rwset = D::Conflicts::default();
    }

    /// Copies one register from `src`.
    pub fn copy_field(&mut self, src: &Self, field: D::Field) {
        D::copy_field(field, self, src);
    }

    /// Copies the whole file from `src`.
    pub fn copy_from(&mut self, src: &Self) {
        self.state.clone_from(&src.state);
        self.rwset.clone_from(&src.rwset);
    }
}

impl<D: RegisterFile> Clone for Log<D> {
    fn clone(&self) -> Self {
        Self { state: self.state.clone(), rwset: self.rwset.clone() }
    }
}

impl<D: RegisterFile> PartialEq for Log<D> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.rwset == other.rwset
    }
}

impl<D: RegisterFile> fmt::Debug for Log<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log").field("state", &self.state).field("rwset", &self.rwset).finish()
    }
}

/// One access recorded before it was attempted.
///
/// The entry names a register and port only. The register's value before the
/// rule is read back from the committed log and its value after the rule from
/// the tentative log, so entries stay the same size whatever the register's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessLogEntry<F> {
    /// Register about to be touched.
    pub field: F,
    /// Port used.
    pub port: Port,
}

/// Append-only journal of the registers a rule touched, in order.
///
/// For every entry the committed log holds the value before the rule and the
/// tentative log the value after it, so replaying the journal in one
/// direction or the other commits or undoes exactly the rule's footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLog<F> {
    entries: Vec<AccessLogEntry<F>>,
}

impl<F> Default for AccessLog<F> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<F: Copy> AccessLog<F> {
    /// Empty journal with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Appends an entry.
    pub fn push(&mut self, field: F, port: Port) {
        self.entries.push(AccessLogEntry { field, port });
    }

    /// Forgets every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[AccessLogEntry<F>] {
        &self.entries
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every journaled field from `src` to `dst`, oldest first.
    pub fn replay<D: RegisterFile<Field = F>>(&self, dst: &mut Log<D>, src: &Log<D>) {
        for entry in &self.entries {
            dst.copy_field(src, entry.field);
        }
    }

    /// Copies every journaled field from `src` to `dst`, newest first.
    pub fn unwind<D: RegisterFile<Field = F>>(&self, dst: &mut Log<D>, src: &Log<D>) {
        for entry in self.entries.iter().rev() {
            dst.copy_field(src, entry.field);
        }
    }
}

/// How a [`Tx`] accounts for the registers it touches.
pub(crate) enum Tracking<'a, F> {
    /// Nothing to record; the whole file is copied afterwards.
    Whole,
    /// The rule declared its footprint up front.
    Declared(&'a [F]),
    /// Every access is journaled.
    Journal(&'a mut AccessLog<F>),
}

/// Access context handed to a rule body.
///
/// Every port method checks the register's conflict set first and returns a
/// [`Conflict`] without touching anything when the access is illegal, so a
/// rule body simply propagates failures with `?`.
pub struct Tx<'a, D: RegisterFile> {
    start: &'a D::State,
    committed: &'a Log<D>,
    tentative: &'a mut Log<D>,
    tracking: Tracking<'a, D::Field>,
}

impl<'a, D: RegisterFile> Tx<'a, D> {
    pub(crate) fn new(
        start: &'a D::State,
        committed: &'a Log<D>,
        tentative: &'a mut Log<D>,
        tracking: Tracking<'a, D::Field>,
    ) -> Self {
        Self { start, committed, tentative, tracking }
    }

    fn record(&mut self, field: D::Field, port: Port) {
        match &mut self.tracking {
            Tracking::Whole => {}
            Tracking::Declared(fields) => debug_assert!(
                fields.contains(&field),
                "{field:?} accessed through {port} outside the rule's declared footprint"
            ),
            Tracking::Journal(journal) => journal.push(field, port),
        }
    }

    const fn refuse<R: Register<D>>(port: Port) -> Conflict {
        Conflict { register: R::NAME, port }
    }

    /// Reads the value the register held at the start of the cycle.
    ///
    /// # Errors
    ///
    /// Refused on an EHR once an earlier rule committed a write this cycle.
    pub fn read0<R>(&mut self, _reg: R) -> AccessResult<R::Value>
    where
        R: Register<D>,
        R::RwSet: ReadPort0,
    {
        self.record(R::FIELD, Port::Read0);
        if !R::RwSet::may_read0(R::rwset(&self.committed.rwset)) {
            return Err(Self::refuse::<R>(Port::Read0));
        }
        Ok(R::value(self.start).clone())
    }

    /// Reads the current value, including same-cycle `write0` forwarding.
    ///
    /// # Errors
    ///
    /// Refused on an EHR once an earlier rule committed a `write1`.
    pub fn read1<R>(&mut self, _reg: R) -> AccessResult<R::Value>
    where
        R: Register<D>,
        R::RwSet: ReadPort1,
    {
        self.record(R::FIELD, Port::Read1);
        if !R::RwSet::may_read1(R::rwset(&self.committed.rwset)) {
            return Err(Self::refuse::<R>(Port::Read1));
        }
        R::rwset_mut(&mut self.tentative.rwset).mark_read1();
        Ok(R::value(&self.tentative.state).clone())
    }

    /// Writes through port 0.
    ///
    /// # Errors
    ///
    /// Refused when the register's kind forbids a `write0` after the ports
    /// already used this cycle.
    pub fn write0<R>(&mut self, _reg: R, value: R::Value) -> AccessResult<()>
    where
        R: Register<D>,
        R::RwSet: WritePort0,
    {
        self.record(R::FIELD, Port::Write0);
        let rwset = R::rwset_mut(&mut self.tentative.rwset);
        if !rwset.may_write0() {
            return Err(Self::refuse::<R>(Port::Write0));
        }
        rwset.mark_write0();
        *R::value_mut(&mut self.tentative.state) = value;
        Ok(())
    }

    /// Writes through port 1.
    ///
    /// # Errors
    ///
    /// Refused after another `write1` this cycle.
    pub fn write1<R>(&mut self, _reg: R, value: R::Value) -> AccessResult<()>
    where
        R: Register<D>,
        R::RwSet: WritePort1,
    {
        self.record(R::FIELD, Port::Write1);
        let rwset = R::rwset_mut(&mut self.tentative.rwset);
        if !rwset.may_write1() {
            return Err(Self::refuse::<R>(Port::Write1));
        }
        rwset.mark_write1();
        *R::value_mut(&mut self.tentative.state) = value;
        Ok(())
    }
}

/// Declares a register file.
///
/// Expands to a module containing the `State` and `Conflicts` structs, a
/// `Field` enum, the `Design` type implementing
/// [`RegisterFile`](crate::RegisterFile) and one marker type per register
/// under `reg`, used to pick the register in [`Tx`](crate::Tx) accesses.
/// Registers are `plain`, `wire` or `ehr`; values may be any
/// [`Packable`](crate::Packable) type.
///
/// ```
/// use rulesim_core::{register_file, Bits, RegisterFile};
///
/// register_file! {
///     pub mod counter {
///         ehr count: Bits<8> = Bits::new(0),
///         wire bump: bool = false,
///         plain history: [Bits<8>; 2] = [Bits::zero(); 2],
///     }
/// }
///
/// fn main() {
///     let state = counter::State::default();
///     assert_eq!(state.count, Bits::new(0));
///     assert_eq!(counter::Design::REGISTERS[2].width, 16);
/// }
/// ```
#[macro_export]
macro_rules! register_file {
    (@rwset plain) => { $crate::PlainRwSet };
    (@rwset wire) => { $crate::WireRwSet };
    (@rwset ehr) => { $crate::EhrRwSet };
    (@kind plain) => { $crate::RegisterKind::Plain };
    (@kind wire) => { $crate::RegisterKind::Wire };
    (@kind ehr) => { $crate::RegisterKind::Ehr };
    (
        $(#[$meta:meta])*
        $vis:vis mod $name:ident {
            $( $kind:ident $reg:ident : $ty:ty = $init:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[allow(non_camel_case_types, missing_docs, unused_imports, dead_code, clippy::all, clippy::pedantic)]
        $vis mod $name {
            use super::*;

            #[derive(Debug, Clone, PartialEq)]
            pub struct State {
                $( pub $reg: $ty, )*
            }

            impl Default for State {
                fn default() -> Self {
                    <Design as $crate::RegisterFile>::init()
                }
            }

            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct Conflicts {
                $( pub $reg: $crate::register_file!(@rwset $kind), )*
            }

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum Field {
                $( $reg, )*
            }

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct Design;

            pub mod reg {
                $(
                    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
                    pub struct $reg;
                )*
            }

            $(
                impl $crate::Register<Design> for reg::$reg {
                    const FIELD: Field = Field::$reg;
                    const NAME: &'static str = stringify!($reg);
                    type Value = $ty;
                    type RwSet = $crate::register_file!(@rwset $kind);

                    #[inline]
                    fn value(state: &State) -> &Self::Value {
                        &state.$reg
                    }

                    #[inline]
                    fn value_mut(state: &mut State) -> &mut Self::Value {
                        &mut state.$reg
                    }

                    #[inline]
                    fn rwset(conflicts: &Conflicts) -> &Self::RwSet {
                        &conflicts.$reg
                    }

                    #[inline]
                    fn rwset_mut(conflicts: &mut Conflicts) -> &mut Self::RwSet {
                        &mut conflicts.$reg
                    }
                }
            )*

            impl $crate::RegisterFile for Design {
                type State = State;
                type Conflicts = Conflicts;
                type Field = Field;

                const REGISTERS: &'static [$crate::RegisterInfo<Field>] = &[
                    $(
                        $crate::RegisterInfo {
                            field: Field::$reg,
                            name: stringify!($reg),
                            width: <$ty as $crate::Packable>::WIDTH,
                            kind: $crate::register_file!(@kind $kind),
                        },
                    )*
                ];

                fn init() -> State {
                    State { $( $reg: $init, )* }
                }

                fn copy_field(
                    field: Field,
                    dst: &mut $crate::Log<Self>,
                    src: &$crate::Log<Self>,
                ) {
                    match field {
                        $(
                            Field::$reg => {
                                dst.state.$reg.clone_from(&src.state.$reg);
                                dst.rwset.$reg = src.rwset.$reg;
                            }
                        )*
                    }
                }

                fn sample(state: &State, field: Field) -> String {
                    match field {
                        $(
                            Field::$reg => $crate::pack::<$ty, { <$ty as $crate::Packable>::WIDTH }>(
                                &state.$reg,
                            )
                            .to_bin_string(),
                        )*
                    }
                }

                fn render(state: &State, field: Field) -> String {
                    match field {
                        $( Field::$reg => $crate::repr(&state.$reg, $crate::FmtOpts::default()), )*
                    }
                }
            }
        }
    };
}
