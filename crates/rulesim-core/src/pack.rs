//! Bit-serialization of structured values.
//!
//! Values are packed most-significant chunk first: element 0 of a sequence
//! and the first field of an aggregate land in the highest bits. Unpacking
//! walks the same order, so `unpack(pack(v)) == v` for every packable `v`.

use std::fmt;

use crate::bits::{Bits, Storage, Width};
use crate::display::{low_byte, render_elements, render_string, FmtOpts};

/// A value with a fixed bit-level representation.
pub trait Packable: Sized {
    /// Number of bits in the packed form.
    const WIDTH: u32;

    /// Appends the packed form below the chunks already in `packer`.
    fn pack_into<const W: u32>(&self, packer: &mut Packer<W>)
    where
        Width<W>: Storage;

    /// Reads a value from the next most significant chunk of `unpacker`.
    fn unpack_from<const W: u32>(unpacker: &mut Unpacker<'_, W>) -> Self
    where
        Width<W>: Storage;

    /// Writes the value for a human reader.
    fn render(&self, out: &mut dyn fmt::Write, opts: FmtOpts) -> fmt::Result;

    /// Writes a sequence of values as `[a; b; c]`.
    fn render_seq(items: &[Self], out: &mut dyn fmt::Write, opts: FmtOpts) -> fmt::Result {
        render_elements(items, out, opts)
    }
}

/// Accumulates chunks into a `W`-bit vector, first chunk highest.
#[derive(Debug, Clone)]
pub struct Packer<const W: u32>
where
    Width<W>: Storage,
{
    acc: Bits<W>,
    filled: u32,
}

impl<const W: u32> Default for Packer<W>
where
    Width<W>: Storage,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: u32> Packer<W>
where
    Width<W>: Storage,
{
    /// Empty packer.
    #[must_use]
    pub fn new() -> Self {
        Self { acc: Bits::zero(), filled: 0 }
    }

    /// Appends `chunk` as the new least significant bits.
    pub fn push<const N: u32>(&mut self, chunk: &Bits<N>)
    where
        Width<N>: Storage,
    {
        debug_assert!(self.filled + N <= W, "packed chunks overflow {W} bits");
        let shifted = self.acc.lsl(N);
        self.acc = &shifted | &chunk.resize::<W>();
        self.filled += N;
    }

    /// Bits pushed so far.
    #[must_use]
    pub const fn filled(&self) -> u32 {
        self.filled
    }

    /// Returns the packed vector.
    #[must_use]
    pub fn finish(self) -> Bits<W> {
        debug_assert_eq!(self.filled, W, "packed chunks do not fill {W} bits");
        self.acc
    }
}

/// Reads chunks back out of a packed vector, highest chunk first.
#[derive(Debug)]
pub struct Unpacker<'a, const W: u32>
where
    Width<W>: Storage,
{
    source: &'a Bits<W>,
    remaining: u32,
}

impl<'a, const W: u32> Unpacker<'a, W>
where
    Width<W>: Storage,
{
    /// Starts reading at the most significant bit of `source`.
    #[must_use]
    pub const fn new(source: &'a Bits<W>) -> Self {
        Self { source, remaining: W }
    }

    /// Takes the next `N` bits.
    pub fn pop<const N: u32>(&mut self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        debug_assert!(N <= self.remaining, "unpacking past the end of a {W}-bit vector");
        self.remaining -= N;
        self.source.lsr(self.remaining).resize()
    }

    /// Bits not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// Packs `value` into a bit-vector of exactly its width.
#[must_use]
pub fn pack<T: Packable, const W: u32>(value: &T) -> Bits<W>
where
    Width<W>: Storage,
{
    const { assert!(T::WIDTH == W, "packed width does not match the value's width") };
    let mut packer = Packer::new();
    value.pack_into(&mut packer);
    packer.finish()
}

/// Rebuilds a value from its packed form.
#[must_use]
pub fn unpack<T: Packable, const W: u32>(bits: &Bits<W>) -> T
where
    Width<W>: Storage,
{
    const { assert!(T::WIDTH == W, "packed width does not match the value's width") };
    let mut unpacker = Unpacker::new(bits);
    T::unpack_from(&mut unpacker)
}

/// Returns `seq` with element `index` replaced; out-of-range indices leave
/// the sequence unchanged.
#[must_use]
pub fn replace<T, const N: usize>(mut seq: [T; N], index: usize, value: T) -> [T; N] {
    if let Some(slot) = seq.get_mut(index) {
        *slot = value;
    }
    seq
}

impl<const N: u32> Packable for Bits<N>
where
    Width<N>: Storage,
{
    const WIDTH: u32 = N;

    fn pack_into<const W: u32>(&self, packer: &mut Packer<W>)
    where
        Width<W>: Storage,
    {
        packer.push::<N>(self);
    }

    fn unpack_from<const W: u32>(unpacker: &mut Unpacker<'_, W>) -> Self
    where
        Width<W>: Storage,
    {
        unpacker.pop::<N>()
    }

    fn render(&self, out: &mut dyn fmt::Write, opts: FmtOpts) -> fmt::Result {
        write!(out, "{}", self.fmt_style(opts.style))
    }

    fn render_seq(items: &[Self], out: &mut dyn fmt::Write, opts: FmtOpts) -> fmt::Result {
        if N == 8 && opts.strings {
            render_string(items.iter().map(low_byte), out)
        } else {
            render_elements(items, out, opts)
        }
    }
}

impl Packable for bool {
    const WIDTH: u32 = 1;

    fn pack_into<const W: u32>(&self, packer: &mut Packer<W>)
    where
        Width<W>: Storage,
    {
        packer.push::<1>(&Bits::<1>::from(*self));
    }

    fn unpack_from<const W: u32>(unpacker: &mut Unpacker<'_, W>) -> Self
    where
        Width<W>: Storage,
    {
        unpacker.pop::<1>().into()
    }

    fn render(&self, out: &mut dyn fmt::Write, opts: FmtOpts) -> fmt::Result {
        Bits::<1>::from(*self).render(out, opts)
    }
}

#[allow(clippy::cast_possible_truncation)]
impl<T: Packable, const N: usize> Packable for [T; N] {
    const WIDTH: u32 = T::WIDTH * N as u32;

    fn pack_into<const W: u32>(&self, packer: &mut Packer<W>)
    where
        Width<W>: Storage,
    {
        for element in self {
            element.pack_into(packer);
        }
    }

    fn unpack_from<const W: u32>(unpacker: &mut Unpacker<'_, W>) -> Self
    where
        Width<W>: Storage,
    {
        std::array::from_fn(|_| T::unpack_from(unpacker))
    }

    fn render(&self, out: &mut dyn fmt::Write, opts: FmtOpts) -> fmt::Result {
        T::render_seq(self, out, opts)
    }
}

/// Declares a struct whose fields pack in declaration order, first field
/// most significant.
///
/// ```
/// use rulesim_core::{pack, packable, unpack, Bits};
///
/// packable! {
///     #[derive(Debug, Clone, PartialEq, Eq)]
///     pub struct Request {
///         pub write: bool,
///         pub addr: Bits<7>,
///     }
/// }
///
/// let req = Request { write: true, addr: Bits::new(5) };
/// let packed: Bits<8> = pack(&req);
/// assert_eq!(packed.to_u64(), 0x85);
/// assert_eq!(unpack::<Request, 8>(&packed), req);
/// ```
#[macro_export]
macro_rules! packable {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::Packable for $name {
            const WIDTH: u32 = 0 $( + <$ty as $crate::Packable>::WIDTH )*;

            #[allow(unused_variables)]
            fn pack_into<const W: u32>(&self, packer: &mut $crate::Packer<W>)
            where
                $crate::Width<W>: $crate::Storage,
            {
                $( $crate::Packable::pack_into(&self.$field, packer); )*
            }

            #[allow(unused_variables)]
            fn unpack_from<const W: u32>(unpacker: &mut $crate::Unpacker<'_, W>) -> Self
            where
                $crate::Width<W>: $crate::Storage,
            {
                Self {
                    $( $field: <$ty as $crate::Packable>::unpack_from(unpacker), )*
                }
            }

            #[allow(unused_mut, unused_assignments)]
            fn render(
                &self,
                out: &mut dyn ::std::fmt::Write,
                opts: $crate::FmtOpts,
            ) -> ::std::fmt::Result {
                out.write_str("{")?;
                let mut sep = " ";
                $(
                    write!(out, "{sep}{} = ", stringify!($field))?;
                    $crate::Packable::render(&self.$field, out, opts)?;
                    sep = "; ";
                )*
                out.write_str(" }")
            }
        }
    };
}
