//! Fixed-width bit-vectors with hardware arithmetic semantics.
//!
//! A [`Bits<W>`] holds an unsigned integer of exactly `W` bits. The backing
//! word is chosen at compile time from the width (see [`Storage`]) and every
//! producing operation masks its result back to `W` bits, so a stored value
//! never exceeds `2^W - 1`. Signed operations reinterpret the same pattern as
//! two's complement using bit `W - 1` as the sign.
//!
//! Width relationships between operands (concatenation, truncation,
//! extension, slicing) are checked by `const` assertions, so a mismatch fails
//! the build instead of the simulation.

mod fmt;
pub mod literal;
mod width;
mod word;

use std::cmp::Ordering;
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl,
    ShlAssign, Shr, ShrAssign, Sub, SubAssign,
};

use num_bigint::BigUint;

pub use self::fmt::{FmtStyle, Styled};
pub use width::{Repr, Storage, Width, MAX_WIDTH};
pub use word::{Word, UNBOUNDED};

/// An unsigned integer of exactly `W` bits.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bits<const W: u32>(Repr<W>)
where
    Width<W>: Storage;

impl<const W: u32> Copy for Bits<W>
where
    Width<W>: Storage,
    Repr<W>: Copy,
{
}

/// The single zero-width value.
pub type Unit = Bits<0>;

impl<const W: u32> Bits<W>
where
    Width<W>: Storage,
{
    /// Declared width in bits.
    pub const WIDTH: u32 = W;

    #[inline]
    fn mask() -> Repr<W> {
        <Repr<W> as Word>::ones(W)
    }

    #[inline]
    fn masked(word: Repr<W>) -> Self {
        Self(word.and(&Self::mask()))
    }

    /// All-zero value.
    #[must_use]
    pub fn zero() -> Self {
        Self(Repr::<W>::default())
    }

    /// All-ones value (`2^W - 1`).
    #[must_use]
    pub fn ones() -> Self {
        Self(Self::mask())
    }

    /// Builds a value from the low `W` bits of `value`.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self::from_u128(u128::from(value))
    }

    /// Builds a value from the low `W` bits of `value`.
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        Self::masked(<Repr<W> as Word>::from_u128(value))
    }

    /// Builds a value from the low `W` bits of an arbitrary-precision integer.
    #[must_use]
    pub fn from_biguint(value: &BigUint) -> Self {
        Self::masked(<Repr<W> as Word>::from_biguint(value))
    }

    /// Builds a value from a storage word, dropping bits at or above `W`.
    #[must_use]
    pub fn from_word(word: Repr<W>) -> Self {
        Self::masked(word)
    }

    /// Wraps a storage word that must already fit in `W` bits.
    ///
    /// # Panics
    ///
    /// Panics when `word` exceeds `2^W - 1`; continuing with such a value
    /// would silently corrupt the simulation.
    #[must_use]
    #[track_caller]
    pub fn from_raw(word: Repr<W>) -> Self {
        let bits = Self(word);
        bits.check_invariant();
        bits
    }

    /// Asserts the masking invariant.
    ///
    /// # Panics
    ///
    /// Panics when the stored word exceeds `2^W - 1`.
    #[track_caller]
    pub fn check_invariant(&self) {
        assert!(
            self.0 <= Self::mask(),
            "bit-vector invariant violated: {:x} does not fit in {W} bits",
            self.0
        );
    }

    /// Borrows the storage word.
    #[must_use]
    pub const fn word(&self) -> &Repr<W> {
        &self.0
    }

    /// Consumes the value and returns its storage word.
    #[must_use]
    pub fn into_word(self) -> Repr<W> {
        self.0
    }

    /// Low 64 bits of the value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_u64(&self) -> u64 {
        self.0.low_u128() as u64
    }

    /// Low 128 bits of the value.
    #[must_use]
    pub fn to_u128(&self) -> u128 {
        self.0.low_u128()
    }

    /// Exact value as an arbitrary-precision integer.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        self.0.to_biguint()
    }

    /// Returns `true` when every bit is clear.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` when any bit is set.
    #[must_use]
    pub fn to_bool(&self) -> bool {
        !self.is_zero()
    }

    /// Returns bit `index`; indices at or above `W` read as zero.
    #[must_use]
    pub fn bit(&self, index: u32) -> bool {
        index < W && self.0.test_bit(index)
    }

    /// Extracts the bit selected by a bit-vector index.
    #[must_use]
    pub fn index<const I: u32>(&self, idx: &Bits<I>) -> Bits<1>
    where
        Width<I>: Storage,
    {
        Bits::<1>::from(self.bit(idx.to_u32_saturating()))
    }

    /// Value as a shift or index amount; anything above `u32::MAX` clamps.
    fn to_u32_saturating(&self) -> u32 {
        if self.0.shift_right(32).is_zero() {
            u32::try_from(self.0.low_u128()).unwrap_or(u32::MAX)
        } else {
            u32::MAX
        }
    }

    /// Most significant declared bit; zero for a zero-width value.
    #[must_use]
    pub fn msb(&self) -> Bits<1> {
        Bits::<1>::from(self.is_negative())
    }

    #[inline]
    fn is_negative(&self) -> bool {
        W > 0 && self.0.test_bit(W - 1)
    }

    /// Logical left shift by `shift` bits.
    #[must_use]
    pub fn lsl(&self, shift: u32) -> Self {
        Self::masked(self.0.shift_left(shift))
    }

    /// Logical right shift by `shift` bits.
    #[must_use]
    pub fn lsr(&self, shift: u32) -> Self {
        Self(self.0.shift_right(shift))
    }

    /// Arithmetic right shift, filling with bit `W - 1`.
    #[must_use]
    pub fn asr(&self, shift: u32) -> Self {
        let shifted = self.0.shift_right(shift);
        if self.is_negative() {
            let mask = Self::mask();
            let fill = mask.xor(&mask.shift_right(shift));
            Self(shifted.or(&fill))
        } else {
            Self(shifted)
        }
    }

    /// Compares both operands as two's-complement integers.
    #[must_use]
    pub fn signed_cmp(&self, rhs: &Self) -> Ordering {
        match (self.is_negative(), rhs.is_negative()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.0.cmp(&rhs.0),
        }
    }

    /// Signed `<`.
    #[must_use]
    pub fn slt(&self, rhs: &Self) -> bool {
        self.signed_cmp(rhs) == Ordering::Less
    }

    /// Signed `<=`.
    #[must_use]
    pub fn sle(&self, rhs: &Self) -> bool {
        self.signed_cmp(rhs) != Ordering::Greater
    }

    /// Signed `>`.
    #[must_use]
    pub fn sgt(&self, rhs: &Self) -> bool {
        self.signed_cmp(rhs) == Ordering::Greater
    }

    /// Signed `>=`.
    #[must_use]
    pub fn sge(&self, rhs: &Self) -> bool {
        self.signed_cmp(rhs) != Ordering::Less
    }

    /// Two's-complement reading of the bit pattern.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_i128(&self) -> i128 {
        const { assert!(W <= 128, "signed view needs a width of at most 128 bits") };
        if W == 0 {
            return 0;
        }
        // Top-align the pattern so the native sign bit is bit W - 1.
        let shift = 128 - W;
        ((self.to_u128() << shift) as i128) >> shift
    }

    /// Builds a value from the low `W` bits of a two's-complement integer.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn from_i128(value: i128) -> Self {
        const { assert!(W <= 128, "signed view needs a width of at most 128 bits") };
        Self::from_u128(value as u128)
    }

    pub(crate) fn resize<const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        Bits::<N>::masked(word::convert(&self.0))
    }

    /// Keeps the low `N` bits.
    #[must_use]
    pub fn truncate<const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(N <= W, "truncation target is wider than the source") };
        self.resize()
    }

    /// Zero-extends on the left to `N` bits.
    #[must_use]
    pub fn zext<const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(N >= W, "extension target is narrower than the source") };
        self.resize()
    }

    /// Zero-extends on the right to `N` bits (the value moves to the top).
    #[must_use]
    pub fn zextr<const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(N >= W, "extension target is narrower than the source") };
        self.resize::<N>().lsl(N - W)
    }

    /// Sign-extends to `N` bits, replicating bit `W - 1`.
    #[must_use]
    pub fn sext<const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(N >= W, "extension target is narrower than the source") };
        let widened = self.resize::<N>();
        if self.is_negative() {
            let high = <Repr<N> as Word>::ones(N).xor(&<Repr<N> as Word>::ones(W));
            Bits(widened.0.or(&high))
        } else {
            widened
        }
    }

    /// Concatenates `self` (high bits) with `lo` (low bits).
    #[must_use]
    pub fn concat<const L: u32, const N: u32>(&self, lo: &Bits<L>) -> Bits<N>
    where
        Width<L>: Storage,
        Width<N>: Storage,
    {
        const { assert!(W + L == N, "concatenation width must equal the sum of operand widths") };
        let hi = self.resize::<N>();
        let lo = lo.resize::<N>();
        Bits::<N>::masked(hi.0.shift_left(L).or(&lo.0))
    }

    /// Reads the `N`-bit field starting at bit `OFFSET`.
    #[must_use]
    pub fn slice<const OFFSET: u32, const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(OFFSET + N <= W, "slice exceeds the source width") };
        self.lsr(OFFSET).resize()
    }

    /// Reads the `N`-bit field starting at a runtime offset; bits past the top
    /// read as zero.
    #[must_use]
    pub fn islice<const N: u32>(&self, offset: u32) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(N <= W, "slice is wider than the source") };
        self.lsr(offset).resize()
    }

    /// Returns a copy with the `N`-bit field at `OFFSET` replaced by `repl`.
    #[must_use]
    pub fn slice_subst<const OFFSET: u32, const N: u32>(&self, repl: &Bits<N>) -> Self
    where
        Width<N>: Storage,
    {
        const { assert!(OFFSET + N <= W, "slice exceeds the source width") };
        let field = <Repr<W> as Word>::ones(N).shift_left(OFFSET);
        let cleared = self.0.and(&Self::mask().xor(&field));
        let placed = repl.resize::<W>().0.shift_left(OFFSET);
        Self::masked(cleared.or(&placed))
    }

    /// Concatenates `TIMES` copies of the value.
    #[must_use]
    pub fn repeat<const TIMES: u32, const N: u32>(&self) -> Bits<N>
    where
        Width<N>: Storage,
    {
        const { assert!(W * TIMES == N, "repeat width must equal width times count") };
        let unit = self.resize::<N>();
        let mut acc = Repr::<N>::default();
        for _ in 0..TIMES {
            acc = acc.shift_left(W).or(&unit.0);
        }
        Bits::<N>::masked(acc)
    }
}

impl From<bool> for Bits<1> {
    fn from(value: bool) -> Self {
        Self(u8::from(value))
    }
}

impl From<Bits<1>> for bool {
    fn from(value: Bits<1>) -> Self {
        value.0 != 0
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $assign:ident, $assign_method:ident, |$lhs:ident, $rhs:ident| $body:expr) => {
        impl<const W: u32> $trait for Bits<W>
        where
            Width<W>: Storage,
        {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: Self) -> Self {
                let ($lhs, $rhs) = (&self, &rhs);
                $body
            }
        }

        impl<const W: u32> $trait for &Bits<W>
        where
            Width<W>: Storage,
        {
            type Output = Bits<W>;

            #[inline]
            fn $method(self, rhs: Self) -> Bits<W> {
                let ($lhs, $rhs) = (self, rhs);
                $body
            }
        }

        impl<const W: u32> $assign for Bits<W>
        where
            Width<W>: Storage,
        {
            #[inline]
            fn $assign_method(&mut self, rhs: Self) {
                let ($lhs, $rhs) = (&*self, &rhs);
                *self = $body;
            }
        }
    };
}

binary_op!(BitAnd, bitand, BitAndAssign, bitand_assign, |a, b| Bits(a.0.and(&b.0)));
binary_op!(BitOr, bitor, BitOrAssign, bitor_assign, |a, b| Bits(a.0.or(&b.0)));
binary_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, |a, b| Bits(a.0.xor(&b.0)));
binary_op!(Add, add, AddAssign, add_assign, |a, b| Bits::masked(a.0.add_wrapping(&b.0)));
binary_op!(Sub, sub, SubAssign, sub_assign, |a, b| Bits::masked(
    a.0.sub_wrapping(&b.0, &Bits::<W>::mask())
));

impl<const W: u32> Not for Bits<W>
where
    Width<W>: Storage,
{
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        !&self
    }
}

impl<const W: u32> Not for &Bits<W>
where
    Width<W>: Storage,
{
    type Output = Bits<W>;

    #[inline]
    fn not(self) -> Bits<W> {
        Bits(Bits::<W>::mask().xor(&self.0))
    }
}

impl<const W: u32> Shl<u32> for Bits<W>
where
    Width<W>: Storage,
{
    type Output = Self;

    #[inline]
    fn shl(self, shift: u32) -> Self {
        self.lsl(shift)
    }
}

impl<const W: u32> Shr<u32> for Bits<W>
where
    Width<W>: Storage,
{
    type Output = Self;

    #[inline]
    fn shr(self, shift: u32) -> Self {
        self.lsr(shift)
    }
}

impl<const W: u32> ShlAssign<u32> for Bits<W>
where
    Width<W>: Storage,
{
    #[inline]
    fn shl_assign(&mut self, shift: u32) {
        *self = self.lsl(shift);
    }
}

impl<const W: u32> ShrAssign<u32> for Bits<W>
where
    Width<W>: Storage,
{
    #[inline]
    fn shr_assign(&mut self, shift: u32) {
        *self = self.lsr(shift);
    }
}

impl<const W: u32, const S: u32> Shl<Bits<S>> for Bits<W>
where
    Width<W>: Storage,
    Width<S>: Storage,
{
    type Output = Self;

    #[inline]
    fn shl(self, shift: Bits<S>) -> Self {
        self.lsl(shift.to_u32_saturating())
    }
}

impl<const W: u32, const S: u32> Shr<Bits<S>> for Bits<W>
where
    Width<W>: Storage,
    Width<S>: Storage,
{
    type Output = Self;

    #[inline]
    fn shr(self, shift: Bits<S>) -> Self {
        self.lsr(shift.to_u32_saturating())
    }
}
