//! Storage words backing [`Bits`](crate::Bits) values.
//!
//! Native unsigned integers cover widths up to 128 bits; wider values live in
//! a [`BigUint`]. Every operation here is unmasked: callers in `bits` mask the
//! result back to the declared width.

use std::fmt;
use std::hash::Hash;

use num_bigint::BigUint;

/// Storage capacity reported by unbounded (arbitrary-precision) words.
pub const UNBOUNDED: u32 = u32::MAX;

/// Unsigned integer storage for a bit-vector.
///
/// Implemented for `u8`, `u16`, `u32`, `u64`, `u128` and [`BigUint`]. A
/// different arbitrary-precision backend can be injected by implementing this
/// trait and mapping widths to it through [`Storage`](crate::Storage).
pub trait Word:
    Clone + Default + Eq + Ord + Hash + fmt::Debug + fmt::Display + fmt::LowerHex + fmt::Binary
{
    /// Number of bits the word can hold, or [`UNBOUNDED`].
    const CAPACITY: u32;

    /// Word with the low `width` bits set.
    fn ones(width: u32) -> Self;

    /// Truncating conversion from `u128`.
    fn from_u128(value: u128) -> Self;

    /// Low 128 bits of the word.
    fn low_u128(&self) -> u128;

    /// Truncating conversion from an arbitrary-precision integer.
    fn from_biguint(value: &BigUint) -> Self;

    /// Exact conversion to an arbitrary-precision integer.
    fn to_biguint(&self) -> BigUint;

    /// Bitwise AND.
    #[must_use]
    fn and(&self, rhs: &Self) -> Self;

    /// Bitwise OR.
    #[must_use]
    fn or(&self, rhs: &Self) -> Self;

    /// Bitwise XOR.
    #[must_use]
    fn xor(&self, rhs: &Self) -> Self;

    /// Addition, wrapping at the storage capacity.
    #[must_use]
    fn add_wrapping(&self, rhs: &Self) -> Self;

    /// Two's-complement subtraction modulo `mask + 1`, where `rhs <= mask`.
    ///
    /// The result may exceed `mask` and must be masked by the caller.
    #[must_use]
    fn sub_wrapping(&self, rhs: &Self, mask: &Self) -> Self;

    /// Left shift; shifting past the capacity yields zero.
    #[must_use]
    fn shift_left(&self, shift: u32) -> Self;

    /// Logical right shift; shifting past the capacity yields zero.
    #[must_use]
    fn shift_right(&self, shift: u32) -> Self;

    /// Returns bit `index` (bit 0 is the least significant).
    fn test_bit(&self, index: u32) -> bool;

    /// Returns `true` when every bit is clear.
    fn is_zero(&self) -> bool;
}

/// Converts between storage words, truncating to the destination capacity.
pub(crate) fn convert<A: Word, B: Word>(value: &A) -> B {
    if A::CAPACITY == UNBOUNDED && B::CAPACITY == UNBOUNDED {
        B::from_biguint(&value.to_biguint())
    } else {
        B::from_u128(value.low_u128())
    }
}

fn low_u128_of(value: &BigUint) -> u128 {
    let mut digits = value.iter_u64_digits();
    let lo = digits.next().unwrap_or(0);
    let hi = digits.next().unwrap_or(0);
    (u128::from(hi) << 64) | u128::from(lo)
}

macro_rules! native_word {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Word for $ty {
                const CAPACITY: u32 = <$ty>::BITS;

                #[inline]
                fn ones(width: u32) -> Self {
                    if width >= Self::CAPACITY {
                        <$ty>::MAX
                    } else {
                        (1 << width) - 1
                    }
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_u128(value: u128) -> Self {
                    value as $ty
                }

                #[inline]
                fn low_u128(&self) -> u128 {
                    u128::from(*self)
                }

                #[inline]
                fn from_biguint(value: &BigUint) -> Self {
                    Self::from_u128(low_u128_of(value))
                }

                #[inline]
                fn to_biguint(&self) -> BigUint {
                    BigUint::from(*self)
                }

                #[inline]
                fn and(&self, rhs: &Self) -> Self {
                    self & rhs
                }

                #[inline]
                fn or(&self, rhs: &Self) -> Self {
                    self | rhs
                }

                #[inline]
                fn xor(&self, rhs: &Self) -> Self {
                    self ^ rhs
                }

                #[inline]
                fn add_wrapping(&self, rhs: &Self) -> Self {
                    self.wrapping_add(*rhs)
                }

                #[inline]
                fn sub_wrapping(&self, rhs: &Self, _mask: &Self) -> Self {
                    self.wrapping_sub(*rhs)
                }

                #[inline]
                fn shift_left(&self, shift: u32) -> Self {
                    self.checked_shl(shift).unwrap_or(0)
                }

                #[inline]
                fn shift_right(&self, shift: u32) -> Self {
                    self.checked_shr(shift).unwrap_or(0)
                }

                #[inline]
                fn test_bit(&self, index: u32) -> bool {
                    (self.shift_right(index) & 1) == 1
                }

                #[inline]
                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

native_word!(u8, u16, u32, u64, u128);

impl Word for BigUint {
    const CAPACITY: u32 = UNBOUNDED;

    fn ones(width: u32) -> Self {
        (Self::from(1_u8) << width) - 1_u8
    }

    fn from_u128(value: u128) -> Self {
        Self::from(value)
    }

    fn low_u128(&self) -> u128 {
        low_u128_of(self)
    }

    fn from_biguint(value: &BigUint) -> Self {
        value.clone()
    }

    fn to_biguint(&self) -> BigUint {
        self.clone()
    }

    fn and(&self, rhs: &Self) -> Self {
        self & rhs
    }

    fn or(&self, rhs: &Self) -> Self {
        self | rhs
    }

    fn xor(&self, rhs: &Self) -> Self {
        self ^ rhs
    }

    fn add_wrapping(&self, rhs: &Self) -> Self {
        self + rhs
    }

    fn sub_wrapping(&self, rhs: &Self, mask: &Self) -> Self {
        // x - y == x + !y + 1 (mod 2^w)
        self + (mask ^ rhs) + 1_u8
    }

    fn shift_left(&self, shift: u32) -> Self {
        self << shift
    }

    fn shift_right(&self, shift: u32) -> Self {
        self >> shift
    }

    fn test_bit(&self, index: u32) -> bool {
        Self::bit(self, u64::from(index))
    }

    fn is_zero(&self) -> bool {
        self.bits() == 0
    }
}
