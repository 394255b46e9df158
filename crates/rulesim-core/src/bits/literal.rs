//! Compile-time construction of bit-vector literals.
//!
//! [`bits!`](crate::bits!) evaluates the parser below in a `const` item, so a
//! malformed or overflowing literal stops the build.

use crate::LiteralError;

/// Largest value representable in `width` bits, capped at `u128::MAX`.
#[must_use]
pub const fn max_value(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1 << width) - 1
    }
}

/// Parses `digits` in `radix` (2, 10 or 16) as a `width`-bit value.
///
/// Underscores are ignored. Values are limited to 128 bits even for wider
/// declared widths.
///
/// # Errors
///
/// Returns a [`LiteralError`] for empty input, bad digits, an unsupported
/// radix or a value that does not fit.
#[allow(clippy::cast_lossless)]
pub const fn parse(digits: &str, radix: u32, width: u32) -> Result<u128, LiteralError> {
    if !matches!(radix, 2 | 10 | 16) {
        return Err(LiteralError::UnsupportedRadix(radix));
    }
    let bytes = digits.as_bytes();
    let max = max_value(width);
    let base = radix as u128;
    let mut value: u128 = 0;
    let mut seen = false;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        i += 1;
        let digit = match c {
            b'_' => continue,
            b'0'..=b'9' => (c - b'0') as u128,
            b'a'..=b'f' => (c - b'a' + 10) as u128,
            b'A'..=b'F' => (c - b'A' + 10) as u128,
            _ => return Err(LiteralError::InvalidDigit),
        };
        if digit >= base {
            return Err(LiteralError::InvalidDigit);
        }
        seen = true;
        let Some(scaled) = value.checked_mul(base) else {
            return Err(LiteralError::TooWide);
        };
        let Some(next) = scaled.checked_add(digit) else {
            return Err(LiteralError::TooWide);
        };
        if next > max {
            return Err(LiteralError::Overflow);
        }
        value = next;
    }
    if seen {
        Ok(value)
    } else {
        Err(LiteralError::Empty)
    }
}

/// Builds a [`Bits`](crate::Bits) literal checked at compile time.
///
/// ```
/// use rulesim_core::{bits, Bits};
///
/// let a: Bits<8> = bits!(8; 0x2a);
/// let b: Bits<8> = bits!(8; hex "2A");
/// let c: Bits<4> = bits!(4; bin "1010");
/// let d: Bits<10> = bits!(10; dec "1_000");
/// assert_eq!(a, b);
/// assert_eq!(c.to_u64(), 10);
/// assert_eq!(d.to_u64(), 1000);
/// ```
#[macro_export]
macro_rules! bits {
    ($width:literal; bin $digits:literal) => {
        $crate::bits!(@parse $width, 2, $digits)
    };
    ($width:literal; dec $digits:literal) => {
        $crate::bits!(@parse $width, 10, $digits)
    };
    ($width:literal; hex $digits:literal) => {
        $crate::bits!(@parse $width, 16, $digits)
    };
    (@parse $width:literal, $radix:literal, $digits:literal) => {{
        const VALUE: u128 = match $crate::bits::literal::parse($digits, $radix, $width) {
            Ok(value) => value,
            Err(error) => error.reject(),
        };
        $crate::Bits::<$width>::from_u128(VALUE)
    }};
    ($width:literal; $value:expr) => {{
        const VALUE: u128 = $value;
        const _: () = assert!(
            VALUE <= $crate::bits::literal::max_value($width),
            "literal overflows its declared width"
        );
        $crate::Bits::<$width>::from_u128(VALUE)
    }};
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{max_value, parse};
    use crate::{Bits, LiteralError};

    #[rstest]
    #[case("1010", 2, 4, Ok(10))]
    #[case("ff", 16, 8, Ok(255))]
    #[case("FF", 16, 8, Ok(255))]
    #[case("1_000", 10, 10, Ok(1000))]
    #[case("100", 16, 8, Err(LiteralError::Overflow))]
    #[case("12", 2, 8, Err(LiteralError::InvalidDigit))]
    #[case("_", 10, 8, Err(LiteralError::Empty))]
    #[case("7", 8, 8, Err(LiteralError::UnsupportedRadix(8)))]
    #[case("1", 10, 0, Err(LiteralError::Overflow))]
    #[case("0", 10, 0, Ok(0))]
    fn parses_digit_sequences(
        #[case] digits: &str,
        #[case] radix: u32,
        #[case] width: u32,
        #[case] expected: Result<u128, LiteralError>,
    ) {
        assert_eq!(parse(digits, radix, width), expected);
    }

    #[test]
    fn values_beyond_128_bits_are_rejected() {
        let digits = "1".repeat(129);
        assert_eq!(parse(&digits, 2, 200), Err(LiteralError::TooWide));
        assert_eq!(max_value(200), u128::MAX);
    }

    #[test]
    fn macro_builds_masked_values() {
        let from_expr: Bits<12> = crate::bits!(12; 0xabc);
        let from_hex: Bits<12> = crate::bits!(12; hex "ABC");
        let wide: Bits<160> = crate::bits!(160; dec "340282366920938463463374607431768211455");
        assert_eq!(from_expr, from_hex);
        assert_eq!(wide.to_u128(), u128::MAX);
    }
}
