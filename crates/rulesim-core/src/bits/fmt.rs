use std::fmt;

use super::{Bits, Storage, Width};

/// Rendering style for [`Bits::fmt_style`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FmtStyle {
    /// Binary, plus hex and decimal for widths up to 64 bits.
    #[default]
    Full,
    /// `W'b` followed by every bit.
    Bin,
    /// `W'x` followed by the shortest hex form.
    Hex,
    /// `W'd` followed by the decimal value.
    Dec,
}

/// A [`Bits`] value paired with the style used to print it.
pub struct Styled<'a, const W: u32>
where
    Width<W>: Storage,
{
    bits: &'a Bits<W>,
    style: FmtStyle,
}

impl<const W: u32> Bits<W>
where
    Width<W>: Storage,
{
    /// Exactly `W` binary digits, most significant first.
    #[must_use]
    pub fn to_bin_string(&self) -> String {
        if W == 0 {
            return String::new();
        }
        format!("{:0width$b}", self.0, width = W as usize)
    }

    /// Prints the value in a chosen style.
    #[must_use]
    pub const fn fmt_style(&self, style: FmtStyle) -> Styled<'_, W> {
        Styled { bits: self, style }
    }
}

impl<const W: u32> fmt::Display for Styled<'_, W>
where
    Width<W>: Storage,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = &self.bits.0;
        match self.style {
            FmtStyle::Bin => write!(f, "{W}'b{}", self.bits.to_bin_string()),
            FmtStyle::Hex => write!(f, "{W}'x{word:x}"),
            FmtStyle::Dec => write!(f, "{W}'d{word}"),
            FmtStyle::Full if W <= 64 => {
                write!(f, "{W}'b{} (0x{word:x}, {word})", self.bits.to_bin_string())
            }
            FmtStyle::Full => write!(f, "{W}'x{word:x}"),
        }
    }
}

impl<const W: u32> fmt::Display for Bits<W>
where
    Width<W>: Storage,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fmt_style(FmtStyle::Full), f)
    }
}

impl<const W: u32> fmt::Debug for Bits<W>
where
    Width<W>: Storage,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<const W: u32> fmt::Binary for Bits<W>
where
    Width<W>: Storage,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bin_string())
    }
}

impl<const W: u32> fmt::LowerHex for Bits<W>
where
    Width<W>: Storage,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::FmtStyle;
    use crate::Bits;

    #[rstest]
    #[case(FmtStyle::Full, "5'b00101 (0x5, 5)")]
    #[case(FmtStyle::Bin, "5'b00101")]
    #[case(FmtStyle::Hex, "5'x5")]
    #[case(FmtStyle::Dec, "5'd5")]
    fn styles_render_width_prefix(#[case] style: FmtStyle, #[case] expected: &str) {
        assert_eq!(Bits::<5>::new(5).fmt_style(style).to_string(), expected);
    }

    #[test]
    fn wide_values_default_to_hex() {
        let value = Bits::<96>::from_u128(0xdead_beef);
        assert_eq!(value.to_string(), "96'xdeadbeef");
    }

    #[test]
    fn zero_width_prints_no_digits() {
        assert_eq!(Bits::<0>::zero().to_bin_string(), "");
        assert_eq!(format!("{:b}", Bits::<0>::zero()), "");
    }

    #[test]
    fn binary_formatting_keeps_leading_zeros() {
        assert_eq!(format!("{:b}", Bits::<8>::new(3)), "00000011");
        assert_eq!(format!("{:x}", Bits::<12>::new(0xabc)), "abc");
    }
}
