//! Human-readable output for rule bodies and register dumps.
//!
//! Scalars print in their [`FmtStyle`]. Sequences print as `[a; b; c]` with
//! their elements in hex unless a narrower style was asked for, and
//! sequences of bytes print as quoted strings when `strings` is set.

use std::fmt;
use std::io::{self, Write};

use crate::bits::{Bits, FmtStyle, Storage, Width};
use crate::pack::Packable;

/// Options for [`display`] and [`repr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FmtOpts {
    /// Print byte sequences as quoted, escaped strings.
    pub strings: bool,
    /// End [`display`] output with a newline.
    pub newline: bool,
    /// Style for scalar values.
    pub style: FmtStyle,
}

impl Default for FmtOpts {
    fn default() -> Self {
        Self { strings: true, newline: true, style: FmtStyle::Full }
    }
}

impl FmtOpts {
    /// Default options with a different scalar style.
    #[must_use]
    pub fn with_style(style: FmtStyle) -> Self {
        Self { style, ..Self::default() }
    }
}

/// Renders `value` into a string.
#[must_use]
pub fn repr<T: Packable>(value: &T, opts: FmtOpts) -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = value.render(&mut out, opts);
    out
}

/// Prints `value` on standard output.
///
/// # Errors
///
/// Returns the error from standard output.
pub fn display<T: Packable>(value: &T, opts: FmtOpts) -> io::Result<()> {
    display_to(&mut io::stdout().lock(), value, opts)
}

/// Writes `value` to `out`, followed by a newline when `opts.newline` is set.
///
/// # Errors
///
/// Returns the error from `out`.
pub fn display_to<T: Packable>(out: &mut impl Write, value: &T, opts: FmtOpts) -> io::Result<()> {
    out.write_all(repr(value, opts).as_bytes())?;
    if opts.newline {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Prints a byte sequence on standard output as raw bytes.
///
/// # Errors
///
/// Returns the error from standard output.
pub fn putstring<const N: usize>(bytes: &[Bits<8>; N]) -> io::Result<()> {
    putstring_to(&mut io::stdout().lock(), bytes)
}

/// Writes a byte sequence to `out` as raw bytes.
///
/// # Errors
///
/// Returns the error from `out`.
pub fn putstring_to<const N: usize>(out: &mut impl Write, bytes: &[Bits<8>; N]) -> io::Result<()> {
    let raw: Vec<u8> = bytes.iter().map(low_byte).collect();
    out.write_all(&raw)
}

pub(crate) fn low_byte<const W: u32>(value: &Bits<W>) -> u8
where
    Width<W>: Storage,
{
    u8::try_from(value.to_u64() & 0xff).unwrap_or(u8::MAX)
}

pub(crate) fn render_elements<T: Packable>(
    items: &[T],
    out: &mut dyn fmt::Write,
    mut opts: FmtOpts,
) -> fmt::Result {
    if opts.style == FmtStyle::Full {
        opts.style = FmtStyle::Hex;
    }
    out.write_char('[')?;
    for (pos, item) in items.iter().enumerate() {
        if pos > 0 {
            out.write_str("; ")?;
        }
        item.render(out, opts)?;
    }
    out.write_char(']')
}

pub(crate) fn render_string(bytes: impl Iterator<Item = u8>, out: &mut dyn fmt::Write) -> fmt::Result {
    out.write_char('"')?;
    for byte in bytes {
        match byte {
            b'\\' | b'"' => write!(out, "\\{}", char::from(byte))?,
            _ if byte.is_ascii_graphic() => out.write_char(char::from(byte))?,
            _ => write!(out, "\\x{byte:02x}")?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{display_to, putstring_to, repr, FmtOpts};
    use crate::{Bits, FmtStyle};

    crate::packable! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        struct Slot {
            valid: bool,
            tag: Bits<4>,
        }
    }

    fn bytes(text: &[u8]) -> [Bits<8>; 4] {
        std::array::from_fn(|pos| Bits::new(u64::from(text[pos])))
    }

    #[test]
    fn scalars_keep_their_full_form() {
        assert_eq!(repr(&Bits::<4>::new(5), FmtOpts::default()), "4'b0101 (0x5, 5)");
        assert_eq!(repr(&true, FmtOpts::default()), "1'b1 (0x1, 1)");
    }

    #[rstest]
    #[case(FmtStyle::Full, "[3'x1; 3'x7; 3'x0]")]
    #[case(FmtStyle::Dec, "[3'd1; 3'd7; 3'd0]")]
    #[case(FmtStyle::Bin, "[3'b001; 3'b111; 3'b000]")]
    fn sequences_render_element_by_element(#[case] style: FmtStyle, #[case] expected: &str) {
        let seq = [Bits::<3>::new(1), Bits::new(7), Bits::new(0)];
        assert_eq!(repr(&seq, FmtOpts::with_style(style)), expected);
    }

    #[test]
    fn nested_and_empty_sequences() {
        let empty: [Bits<5>; 0] = [];
        assert_eq!(repr(&empty, FmtOpts::default()), "[]");
        let nested = [[false, true], [true, true]];
        assert_eq!(repr(&nested, FmtOpts::default()), "[[1'x0; 1'x1]; [1'x1; 1'x1]]");
    }

    #[test]
    fn byte_sequences_print_as_escaped_strings() {
        assert_eq!(repr(&bytes(b"ok!\n"), FmtOpts::default()), "\"ok!\\x0a\"");
        assert_eq!(repr(&bytes(b"a\"\\ "), FmtOpts::default()), "\"a\\\"\\\\\\x20\"");
        let raw = FmtOpts { strings: false, ..FmtOpts::default() };
        assert_eq!(repr(&bytes(b"AB\0z"), raw), "[8'x41; 8'x42; 8'x0; 8'x7a]");
    }

    #[test]
    fn aggregates_name_their_fields() {
        let slot = Slot { valid: true, tag: Bits::new(9) };
        assert_eq!(repr(&slot, FmtOpts::with_style(FmtStyle::Hex)), "{ valid = 1'x1; tag = 4'x9 }");
        assert_eq!(repr(&[slot.clone()], FmtOpts::default()), "[{ valid = 1'x1; tag = 4'x9 }]");
    }

    #[test]
    fn display_appends_a_newline_unless_disabled() {
        let mut out = Vec::new();
        display_to(&mut out, &Bits::<8>::new(0x2a), FmtOpts::with_style(FmtStyle::Dec)).unwrap();
        let inline = FmtOpts { newline: false, ..FmtOpts::with_style(FmtStyle::Hex) };
        display_to(&mut out, &Bits::<8>::new(0x2a), inline).unwrap();
        assert_eq!(out, b"8'd42\n8'x2a");
    }

    #[test]
    fn putstring_writes_raw_bytes() {
        let mut out = Vec::new();
        putstring_to(&mut out, &bytes(b"hi\n\0")).unwrap();
        assert_eq!(out, b"hi\n\0");
    }
}
