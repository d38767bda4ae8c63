use crate::{codec::Transcode, Error, ErrorKind};

/// The terminator inserted between lines of an escaped literal
const TERMINATOR: char = '\n';

/// Renders a near binary payload as an escaped byte literal split over
/// multiple lines
///
/// The literal uses the `b'...'` notation where printable ASCII stands for
/// itself and every other byte is written as an escape (`\xfe`, `\n`, ...). A
/// line break is inserted after every `\xNN` escape that is followed by a
/// printable character, so runs of text land on their own lines. Joining the
/// lines restores the literal exactly, as the literal never contains a raw
/// line break.
///
/// ```
/// use pbit_vcs::{LiteralBytesCodec, Transcode};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = LiteralBytesCodec::new();
/// let raw = b"\x00\x00\x00\x03abc\x01\x00def";
/// let readable = codec.to_readable(raw)?;
/// assert_eq!(readable, b"b'\\x00\\x00\\x00\\x03\nabc\\x01\\x00\ndef'");
/// assert_eq!(codec.to_raw(&readable)?, raw);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LiteralBytesCodec;

impl LiteralBytesCodec {
    /// Creates a literal bytes codec
    pub fn new() -> Self {
        LiteralBytesCodec
    }
}

impl Transcode for LiteralBytesCodec {
    fn to_readable(&self, raw: &[u8]) -> Result<Vec<u8>, Error> {
        let escaped = escape_literal(raw);
        split_escaped(&escaped).map(String::into_bytes)
    }

    fn to_raw(&self, readable: &[u8]) -> Result<Vec<u8>, Error> {
        let joined: Vec<u8> = readable
            .iter()
            .copied()
            .filter(|&x| x != b'\n' && x != b'\r')
            .collect();
        unescape_literal(&joined)
    }
}

/// Escapes bytes into a single line `b'...'` literal.
///
/// Single quotes delimit the literal unless the data contains a single quote
/// and no double quotes.
///
/// ```
/// use pbit_vcs::escape_literal;
///
/// assert_eq!(escape_literal(b"a\\b\n\xfe"), r"b'a\\b\n\xfe'");
/// assert_eq!(escape_literal(b"it's"), r#"b"it's""#);
/// assert_eq!(escape_literal(b"'\""), r#"b'\'"'"#);
/// ```
pub fn escape_literal(data: &[u8]) -> String {
    let quote = if data.contains(&b'\'') && !data.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };

    let mut out = String::with_capacity(data.len() * 2 + 3);
    out.push('b');
    out.push(char::from(quote));
    for &byte in data {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            x if x == quote => {
                out.push('\\');
                out.push(char::from(x));
            }
            0x20..=0x7e => out.push(char::from(byte)),
            x => {
                out.push_str("\\x");
                out.push(hex_digit(x >> 4));
                out.push(hex_digit(x & 0xf));
            }
        }
    }
    out.push(char::from(quote));
    out
}

/// Inserts a line break after each `\xNN` escape that is directly followed by
/// something other than another escape.
///
/// The scan walks the literal from left to right and a character consumed as
/// the follower of one split can't start the next one.
pub fn split_escaped(escaped: &str) -> Result<String, Error> {
    if let Some(offset) = escaped.find(TERMINATOR) {
        return Err(ErrorKind::UnsupportedTerminatorCollision { offset }.into());
    }

    let data = escaped.as_bytes();
    let mut out = String::with_capacity(escaped.len() + escaped.len() / 8);
    let mut start = 0;
    let mut i = 0;
    while i < data.len() {
        let split = match data.get(i..i + 5) {
            Some([b'\\', b'x', hi, lo, follower]) => {
                is_lower_hex(*hi) && is_lower_hex(*lo) && !matches!(follower, b'\\' | b'x')
            }
            _ => false,
        };

        if split {
            out.push_str(&escaped[start..i + 4]);
            out.push(TERMINATOR);
            start = i + 4;
            i += 5;
        } else {
            i += 1;
        }
    }

    out.push_str(&escaped[start..]);
    Ok(out)
}

/// Parses a single line `b'...'` literal back into bytes.
///
/// ```
/// use pbit_vcs::unescape_literal;
///
/// assert_eq!(unescape_literal(br"b'a\\b\n\xfe'").unwrap(), b"a\\b\n\xfe");
/// assert_eq!(unescape_literal(br#"b"it's""#).unwrap(), b"it's");
/// assert!(unescape_literal(b"'missing prefix'").is_err());
/// ```
pub fn unescape_literal(data: &[u8]) -> Result<Vec<u8>, Error> {
    let err = |offset: usize| Error::from(ErrorKind::NotValidLiteral { offset });

    let quote = match data {
        [b'b' | b'B', q @ (b'\'' | b'"'), ..] => *q,
        _ => return Err(err(0)),
    };

    let end = data.len() - 1;
    if end < 2 || data[end] != quote {
        return Err(err(end));
    }

    let mut out = Vec::with_capacity(data.len());
    let mut i = 2;
    while i < end {
        let byte = data[i];
        if byte == quote || !matches!(byte, 0x20..=0x7e) {
            return Err(err(i));
        }

        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }

        let escape = *data.get(i + 1).filter(|_| i + 1 < end).ok_or_else(|| err(i))?;
        i += 2;
        match escape {
            b'\\' | b'\'' | b'"' => out.push(escape),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'x' => {
                let digits = data.get(i..i + 2).filter(|_| i + 2 <= end).ok_or_else(|| err(i))?;
                let hi = hex_value(digits[0]).ok_or_else(|| err(i))?;
                let lo = hex_value(digits[1]).ok_or_else(|| err(i + 1))?;
                out.push(hi << 4 | lo);
                i += 2;
            }
            b'0'..=b'7' => {
                let mut value = u32::from(escape - b'0');
                let mut digits = 1;
                while digits < 3 && i < end && matches!(data[i], b'0'..=b'7') {
                    value = value * 8 + u32::from(data[i] - b'0');
                    digits += 1;
                    i += 1;
                }
                out.push(u8::try_from(value).map_err(|_| err(i))?);
            }
            _ => return Err(err(i - 1)),
        }
    }

    Ok(out)
}

#[inline]
fn hex_digit(x: u8) -> char {
    char::from(b"0123456789abcdef"[usize::from(x)])
}

#[inline]
fn is_lower_hex(x: u8) -> bool {
    matches!(x, b'0'..=b'9' | b'a'..=b'f')
}

#[inline]
fn hex_value(x: u8) -> Option<u8> {
    match x {
        b'0'..=b'9' => Some(x - b'0'),
        b'a'..=b'f' => Some(x - b'a' + 10),
        b'A'..=b'F' => Some(x - b'A' + 10),
        _ => None,
    }
}
