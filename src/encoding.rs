use crate::{Error, ErrorKind};
use std::{borrow::Cow, fmt};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// The text encodings found in container entries
///
/// Each encoding knows how to turn raw entry bytes into a UTF-8 string and
/// back. The mapping is strict: malformed input is rejected rather than
/// replaced, as a replacement character would silently break the round trip.
///
/// ```
/// use pbit_vcs::TextEncoding;
///
/// let encoding = TextEncoding::Utf8Bom;
/// assert_eq!(encoding.decode(b"\xef\xbb\xbfabc").unwrap(), "abc");
/// assert_eq!(encoding.encode("abc"), b"\xef\xbb\xbfabc");
///
/// let encoding = TextEncoding::Utf16Le;
/// assert_eq!(encoding.decode(b"a\x00b\x00").unwrap(), "ab");
/// assert_eq!(encoding.encode("ab"), b"a\x00b\x00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// Plain UTF-8
    Utf8,

    /// UTF-8 prefixed with a byte order mark. The mark is optional on decode
    /// and always written on encode.
    Utf8Bom,

    /// Little endian UTF-16 without a byte order mark
    Utf16Le,
}

impl TextEncoding {
    /// The full name of the encoding, including any byte order mark or
    /// endianness suffix
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Bom => "utf-8-sig",
            TextEncoding::Utf16Le => "utf-16-le",
        }
    }

    /// The name written in an XML declaration for this encoding.
    ///
    /// XML has no notion of a byte order mark suffix or endianness in the
    /// encoding name, so this is the family the encoding belongs to.
    pub fn xml_name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => "utf-8",
            TextEncoding::Utf16Le => "utf-16",
        }
    }

    /// Returns true if the encoding named in an XML declaration refers to this
    /// encoding
    pub fn is_declared_as(&self, declared: &str) -> bool {
        let declared = declared.to_ascii_lowercase();
        declared == self.xml_name()
            || declared == self.label()
            || declared.replace('-', "") == self.label().replace('-', "")
    }

    /// Decodes bytes into a string, failing on malformed data
    pub fn decode<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, str>, Error> {
        let decoded = match self {
            TextEncoding::Utf8 => {
                encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(data)
            }
            TextEncoding::Utf8Bom => {
                let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
                encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(data)
            }
            TextEncoding::Utf16Le => {
                encoding_rs::UTF_16LE.decode_without_bom_handling_and_without_replacement(data)
            }
        };

        decoded.ok_or_else(|| Error::new(ErrorKind::Decode { encoding: *self }))
    }

    /// Encodes a string into bytes
    pub fn encode(&self, data: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => data.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => {
                let mut out = Vec::with_capacity(UTF8_BOM.len() + data.len());
                out.extend_from_slice(UTF8_BOM);
                out.extend_from_slice(data.as_bytes());
                out
            }

            // encoding_rs follows the WHATWG standard where UTF-16 encoders
            // output UTF-8, so the code units are written by hand
            TextEncoding::Utf16Le => data.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
