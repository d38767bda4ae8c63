use crate::{codec::Transcode, Error, ErrorKind, TextEncoding};
use once_cell::sync::Lazy;
use quick_xml::{
    events::{BytesDecl, BytesText, Event},
    Reader, Writer,
};
use regex::bytes::Regex;
use tracing::trace;

/// Matches an encoding attribute of an XML declaration that may be preceded
/// by a byte order mark
static DECLARED_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s-u)\A.{0,4}<\?xml [^>]*encoding=['"]([A-Za-z0-9_.\-]+)['"]"#)
        .expect("declared encoding pattern to compile")
});

/// Returns the encoding named in a leading XML declaration.
///
/// The declaration is only recognized when it is ASCII compatible, so a
/// UTF-16 document never reports a declared encoding.
///
/// ```
/// use pbit_vcs::declared_encoding;
///
/// assert_eq!(declared_encoding(b"<?xml version=\"1.0\" encoding=\"utf-8\"?><a/>"), Some("utf-8"));
/// assert_eq!(declared_encoding(b"\xef\xbb\xbf<?xml version='1.0' encoding='UTF-8'?><a/>"), Some("UTF-8"));
/// assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
/// assert_eq!(declared_encoding(b"<a encoding=\"utf-8\"/>"), None);
/// ```
pub fn declared_encoding(data: &[u8]) -> Option<&str> {
    let captures = DECLARED_ENCODING.captures(data)?;
    let name = captures.get(1)?;
    std::str::from_utf8(name.as_bytes()).ok()
}

/// Pretty prints XML entries and minifies them back into their configured
/// encoding
///
/// The readable form is always UTF-8, indented by two spaces, with
/// whitespace only text removed unless it is the sole content of an element.
/// Everything else (attributes, entity
/// references, comments, text) is carried through verbatim, which is what
/// allows a minified document to be reproduced exactly.
///
/// ```
/// use pbit_vcs::{Transcode, TextEncoding, XmlCodec};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = XmlCodec::new(TextEncoding::Utf8);
/// let raw = b"<root a=\"1\"><item>x &amp; y</item><empty/></root>";
/// let readable = codec.to_readable(raw)?;
/// assert_eq!(
///     std::str::from_utf8(&readable)?,
///     "<root a=\"1\">\n  <item>x &amp; y</item>\n  <empty/>\n</root>\n"
/// );
/// assert_eq!(codec.to_raw(&readable)?, raw);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlCodec {
    encoding: TextEncoding,
    declaration: bool,
}

impl XmlCodec {
    const INDENT_SIZE: usize = 2;

    /// Creates an XML codec for the given raw encoding that does not emit an
    /// XML declaration
    pub fn new(encoding: TextEncoding) -> Self {
        XmlCodec {
            encoding,
            declaration: false,
        }
    }

    /// Sets if an XML declaration is emitted in both the readable and raw
    /// forms. An existing declaration is kept verbatim, otherwise one naming
    /// the configured encoding is written.
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// The encoding of the raw form
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Returns if an XML declaration is emitted
    pub fn declaration(&self) -> bool {
        self.declaration
    }

    fn rewrite(&self, text: &str, indent: bool) -> Result<Vec<u8>, Error> {
        let mut reader = Reader::from_str(text);
        let mut writer = if indent {
            Writer::new_with_indent(Vec::with_capacity(text.len()), b' ', Self::INDENT_SIZE)
        } else {
            Writer::new(Vec::with_capacity(text.len()))
        };

        let mut depth = 0usize;
        let mut roots = 0usize;
        let mut wrote_declaration = false;

        // Whitespace is only content when it is all an element holds
        let mut open = false;
        let mut blank = None;
        loop {
            let event = reader
                .read_event()
                .map_err(|e| not_valid_xml(reader.buffer_position() as u64, e.to_string()))?;

            if matches!(&event, Event::Text(t) if is_blank(t)) {
                if open {
                    blank = Some(event);
                }
                continue;
            }

            match event {
                Event::Eof => break,
                Event::Text(_) if depth == 0 => {
                    return Err(not_valid_xml(
                        reader.buffer_position() as u64,
                        "text outside of the root element",
                    ))
                }
                Event::Decl(_) if !self.declaration => continue,
                Event::Decl(_) => wrote_declaration = true,
                Event::Start(_) => {
                    roots += usize::from(depth == 0);
                    depth += 1;
                }
                Event::Empty(_) => roots += usize::from(depth == 0),
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }

            if self.declaration && !wrote_declaration && is_content(&event) {
                let name = self.encoding.xml_name();
                let decl = Event::Decl(BytesDecl::new("1.0", Some(name), None));
                writer
                    .write_event(decl)
                    .map_err(|e| not_valid_xml(reader.buffer_position() as u64, e.to_string()))?;
                wrote_declaration = true;
            }

            // An element closed right after it opened keeps its whitespace,
            // or stays on one line when it had none
            let inner = blank.take();
            if open && matches!(event, Event::End(_)) {
                let inner = inner.unwrap_or_else(|| Event::Text(BytesText::new("")));
                writer
                    .write_event(inner)
                    .map_err(|e| not_valid_xml(reader.buffer_position() as u64, e.to_string()))?;
            }

            open = matches!(event, Event::Start(_));
            writer
                .write_event(event)
                .map_err(|e| not_valid_xml(reader.buffer_position() as u64, e.to_string()))?;
        }

        if depth != 0 || roots != 1 {
            return Err(not_valid_xml(
                reader.buffer_position() as u64,
                "document must contain exactly one closed root element",
            ));
        }

        let mut out = writer.into_inner();
        if indent {
            out.push(b'\n');
        }
        Ok(out)
    }
}

impl Transcode for XmlCodec {
    fn to_readable(&self, raw: &[u8]) -> Result<Vec<u8>, Error> {
        let sniffed = declared_encoding(raw);
        if let Some(declared) = sniffed {
            trace!(declared, expected = %self.encoding, "found xml declaration");
            if !self.encoding.is_declared_as(declared) {
                return Err(ErrorKind::EncodingMismatch {
                    declared: declared.to_string(),
                    expected: self.encoding,
                }
                .into());
            }
        }

        // A declaration hidden by a wide encoding can be neither checked nor dropped
        let text = self.encoding.decode(raw)?;
        if !self.declaration && sniffed.is_none() {
            if let Some(declared) = declared_encoding(text.as_bytes()) {
                return Err(ErrorKind::UnsupportedDeclaration {
                    declared: declared.to_string(),
                }
                .into());
            }
        }

        self.rewrite(&text, true)
    }

    fn to_raw(&self, readable: &[u8]) -> Result<Vec<u8>, Error> {
        let text = TextEncoding::Utf8Bom.decode(readable)?;
        let compact = self.rewrite(&text, false)?;
        let compact = TextEncoding::Utf8.decode(&compact)?;
        Ok(self.encoding.encode(&compact))
    }
}

fn is_blank(data: &[u8]) -> bool {
    data.iter()
        .all(|x| matches!(x, b' ' | b'\t' | b'\r' | b'\n'))
}

/// Events that must come after the XML declaration
fn is_content(event: &Event) -> bool {
    !matches!(event, Event::Decl(_) | Event::Eof)
}

fn not_valid_xml(offset: u64, msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::NotValidXml {
        offset,
        msg: msg.into(),
    })
}
