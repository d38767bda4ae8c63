//! Invertible transforms between raw entry payloads and their readable form.
//!
//! Every codec obeys the same law: converting raw bytes to the readable
//! form and back yields the original bytes.
//!
//! ```
//! use pbit_vcs::{Codec, JsonCodec, TextEncoding};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = Codec::Json(JsonCodec::new(TextEncoding::Utf8));
//! let raw = br#"{"name":"Sales","columns":["a","b"]}"#;
//! let readable = codec.to_readable(raw)?;
//! assert_eq!(codec.to_raw(&readable)?, raw);
//! # Ok(())
//! # }
//! ```
//!
//! ```text
//! Codec (selected per entry name by a BindingTable)
//! ├── PassThrough   bytes -> bytes
//! ├── Xml           bytes -> pretty printed utf-8 xml
//! ├── Json          bytes -> pretty printed utf-8 json
//! ├── LiteralBytes  bytes -> line split escaped literal
//! └── Mashup        bytes -> tree (package zip, two xml segments, tail)
//! ```

mod json;
mod literal;
mod xml;

pub use json::*;
pub use literal::*;
pub use xml::*;

use crate::{mashup::MashupCodec, Artifact, Error};
use std::fmt;

/// A bidirectional transform over a single buffer
pub trait Transcode {
    /// Converts a raw entry payload into its readable form
    fn to_readable(&self, raw: &[u8]) -> Result<Vec<u8>, Error>;

    /// Converts the readable form back into the raw entry payload
    fn to_raw(&self, readable: &[u8]) -> Result<Vec<u8>, Error>;
}

/// The identity transform for entries that are already readable or opaque
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassThrough;

impl Transcode for PassThrough {
    fn to_readable(&self, raw: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(raw.to_vec())
    }

    fn to_raw(&self, readable: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(readable.to_vec())
    }
}

impl<T: Transcode + ?Sized> Transcode for &'_ T {
    fn to_readable(&self, raw: &[u8]) -> Result<Vec<u8>, Error> {
        (**self).to_readable(raw)
    }

    fn to_raw(&self, readable: &[u8]) -> Result<Vec<u8>, Error> {
        (**self).to_raw(readable)
    }
}

/// The codec applied to a container entry
#[derive(Debug, Clone, PartialEq)]
pub enum Codec {
    /// Copy the payload as is
    PassThrough,

    /// Pretty print XML
    Xml(XmlCodec),

    /// Pretty print JSON, expanding embedded JSON strings
    Json(JsonCodec),

    /// Split a near binary payload into escaped lines
    LiteralBytes(LiteralBytesCodec),

    /// Expand a DataMashup payload into a tree
    Mashup(MashupCodec),
}

impl Codec {
    /// A short name for the codec used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Codec::PassThrough => "pass-through",
            Codec::Xml(_) => "xml",
            Codec::Json(_) => "json",
            Codec::LiteralBytes(_) => "literal-bytes",
            Codec::Mashup(_) => "mashup",
        }
    }

    /// Converts a raw entry payload into its readable artifact
    pub fn to_readable(&self, raw: &[u8]) -> Result<Artifact, Error> {
        match self {
            Codec::PassThrough => PassThrough.to_readable(raw).map(Artifact::File),
            Codec::Xml(codec) => codec.to_readable(raw).map(Artifact::File),
            Codec::Json(codec) => codec.to_readable(raw).map(Artifact::File),
            Codec::LiteralBytes(codec) => codec.to_readable(raw).map(Artifact::File),
            Codec::Mashup(codec) => codec.to_readable(raw).map(Artifact::Tree),
        }
    }

    /// Converts a readable artifact back into the raw entry payload
    pub fn to_raw(&self, artifact: &Artifact) -> Result<Vec<u8>, Error> {
        match self {
            Codec::PassThrough => PassThrough.to_raw(artifact.as_file()?),
            Codec::Xml(codec) => codec.to_raw(artifact.as_file()?),
            Codec::Json(codec) => codec.to_raw(artifact.as_file()?),
            Codec::LiteralBytes(codec) => codec.to_raw(artifact.as_file()?),
            Codec::Mashup(codec) => codec.to_raw(artifact.as_tree()?),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Xml(codec) => write!(f, "xml ({})", codec.encoding()),
            Codec::Json(codec) => write!(f, "json ({})", codec.encoding()),
            _ => f.write_str(self.name()),
        }
    }
}
