use crate::{
    codec::Codec, Error, ErrorKind, JsonCodec, LiteralBytesCodec, MashupCodec, TextEncoding,
    XmlCodec,
};
use std::borrow::Cow;

/// Binds an entry name, or every entry name starting with a prefix, to a codec
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    key: Cow<'static, str>,
    codec: Codec,
}

impl Binding {
    /// Creates a binding. A key ending in `/` will typically be used as a
    /// prefix for all entries within that directory.
    pub fn new(key: impl Into<Cow<'static, str>>, codec: Codec) -> Self {
        Binding {
            key: key.into(),
            codec,
        }
    }

    /// The entry name or prefix
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The codec bound to the key
    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

/// An ordered set of bindings that routes entry names to codecs
///
/// An exact key match always wins. Otherwise the name must start with
/// exactly one of the keys.
///
/// ```
/// use pbit_vcs::{BindingTable, Codec};
///
/// let table = BindingTable::pbit();
/// assert_eq!(table.resolve("Version").unwrap(), &Codec::PassThrough);
/// assert_eq!(table.resolve("Report/Layout").unwrap().name(), "json");
/// assert_eq!(table.resolve("Report/StaticResources/img.png").unwrap(), &Codec::PassThrough);
/// assert!(table.resolve("Unknown").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
}

impl BindingTable {
    /// Creates a table from its bindings
    pub fn new(bindings: Vec<Binding>) -> Self {
        BindingTable { bindings }
    }

    /// The bindings for the entries of a template container
    pub fn pbit() -> Self {
        let json = Codec::Json(JsonCodec::new(TextEncoding::Utf16Le));
        BindingTable::new(vec![
            Binding::new("DataModelSchema", json.clone()),
            Binding::new("DiagramState", json.clone()),
            Binding::new("Report/Layout", json),
            Binding::new(
                "Report/LinguisticSchema",
                Codec::Xml(XmlCodec::new(TextEncoding::Utf16Le).with_declaration(false)),
            ),
            Binding::new(
                "[Content_Types].xml",
                Codec::Xml(XmlCodec::new(TextEncoding::Utf8Bom).with_declaration(true)),
            ),
            Binding::new("SecurityBindings", Codec::PassThrough),
            Binding::new("Settings", Codec::PassThrough),
            Binding::new("Version", Codec::PassThrough),
            Binding::new("Report/StaticResources/", Codec::PassThrough),
            Binding::new("DataMashup", Codec::Mashup(MashupCodec::new())),
            Binding::new("Metadata", Codec::LiteralBytes(LiteralBytesCodec::new())),
        ])
    }

    /// The bindings for the entries of the package zip inside the DataMashup
    pub fn mashup_package() -> Self {
        let xml = Codec::Xml(XmlCodec::new(TextEncoding::Utf8Bom).with_declaration(true));
        BindingTable::new(vec![
            Binding::new("[Content_Types].xml", xml.clone()),
            Binding::new("Config/Package.xml", xml),
            Binding::new("Formulas/", Codec::PassThrough),
        ])
    }

    /// Appends a binding
    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// The bindings in the order they were added
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns the codec for an entry name
    pub fn resolve(&self, name: &str) -> Result<&Codec, Error> {
        let mut exact = self.bindings.iter().filter(|x| x.key() == name);
        match (exact.next(), exact.next()) {
            (Some(binding), None) => return Ok(binding.codec()),
            (Some(_), Some(_)) => {
                let matches = 2 + exact.count();
                return Err(ErrorKind::AmbiguousOrUnknownEntry { matches }.into());
            }
            _ => {}
        }

        let mut prefixed = self.bindings.iter().filter(|x| name.starts_with(x.key()));
        match (prefixed.next(), prefixed.next()) {
            (Some(binding), None) => Ok(binding.codec()),
            (None, _) => Err(ErrorKind::AmbiguousOrUnknownEntry { matches: 0 }.into()),
            (Some(_), Some(_)) => {
                let matches = 2 + prefixed.count();
                Err(ErrorKind::AmbiguousOrUnknownEntry { matches }.into())
            }
        }
    }
}
