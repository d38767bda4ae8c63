use super::MashupContainer;
use crate::{
    archive::{compress_with, extract_with},
    codec::Transcode,
    router::BindingTable,
    tree::{Artifact, ExtractedTree},
    Error, ErrorKind, TextEncoding, XmlCodec,
};
use tracing::debug;

/// Expands a DataMashup payload into a nested tree and folds it back
///
/// The package zip is extracted with its own binding table and the remaining
/// segments are stored as auxiliary artifacts next to the package entries.
#[derive(Debug, Clone, PartialEq)]
pub struct MashupCodec {
    package: BindingTable,
    xml: XmlCodec,
}

impl Default for MashupCodec {
    fn default() -> Self {
        MashupCodec::new()
    }
}

impl MashupCodec {
    /// Artifact holding the first xml segment
    pub const FIRST_XML: &'static str = "3.xml";

    /// Artifact holding the second xml segment
    pub const SECOND_XML: &'static str = "6.xml";

    /// Artifact holding the opaque bytes after the second xml segment
    pub const TAIL: &'static str = "7.bytes";

    /// Creates a mashup codec with the default package bindings
    pub fn new() -> Self {
        MashupCodec {
            package: BindingTable::mashup_package(),
            xml: XmlCodec::new(TextEncoding::Utf8Bom).with_declaration(true),
        }
    }

    /// Replaces the bindings used for the entries of the package zip
    pub fn with_package_bindings(mut self, package: BindingTable) -> Self {
        self.package = package;
        self
    }

    /// The bindings used for the entries of the package zip
    pub fn package_bindings(&self) -> &BindingTable {
        &self.package
    }

    /// Splits the payload and converts each segment into its readable form
    pub fn to_readable(&self, raw: &[u8]) -> Result<ExtractedTree, Error> {
        let container = MashupContainer::parse(raw)?;
        debug!(
            package = container.package().len(),
            first_xml = container.first_xml().len(),
            second_xml = container.second_xml().len(),
            tail = container.tail().len(),
            "parsed data mashup"
        );

        let mut tree = extract_with(&self.package, container.package())?;
        let first = self.segment_readable(Self::FIRST_XML, container.first_xml())?;
        let second = self.segment_readable(Self::SECOND_XML, container.second_xml())?;

        for (name, data) in [
            (Self::FIRST_XML, first),
            (Self::SECOND_XML, second),
            (Self::TAIL, container.tail().to_vec()),
        ] {
            if tree.get(name).is_some() {
                return Err(ErrorKind::DuplicateEntry {
                    name: String::from(name),
                }
                .into());
            }
            tree.insert(name, Artifact::File(data));
        }

        Ok(tree)
    }

    /// Rebuilds the payload from a tree produced by `to_readable`
    pub fn to_raw(&self, tree: &ExtractedTree) -> Result<Vec<u8>, Error> {
        let package = compress_with(&self.package, tree)?;
        let first = self.segment_raw(tree, Self::FIRST_XML)?;
        let second = self.segment_raw(tree, Self::SECOND_XML)?;
        let tail = tree.file(Self::TAIL)?;

        let container = MashupContainer::new(&package, &first, &second, tail);
        container.to_vec()
    }

    fn segment_readable(&self, name: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.xml.to_readable(data).map_err(|e| e.within(name))
    }

    fn segment_raw(&self, tree: &ExtractedTree, name: &str) -> Result<Vec<u8>, Error> {
        let data = tree.file(name)?;
        self.xml.to_raw(data).map_err(|e| e.within(name))
    }
}
