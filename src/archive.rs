//! Convert whole containers between their zip form and an extracted tree.

use crate::{
    router::BindingTable,
    tree::{Artifact, ExtractedTree},
    Error, ErrorKind,
};
use once_cell::sync::Lazy;
use std::{
    collections::HashSet,
    io::{Cursor, Read, Write},
};
use tracing::debug;
use zip::{write::SimpleFileOptions, CompressionMethod, DateTime, ZipArchive, ZipWriter};

static PBIT_BINDINGS: Lazy<BindingTable> = Lazy::new(BindingTable::pbit);

/// Extracts a template container with the default bindings
///
/// ```
/// use pbit_vcs::{compress, extract};
/// use std::io::Write;
/// use zip::write::SimpleFileOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
/// writer.start_file("Version", SimpleFileOptions::default())?;
/// writer.write_all(b"3.0")?;
/// let container = writer.finish()?.into_inner();
///
/// let tree = extract(&container)?;
/// assert_eq!(tree.manifest(), ["Version"]);
/// assert_eq!(tree.file("Version")?, b"3.0");
///
/// let rebuilt = compress(&tree)?;
/// assert_eq!(extract(&rebuilt)?, tree);
/// # Ok(())
/// # }
/// ```
pub fn extract(data: &[u8]) -> Result<ExtractedTree, Error> {
    extract_with(&PBIT_BINDINGS, data)
}

/// Compresses a tree into a template container with the default bindings
pub fn compress(tree: &ExtractedTree) -> Result<Vec<u8>, Error> {
    compress_with(&PBIT_BINDINGS, tree)
}

/// Extracts every entry of a zip container in archive order, converting each
/// with the codec its name resolves to.
///
/// Errors are attributed to the entry being converted.
pub fn extract_with(table: &BindingTable, data: &[u8]) -> Result<ExtractedTree, Error> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut tree = ExtractedTree::new();
    let mut buf = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let name = file.name().to_string();
        if tree.get(&name).is_some() {
            return Err(ErrorKind::DuplicateEntry { name }.into());
        }

        buf.clear();
        file.read_to_end(&mut buf)
            .map_err(|e| Error::from(e).within(&name))?;

        let artifact = extract_entry(table, &name, &buf).map_err(|e| e.within(&name))?;
        tree.push_entry(name, artifact);
    }

    debug!(entries = tree.manifest().len(), "extracted container");
    Ok(tree)
}

fn extract_entry(table: &BindingTable, name: &str, data: &[u8]) -> Result<Artifact, Error> {
    let codec = table.resolve(name)?;
    debug!(entry = name, codec = %codec, len = data.len(), "extracting entry");
    codec.to_readable(data)
}

/// Compresses the entries of a tree in manifest order, converting each back
/// with the codec its name resolves to.
///
/// Artifacts that are not named in the manifest are ignored. The output only
/// depends on the tree: entries are deflated and stamped with a fixed
/// modification time.
pub fn compress_with(table: &BindingTable, tree: &ExtractedTree) -> Result<Vec<u8>, Error> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut seen = HashSet::with_capacity(tree.manifest().len());
    for name in tree.manifest() {
        if !seen.insert(name.as_str()) {
            return Err(ErrorKind::DuplicateEntry { name: name.clone() }.into());
        }

        let raw = compress_entry(table, tree, name).map_err(|e| e.within(name))?;
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&raw)?;
    }

    let out = writer.finish()?.into_inner();
    debug!(entries = tree.manifest().len(), len = out.len(), "compressed container");
    Ok(out)
}

fn compress_entry(table: &BindingTable, tree: &ExtractedTree, name: &str) -> Result<Vec<u8>, Error> {
    let codec = table.resolve(name)?;
    let artifact = tree.require(name)?;
    debug!(entry = name, codec = %codec, "compressing entry");
    codec.to_raw(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binding, Codec, LiteralBytesCodec};

    fn container(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn table() -> BindingTable {
        BindingTable::new(vec![
            Binding::new("b", Codec::PassThrough),
            Binding::new("dir/", Codec::PassThrough),
            Binding::new("lit", Codec::LiteralBytes(LiteralBytesCodec::new())),
        ])
    }

    #[test]
    fn test_archive_order() {
        let data = container(&[("lit", b"\x01a"), ("dir/z", b"z"), ("b", b"b"), ("dir/a", b"a")]);
        let tree = extract_with(&table(), &data).unwrap();
        assert_eq!(tree.manifest(), ["lit", "dir/z", "b", "dir/a"]);
        assert_eq!(tree.file("lit").unwrap(), b"b'\\x01\na'");

        let rebuilt = compress_with(&table(), &tree).unwrap();
        let archive = ZipArchive::new(Cursor::new(&rebuilt)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names.len(), 4);
        assert_eq!(extract_with(&table(), &rebuilt).unwrap(), tree);
    }

    #[test]
    fn test_deterministic_output() {
        let data = container(&[("b", b"hello"), ("dir/a", b"world")]);
        let tree = extract_with(&table(), &data).unwrap();
        let first = compress_with(&table(), &tree).unwrap();
        let second = compress_with(&table(), &extract_with(&table(), &first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_entry_attributed() {
        let data = container(&[("b", b"b"), ("c", b"c")]);
        let err = extract_with(&table(), &data).unwrap_err();
        assert_eq!(err.entry(), Some("c"));
        assert!(matches!(
            err.kind(),
            ErrorKind::AmbiguousOrUnknownEntry { matches: 0 }
        ));
    }

    #[test]
    fn test_missing_artifact() {
        let tree = ExtractedTree::from_parts(vec![String::from("b")], Default::default());
        let err = compress_with(&table(), &tree).unwrap_err();
        assert_eq!(err.entry(), Some("b"));
        assert!(matches!(err.kind(), ErrorKind::MissingArtifact { .. }));
    }

    #[test]
    fn test_duplicate_manifest_entry() {
        let mut tree = ExtractedTree::new();
        tree.push_entry("b", Artifact::File(b"1".to_vec()));
        tree.push_entry("b", Artifact::File(b"2".to_vec()));
        let err = compress_with(&table(), &tree).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateEntry { .. }));
    }

    #[test]
    fn test_auxiliary_artifacts_ignored() {
        let mut tree = ExtractedTree::new();
        tree.push_entry("b", Artifact::File(b"1".to_vec()));
        tree.insert("notes", Artifact::File(b"2".to_vec()));
        let rebuilt = compress_with(&table(), &tree).unwrap();
        assert_eq!(extract_with(&table(), &rebuilt).unwrap().manifest(), ["b"]);
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract(b"not a zip").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Zip(_)));
    }
}
