//! Persist extracted trees as plain directories.
//!
//! Every tree directory holds a `.zo` file listing the container entries in
//! archive order, one per line. Entry names containing `/` map onto
//! subdirectories and a subdirectory with its own `.zo` file is a nested tree.

use crate::{
    tree::{Artifact, ExtractedTree},
    Error, ErrorKind,
};
use std::{
    collections::BTreeMap,
    fs,
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Name of the order manifest inside a tree directory
pub const MANIFEST_FILE: &str = ".zo";

/// Writes a tree into a directory, creating it when needed
pub fn write_tree(dir: &Path, tree: &ExtractedTree) -> Result<(), Error> {
    for name in tree.manifest() {
        entry_path(dir, name)?;
    }

    fs::create_dir_all(dir)?;
    fs::write(dir.join(MANIFEST_FILE), tree.manifest().join("\n"))?;

    for (name, artifact) in tree.artifacts() {
        let path = entry_path(dir, name)?;
        match artifact {
            Artifact::File(data) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::from(e).within(name))?;
                }
                fs::write(&path, data).map_err(|e| Error::from(e).within(name))?;
            }
            Artifact::Tree(inner) => write_tree(&path, inner).map_err(|e| e.within(name))?,
        }
    }

    debug!(dir = %dir.display(), artifacts = tree.artifacts().len(), "wrote tree");
    Ok(())
}

/// Reads a tree previously written by `write_tree`
///
/// ```
/// use pbit_vcs::{read_tree, write_tree, Artifact, ExtractedTree};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let mut tree = ExtractedTree::new();
/// tree.push_entry("Version", Artifact::File(b"3.0".to_vec()));
/// tree.push_entry("Report/Layout", Artifact::File(b"{}\n".to_vec()));
///
/// write_tree(dir.path(), &tree)?;
/// assert_eq!(read_tree(dir.path())?, tree);
/// # Ok(())
/// # }
/// ```
pub fn read_tree(dir: &Path) -> Result<ExtractedTree, Error> {
    let manifest = match fs::read_to_string(dir.join(MANIFEST_FILE)) {
        Ok(x) => parse_manifest(&x),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ErrorKind::MissingArtifact {
                name: String::from(MANIFEST_FILE),
            }
            .into())
        }
        Err(e) => return Err(e.into()),
    };

    let mut artifacts = BTreeMap::new();
    collect_artifacts(dir, None, &mut artifacts)?;
    debug!(dir = %dir.display(), artifacts = artifacts.len(), "read tree");
    Ok(ExtractedTree::from_parts(manifest, artifacts))
}

fn parse_manifest(data: &str) -> Vec<String> {
    data.split('\n')
        .map(|x| x.trim_end_matches('\r'))
        .filter(|x| !x.is_empty())
        .map(String::from)
        .collect()
}

fn collect_artifacts(
    dir: &Path,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, Artifact>,
) -> Result<(), Error> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_str().ok_or_else(|| ErrorKind::UnsafeEntryName {
            name: entry.file_name().to_string_lossy().into_owned(),
        })?;

        if prefix.is_none() && file_name == MANIFEST_FILE {
            continue;
        }

        let name = match prefix {
            Some(prefix) => format!("{}/{}", prefix, file_name),
            None => String::from(file_name),
        };

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if path.join(MANIFEST_FILE).is_file() {
                let inner = read_tree(&path).map_err(|e| e.within(&name))?;
                out.insert(name, Artifact::Tree(inner));
            } else {
                collect_artifacts(&path, Some(&name), out)?;
            }
        } else {
            let data = fs::read(&path).map_err(|e| Error::from(e).within(&name))?;
            out.insert(name, Artifact::File(data));
        }
    }

    Ok(())
}

/// Maps an entry name onto a path below `dir`, rejecting names that would
/// escape it or clash with the manifest
fn entry_path(dir: &Path, name: &str) -> Result<PathBuf, Error> {
    let unsafe_name = || {
        Error::from(ErrorKind::UnsafeEntryName {
            name: String::from(name),
        })
    };

    if name == MANIFEST_FILE || name.contains(&['\\', '\0', '\n', '\r'][..]) {
        return Err(unsafe_name());
    }

    let mut path = dir.to_path_buf();
    for part in name.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return Err(unsafe_name());
        }
        path.push(part);
    }

    Ok(path)
}
