use crate::{Error, ErrorKind};
use std::collections::BTreeMap;

/// The readable form of a single container entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A single readable file
    File(Vec<u8>),

    /// A nested container that was expanded into its own tree
    Tree(ExtractedTree),
}

impl Artifact {
    /// Returns the file contents, or an error if this is a tree
    pub fn as_file(&self) -> Result<&[u8], Error> {
        match self {
            Artifact::File(data) => Ok(data),
            Artifact::Tree(_) => Err(ErrorKind::UnexpectedArtifact { expected: "file" }.into()),
        }
    }

    /// Returns the nested tree, or an error if this is a file
    pub fn as_tree(&self) -> Result<&ExtractedTree, Error> {
        match self {
            Artifact::Tree(tree) => Ok(tree),
            Artifact::File(_) => Err(ErrorKind::UnexpectedArtifact { expected: "tree" }.into()),
        }
    }
}

/// The readable form of a container: the entry order plus an artifact per name.
///
/// The manifest is authoritative. When a tree is compressed, only the names
/// listed in the manifest are written, in manifest order. Artifacts outside
/// the manifest are auxiliary data for the codec that owns the tree (eg: the
/// XML segments of a DataMashup payload).
///
/// ```
/// use pbit_vcs::{Artifact, ExtractedTree};
///
/// let mut tree = ExtractedTree::new();
/// tree.push_entry("Version", Artifact::File(b"1.28".to_vec()));
/// tree.insert("notes.txt", Artifact::File(Vec::new()));
///
/// assert_eq!(tree.manifest(), &["Version"]);
/// assert_eq!(tree.file("Version").unwrap(), b"1.28");
/// assert!(tree.get("notes.txt").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTree {
    manifest: Vec<String>,
    artifacts: BTreeMap<String, Artifact>,
}

impl ExtractedTree {
    /// Creates an empty tree
    pub fn new() -> Self {
        ExtractedTree::default()
    }

    /// Creates a tree from an order manifest and its artifacts
    pub fn from_parts(manifest: Vec<String>, artifacts: BTreeMap<String, Artifact>) -> Self {
        ExtractedTree {
            manifest,
            artifacts,
        }
    }

    /// Decomposes the tree into the order manifest and artifacts
    pub fn into_parts(self) -> (Vec<String>, BTreeMap<String, Artifact>) {
        (self.manifest, self.artifacts)
    }

    /// The entry names in container order
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// All artifacts keyed by name, including the ones not in the manifest
    pub fn artifacts(&self) -> &BTreeMap<String, Artifact> {
        &self.artifacts
    }

    /// Appends an entry to the manifest and stores its artifact
    pub fn push_entry(&mut self, name: impl Into<String>, artifact: Artifact) {
        let name = name.into();
        self.manifest.push(name.clone());
        self.artifacts.insert(name, artifact);
    }

    /// Stores an artifact without listing it in the manifest
    pub fn insert(&mut self, name: impl Into<String>, artifact: Artifact) {
        self.artifacts.insert(name.into(), artifact);
    }

    /// Returns the artifact with the given name
    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    /// Returns a mutable reference to the artifact with the given name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Artifact> {
        self.artifacts.get_mut(name)
    }

    /// Returns the artifact with the given name or a `MissingArtifact` error
    pub fn require(&self, name: &str) -> Result<&Artifact, Error> {
        self.get(name).ok_or_else(|| {
            Error::from(ErrorKind::MissingArtifact {
                name: name.to_string(),
            })
        })
    }

    /// Returns the contents of the named file artifact
    pub fn file(&self, name: &str) -> Result<&[u8], Error> {
        self.require(name)?.as_file()
    }
}
