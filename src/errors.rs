use crate::encoding::TextEncoding;
use std::fmt;

/// An error that can occur when converting a container or one of its entries
#[derive(Debug)]
pub struct Error(Box<ErrorImpl>);

#[derive(Debug)]
struct ErrorImpl {
    kind: ErrorKind,
    entry: Option<String>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(ErrorImpl { kind, entry: None }))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Returns the path of the entry being converted when the error occurred.
    ///
    /// Entries of nested containers are joined with a `/`, so a failure in the
    /// package of the `DataMashup` entry reads `DataMashup/Config/Package.xml`
    pub fn entry(&self) -> Option<&str> {
        self.0.entry.as_deref()
    }

    /// Attribute the error to the given entry, prefixing any inner entry path
    pub(crate) fn within(mut self, name: &str) -> Error {
        self.0.entry = match self.0.entry.take() {
            Some(inner) => Some(format!("{}/{}", name, inner)),
            None => Some(name.to_string()),
        };
        self
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// An XML declaration names an encoding other than the configured one
    EncodingMismatch {
        declared: String,
        expected: TextEncoding,
    },

    /// An XML declaration could only be found after decoding, so it can't be
    /// checked against the configured encoding
    UnsupportedDeclaration { declared: String },

    /// The DataMashup layout could not be parsed
    MalformedMashupHeader(MashupDefect),

    /// Zero or more than one binding matched the entry name
    AmbiguousOrUnknownEntry { matches: usize },

    /// The escaped literal already contains the line terminator used for splitting
    UnsupportedTerminatorCollision { offset: usize },

    /// The order manifest references an artifact that is not in the tree
    MissingArtifact { name: String },

    /// Input is not JSON
    NotValidJson(serde_json::Error),

    /// Input is not well formed XML
    NotValidXml { offset: u64, msg: String },

    /// Input is not an escaped byte literal
    NotValidLiteral { offset: usize },

    /// Bytes could not be decoded with the configured encoding
    Decode { encoding: TextEncoding },

    /// A JSON object in the raw input already uses the embedded JSON key
    ReservedKey,

    /// A codec was handed a file when it expected a tree, or vice versa
    UnexpectedArtifact { expected: &'static str },

    /// The same entry name appears twice in a container
    DuplicateEntry { name: String },

    /// A DataMashup segment is too large for its 32 bit length prefix
    SegmentTooLarge { len: usize },

    /// An entry name can't be mapped safely onto the file system
    UnsafeEntryName { name: String },

    /// Zip archive could not be read or written
    Zip(zip::result::ZipError),

    /// IO error while persisting or reading artifacts
    Io(std::io::Error),
}

/// The reason a DataMashup payload was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MashupDefect {
    /// The leading 32 bit word is not zero
    NonZeroVersion(u32),

    /// The word between the related length and the second xml length is not zero
    NonZeroReserved(u32),

    /// The related length is not exactly 34 more than the second xml length
    LengthRelation { related: u32, second_xml: u32 },

    /// A length prefix points past the end of the payload
    Truncated { needed: usize, available: usize },
}

impl fmt::Display for MashupDefect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MashupDefect::NonZeroVersion(x) => write!(f, "leading word is {:#x}, not zero", x),
            MashupDefect::NonZeroReserved(x) => {
                write!(f, "reserved word is {:#x}, not zero", x)
            }
            MashupDefect::LengthRelation {
                related,
                second_xml,
            } => write!(
                f,
                "related length {} is not 34 more than second xml length {}",
                related, second_xml
            ),
            MashupDefect::Truncated { needed, available } => write!(
                f,
                "needed {} bytes but only {} remain",
                needed, available
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.0.kind {
            ErrorKind::NotValidJson(ref err) => Some(err),
            ErrorKind::Zip(ref err) => Some(err),
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(entry) = self.entry() {
            write!(f, "{}: ", entry)?;
        }

        match self.0.kind {
            ErrorKind::EncodingMismatch {
                ref declared,
                expected,
            } => write!(
                f,
                "xml declares encoding {} but {} was expected",
                declared,
                expected.xml_name()
            ),
            ErrorKind::UnsupportedDeclaration { ref declared } => write!(
                f,
                "xml declaration for {} is not ascii compatible and must be removed",
                declared
            ),
            ErrorKind::MalformedMashupHeader(ref defect) => {
                write!(f, "malformed data mashup: {}", defect)
            }
            ErrorKind::AmbiguousOrUnknownEntry { matches: 0 } => {
                write!(f, "no codec is bound to this entry")
            }
            ErrorKind::AmbiguousOrUnknownEntry { matches } => {
                write!(f, "entry is ambiguous, {} codec bindings match", matches)
            }
            ErrorKind::UnsupportedTerminatorCollision { offset } => write!(
                f,
                "escaped literal contains the line terminator (offset: {})",
                offset
            ),
            ErrorKind::MissingArtifact { ref name } => {
                write!(f, "artifact is missing: {}", name)
            }
            ErrorKind::NotValidJson(ref err) => write!(f, "not valid json: {}", err),
            ErrorKind::NotValidXml { offset, ref msg } => {
                write!(f, "not valid xml (offset: {}): {}", offset, msg)
            }
            ErrorKind::NotValidLiteral { offset } => {
                write!(f, "not a valid byte literal (offset: {})", offset)
            }
            ErrorKind::Decode { encoding } => {
                write!(f, "data is not valid {}", encoding.label())
            }
            ErrorKind::ReservedKey => write!(f, "json object already uses the embedded json key"),
            ErrorKind::UnexpectedArtifact { expected } => {
                write!(f, "expected the artifact to be a {}", expected)
            }
            ErrorKind::DuplicateEntry { ref name } => write!(f, "duplicate entry: {}", name),
            ErrorKind::SegmentTooLarge { len } => {
                write!(f, "segment of {} bytes does not fit a 32 bit length", len)
            }
            ErrorKind::UnsafeEntryName { ref name } => {
                write!(f, "entry name is not a safe relative path: {}", name)
            }
            ErrorKind::Zip(ref err) => write!(f, "zip error: {}", err),
            ErrorKind::Io(ref err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<MashupDefect> for Error {
    fn from(defect: MashupDefect) -> Self {
        Error::new(ErrorKind::MalformedMashupHeader(defect))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(ErrorKind::NotValidJson(error))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        Error::new(ErrorKind::Zip(error))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}
