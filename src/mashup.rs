//! Expand the DataMashup entry of a container.
//!
//! The DataMashup entry is a custom binary container. All integers are 32 bit
//! little endian:
//!
//! ```text
//! [4 bytes: zero]
//! [4 bytes: len1] [len1 bytes: package zip]
//! [4 bytes: len2] [len2 bytes: first xml]
//! [4 bytes: len3 + 34] [4 bytes: zero] [4 bytes: len3] [len3 bytes: second xml]
//! [remaining bytes: opaque tail]
//! ```
//!
//! Nothing is known about the origin of the 34 byte difference or the zero
//! word that follows it. Both are checked when parsing and written verbatim
//! when encoding, so an input that deviates from them fails instead of
//! being silently rewritten.
//!
//! ```text
//! MashupCodec
//! ├── package zip  → nested tree with its own order manifest
//! ├── first xml    → 3.xml
//! ├── second xml   → 6.xml
//! └── tail         → 7.bytes
//! ```

mod codec;
mod layout;

pub use codec::*;
pub use layout::*;
