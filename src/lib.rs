/*!

Round trip Power BI template containers (`.pbit`) through a diff friendly
directory tree and back.

A template is a zip archive whose entries are encoded for machines: minified
UTF-16 JSON, XML without line breaks, a nested binary container holding
another zip. This crate converts each entry into a readable form suited for
version control and restores the original payload from it.

## Features

- ✔ Exact: the readable form of every entry converts back to the original bytes
- ✔ Ordered: the archive order of the entries is recorded and restored
- ✔ Nested: the DataMashup entry is expanded into its own tree
- ✔ Deterministic: compressing the same tree always produces the same archive
- ✔ Configurable: route entry names to codecs with your own binding table

## Quick Start

```rust
use pbit_vcs::{compress, extract, Artifact, ExtractedTree};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let mut tree = ExtractedTree::new();
tree.push_entry("Version", Artifact::File(b"3.0".to_vec()));
tree.push_entry("Report/Layout", Artifact::File(b"{\n  \"id\": 0\n}\n".to_vec()));

// The layout is stored as minified UTF-16LE in the container
let container = compress(&tree)?;
let extracted = extract(&container)?;
assert_eq!(extracted, tree);
# Ok(())
# }
```

## Entry Codecs

Each entry name is routed through a [BindingTable] to a [Codec]. An exact
name match wins, otherwise the name must start with exactly one bound prefix.

| Entry                      | Codec                        |
|----------------------------|------------------------------|
| `DataModelSchema`          | JSON, UTF-16LE               |
| `DiagramState`             | JSON, UTF-16LE               |
| `Report/Layout`            | JSON, UTF-16LE               |
| `Report/LinguisticSchema`  | XML, UTF-16LE, no declaration|
| `[Content_Types].xml`      | XML, UTF-8 with BOM          |
| `DataMashup`               | nested container             |
| `Metadata`                 | escaped byte literal         |
| everything else bound      | pass through                 |

## One Level Lower

The codecs can be used on their own through the [Transcode] trait:

```rust
use pbit_vcs::{Transcode, XmlCodec, TextEncoding};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let codec = XmlCodec::new(TextEncoding::Utf8).with_declaration(false);
let readable = codec.to_readable(b"<a><b>1</b></a>")?;
assert_eq!(readable, b"<a>\n  <b>1</b>\n</a>\n");
assert_eq!(codec.to_raw(&readable)?, b"<a><b>1</b></a>");
# Ok(())
# }
```

*/

mod archive;
mod codec;
mod encoding;
mod errors;
mod mashup;
mod router;
mod store;
mod tree;
pub(crate) mod util;

pub use self::archive::*;
pub use self::codec::*;
pub use self::encoding::TextEncoding;
pub use self::errors::*;
pub use self::mashup::*;
pub use self::router::{Binding, BindingTable};
pub use self::store::*;
pub use self::tree::{Artifact, ExtractedTree};
