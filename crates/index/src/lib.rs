//! Path index, tag index and content previews for HomeMap sources
//!
//! A source is published as three assets: a binary path index, a tag list and
//! a content blob. This crate decodes and encodes the first, parses the second
//! and slices previews out of the third.
//!
//! ## Example
//!
//! ```
//! use homemap_index::{IndexRecord, PathIndex, TagIndex};
//!
//! let bytes = homemap_index::encode(&[IndexRecord::new("src/a.txt", 0, 3)]).unwrap();
//! let index = PathIndex::decode(&bytes).unwrap();
//! assert_eq!(index.lookup("src/a.txt").map(|r| r.size), Some(3));
//!
//! let tags = TagIndex::parse(b"model\tsrc/a.txt\n");
//! assert_eq!(tags.tags_for("src/a.txt"), vec!["model"]);
//! ```

mod builder;
mod codec;
mod content;
mod error;
mod path_index;
mod tags;

pub use builder::{BuiltIndex, PathIndexBuilder, DEFAULT_CAPTURE_BYTES};
pub use codec::{decode, encode, IndexRecord, RECORD_FIXED_BYTES};
pub use content::{
    ContentStore, IndexedContent, NoPreview, PreviewAccessor, DEFAULT_PREVIEW_BYTES,
};
pub use error::{CodecError, PreviewError, Result};
pub use path_index::{PathIndex, PathIndexSnapshot, SNAPSHOT_VERSION};
pub use tags::TagIndex;
