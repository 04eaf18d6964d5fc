//! # HomeMap Manifest
//!
//! Reassembly of large assets that are published as several parts.
//!
//! ## Pipeline
//!
//! ```text
//! logical name
//!     │
//!     ├──> <name>.manifest.json (PartFetcher)
//!     │      └─> ordered PartRef list
//!     │
//!     ├──> part fetches (bounded fanout, any completion order)
//!     │
//!     └──> concatenation in manifest order
//!            └─> one contiguous buffer
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use homemap_manifest::{ManifestAssembler, SourceLocation};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let location: SourceLocation = "docs/data".parse()?;
//!     let assembler = ManifestAssembler::new(location.fetcher()?);
//!     let bytes = assembler.assemble("home.index.bin").await?;
//!     println!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

mod assembler;
mod descriptor;
mod error;
mod fetcher;
mod limits;
mod split;

pub use assembler::ManifestAssembler;
pub use descriptor::{descriptor_reference, ManifestDescriptor, PartRef, DESCRIPTOR_SUFFIX};
pub use error::{FetchError, ManifestError, Result};
pub use fetcher::{
    FetchResult, HttpPartFetcher, LocalPartFetcher, MemoryPartFetcher, PartFetcher,
    SourceLocation,
};
pub use limits::{AssemblerConfig, FETCH_CONCURRENCY_ENV};
pub use split::{part_name, split_file, DEFAULT_PART_SIZE};
