//! Query side of HomeMap: prefix listing, lazy tree expansion, relevance
//! reasoning and structural summaries over a decoded [`PathIndex`].
//!
//! Everything here borrows the index read-only. Building a [`SearchEngine`]
//! is the only preprocessing step; it is cheap to rebuild after re-ingestion.
//!
//! [`PathIndex`]: homemap_index::PathIndex

mod engine;
mod error;
mod reasoner;
mod summary;
mod tree;

pub use engine::SearchEngine;
pub use error::{Result, SearchError};
pub use reasoner::{normalize, tokenize, Reasoner, ReasonerConfig};
pub use summary::{compare, describe_comparison, explain, shared_paths, summarize};
pub use tree::TreeNode;
