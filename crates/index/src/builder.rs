use crate::codec::{self, IndexRecord};
use crate::error::{CodecError, Result};
use std::collections::HashSet;

/// Bytes of each file captured into the content blob.
pub const DEFAULT_CAPTURE_BYTES: usize = 2048;

/// Output of [`PathIndexBuilder::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltIndex {
    /// Encoded path index.
    pub index_bytes: Vec<u8>,
    /// Content blob the records' offsets point into.
    pub content: Vec<u8>,
    pub records: Vec<IndexRecord>,
}

/// Accumulates `(path, content)` pairs into a path index and content blob.
#[derive(Debug)]
pub struct PathIndexBuilder {
    capture_bytes: usize,
    records: Vec<IndexRecord>,
    content: Vec<u8>,
    seen: HashSet<String>,
}

impl Default for PathIndexBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_BYTES)
    }
}

impl PathIndexBuilder {
    pub fn new(capture_bytes: usize) -> Self {
        Self {
            capture_bytes,
            records: Vec::new(),
            content: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn capture_bytes(&self) -> usize {
        self.capture_bytes
    }

    /// Add a path with its content; only the first `capture_bytes` are kept.
    ///
    /// Returns `Ok(false)` for an empty path or a path already added.
    pub fn add(&mut self, path: &str, content: &[u8]) -> Result<bool> {
        if path.is_empty() || self.seen.contains(path) {
            return Ok(false);
        }

        let captured = &content[..content.len().min(self.capture_bytes)];
        let record_idx = self.records.len();
        let offset = u32::try_from(self.content.len()).map_err(|_| CodecError::RecordOverflow {
            record: record_idx,
            detail: "content offset exceeds u32",
        })?;
        let size = u32::try_from(captured.len()).map_err(|_| CodecError::RecordOverflow {
            record: record_idx,
            detail: "content size exceeds u32",
        })?;
        if offset.checked_add(size).is_none() {
            return Err(CodecError::RecordOverflow {
                record: record_idx,
                detail: "content blob exceeds u32",
            });
        }

        self.content.extend_from_slice(captured);
        self.records.push(IndexRecord::new(path, offset, size));
        self.seen.insert(path.to_string());
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> Result<BuiltIndex> {
        let index_bytes = codec::encode(&self.records)?;
        log::debug!(
            "Built path index: {} records, {} content bytes",
            self.records.len(),
            self.content.len()
        );
        Ok(BuiltIndex {
            index_bytes,
            content: self.content,
            records: self.records,
        })
    }
}
