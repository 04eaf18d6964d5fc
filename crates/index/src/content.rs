use crate::codec::IndexRecord;
use crate::error::PreviewError;
use crate::path_index::PathIndex;
use std::sync::Arc;

/// Default number of bytes a preview may span.
pub const DEFAULT_PREVIEW_BYTES: usize = 2048;

/// Source of preview text for a path.
///
/// A missing preview is `None`, never an error; consumers treat it as empty text.
pub trait PreviewAccessor {
    fn preview(&self, path: &str) -> Option<String>;
}

impl<F> PreviewAccessor for F
where
    F: Fn(&str) -> Option<String>,
{
    fn preview(&self, path: &str) -> Option<String> {
        self(path)
    }
}

/// Accessor that never has a preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreview;

impl PreviewAccessor for NoPreview {
    fn preview(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Reassembled content buffer that index records point into.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    bytes: Arc<[u8]>,
}

impl ContentStore {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw byte range of `record`, bounds-checked against this buffer.
    pub fn slice(&self, record: &IndexRecord) -> Result<&[u8], PreviewError> {
        let len = self.bytes.len();
        if record.end() > len as u64 {
            return Err(PreviewError::OutOfBounds {
                path: record.path.clone(),
                offset: record.offset,
                size: record.size,
                len,
            });
        }
        let start = record.offset as usize;
        Ok(&self.bytes[start..start + record.size as usize])
    }

    /// At most `max_bytes` of the record's content as text.
    pub fn preview(&self, record: &IndexRecord, max_bytes: usize) -> Result<String, PreviewError> {
        let raw = self.slice(record)?;
        let cut = &raw[..raw.len().min(max_bytes)];
        Ok(decode_text(cut))
    }
}

/// Decode `bytes` as UTF-8, dropping a multi-byte sequence cut at the end and
/// replacing any other invalid sequence.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(err) if err.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..err.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Previews backed by a path index and, when loaded, its content buffer.
pub struct IndexedContent<'a> {
    index: &'a PathIndex,
    content: Option<&'a ContentStore>,
    max_bytes: usize,
}

impl<'a> IndexedContent<'a> {
    pub fn new(index: &'a PathIndex, content: Option<&'a ContentStore>) -> Self {
        Self {
            index,
            content,
            max_bytes: DEFAULT_PREVIEW_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl PreviewAccessor for IndexedContent<'_> {
    fn preview(&self, path: &str) -> Option<String> {
        let content = self.content?;
        let record = self.index.lookup(path)?;
        match content.preview(record, self.max_bytes) {
            Ok(text) => Some(text),
            Err(err) => {
                log::debug!("No preview for {path}: {err}");
                None
            }
        }
    }
}
