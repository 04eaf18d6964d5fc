//! Binary path index format.
//!
//! ```text
//! u32 record_count                      (little-endian)
//! repeat record_count times:
//!     u32 path_byte_length
//!     u8[path_byte_length] path         (UTF-8, no terminator)
//!     u32 offset
//!     u32 size
//! ```
//!
//! The layout is shared with existing index producers and must stay byte-exact.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Bytes every record occupies besides its path: length, offset and size.
pub const RECORD_FIXED_BYTES: usize = 12;

/// One indexed path and the byte range of its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRecord {
    pub path: String,
    pub offset: u32,
    pub size: u32,
}

impl IndexRecord {
    pub fn new(path: impl Into<String>, offset: u32, size: u32) -> Self {
        Self {
            path: path.into(),
            offset,
            size,
        }
    }

    /// Exclusive end of the content range, computed without overflow.
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Decode every record of `buffer`, in buffer order.
///
/// Never reads out of bounds: each length is checked against the remaining
/// bytes before it is trusted, including the declared record count.
pub fn decode(buffer: &[u8]) -> Result<Vec<IndexRecord>> {
    let mut reader = Reader::new(buffer);
    let count = reader.read_u32()? as usize;

    // Cap the allocation by what the buffer could possibly hold.
    let mut records = Vec::with_capacity(count.min(reader.remaining() / RECORD_FIXED_BYTES));

    for record in 0..count {
        let path_len = reader.read_u32()? as usize;
        // The path must leave room for this record's offset and size.
        reader.ensure(path_len.saturating_add(8))?;
        let raw = reader.take(path_len)?;
        let path = std::str::from_utf8(raw)
            .map_err(|_| CodecError::InvalidUtf8 { record })?
            .to_string();
        let offset = reader.read_u32()?;
        let size = reader.read_u32()?;
        records.push(IndexRecord { path, offset, size });
    }

    if reader.remaining() > 0 {
        log::debug!(
            "Ignoring {} trailing bytes after {} index records",
            reader.remaining(),
            count
        );
    }
    Ok(records)
}

/// Encode `records` in the exact layout [`decode`] reads.
pub fn encode(records: &[IndexRecord]) -> Result<Vec<u8>> {
    let count = u32::try_from(records.len()).map_err(|_| CodecError::RecordOverflow {
        record: records.len(),
        detail: "record count exceeds u32",
    })?;

    let capacity = 4 + records
        .iter()
        .map(|r| RECORD_FIXED_BYTES + r.path.len())
        .sum::<usize>();
    let mut out = Vec::with_capacity(capacity);
    out.extend_from_slice(&count.to_le_bytes());

    for (idx, record) in records.iter().enumerate() {
        let path_len = u32::try_from(record.path.len()).map_err(|_| CodecError::RecordOverflow {
            record: idx,
            detail: "path length exceeds u32",
        })?;
        out.extend_from_slice(&path_len.to_le_bytes());
        out.extend_from_slice(record.path.as_bytes());
        out.extend_from_slice(&record.offset.to_le_bytes());
        out.extend_from_slice(&record.size.to_le_bytes());
    }
    Ok(out)
}
