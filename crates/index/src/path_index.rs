use crate::codec::{self, IndexRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Decoded path table with O(1) lookup by path.
///
/// Immutable once built. Re-ingesting a source builds a new `PathIndex`
/// rather than patching an existing one.
///
/// When the same path appears more than once, it keeps the position of its
/// first occurrence and the offset/size of its last one.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    records: Vec<IndexRecord>,
    lookup: HashMap<String, usize>,
    duplicates: usize,
}

/// Serializable form of a [`PathIndex`], for callers that persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathIndexSnapshot {
    pub version: u32,
    pub records: Vec<IndexRecord>,
}

impl PathIndex {
    /// Decode a reassembled index buffer.
    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let records = codec::decode(buffer)?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<IndexRecord>) -> Self {
        let mut lookup = HashMap::with_capacity(records.len());
        let mut unique: Vec<IndexRecord> = Vec::with_capacity(records.len());
        let mut duplicates = 0;

        for record in records {
            match lookup.get(&record.path).copied() {
                Some(pos) => {
                    unique[pos] = record;
                    duplicates += 1;
                }
                None => {
                    lookup.insert(record.path.clone(), unique.len());
                    unique.push(record);
                }
            }
        }

        if duplicates > 0 {
            log::debug!("Path index had {duplicates} duplicate paths; last record kept");
        }
        Self {
            records: unique,
            lookup,
            duplicates,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(&self.records)
    }

    pub fn lookup(&self, path: &str) -> Option<&IndexRecord> {
        self.lookup.get(path).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup.contains_key(path)
    }

    /// Records in encounter order.
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&IndexRecord> {
        self.records.get(position)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|r| r.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that were overridden by a later record for the same path.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn snapshot(&self) -> PathIndexSnapshot {
        PathIndexSnapshot {
            version: SNAPSHOT_VERSION,
            records: self.records.clone(),
        }
    }
}

impl From<PathIndexSnapshot> for PathIndex {
    fn from(snapshot: PathIndexSnapshot) -> Self {
        Self::from_records(snapshot.records)
    }
}
