use crate::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Suffix appended to a logical asset name to locate its descriptor.
pub const DESCRIPTOR_SUFFIX: &str = ".manifest.json";

/// Reference for the descriptor of `logical_name`.
#[must_use]
pub fn descriptor_reference(logical_name: &str) -> PartRef {
    PartRef::new(format!("{logical_name}{DESCRIPTOR_SUFFIX}"))
}

/// Opaque reference to one part, resolved by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartRef(String);

impl PartRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Ordered list of parts that concatenate into one logical asset.
///
/// Order of `parts` is the concatenation order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDescriptor {
    logical_name: String,
    parts: Vec<PartRef>,
    total_size: Option<u64>,
    part_size: Option<u64>,
    digest: Option<String>,
}

/// On-disk shape written by the splitter.
#[derive(Serialize)]
struct DescriptorFile<'a> {
    file: &'a str,
    parts: &'a [PartRef],
    #[serde(skip_serializing_if = "Option::is_none")]
    total_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    part_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blake3: Option<&'a str>,
}

impl ManifestDescriptor {
    pub fn new(
        logical_name: impl Into<String>,
        parts: Vec<PartRef>,
        total_size: Option<u64>,
    ) -> Result<Self> {
        let logical_name = logical_name.into();
        if parts.is_empty() {
            return Err(ManifestError::EmptyManifest(logical_name));
        }
        Ok(Self {
            logical_name,
            parts,
            total_size,
            part_size: None,
            digest: None,
        })
    }

    #[must_use]
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }

    /// Attach the blake3 hex digest of the assembled bytes.
    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into().to_ascii_lowercase());
        self
    }

    /// Parse a JSON descriptor.
    ///
    /// Accepts `parts` or its alias `files`, and `total_size` or its alias
    /// `original_size`. Every part must be a non-empty string. An optional
    /// `blake3` field carries the hex digest of the assembled bytes.
    pub fn parse(logical_name: &str, bytes: &[u8]) -> Result<Self> {
        let malformed = |reason: String| ManifestError::malformed(logical_name, reason);

        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| malformed(format!("invalid JSON: {err}")))?;
        let Some(object) = value.as_object() else {
            return Err(malformed("descriptor is not a JSON object".to_string()));
        };

        let parts_value = object
            .get("parts")
            .or_else(|| object.get("files"))
            .ok_or_else(|| malformed("missing `parts`".to_string()))?;
        let Some(entries) = parts_value.as_array() else {
            return Err(malformed("`parts` is not a sequence".to_string()));
        };
        if entries.is_empty() {
            return Err(ManifestError::EmptyManifest(logical_name.to_string()));
        }

        let parts = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                entry
                    .as_str()
                    .filter(|s| !s.trim().is_empty())
                    .map(PartRef::from)
                    .ok_or_else(|| malformed(format!("part #{idx} is not a non-empty string")))
            })
            .collect::<Result<Vec<_>>>()?;

        let total_size = match object.get("total_size").or_else(|| object.get("original_size")) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(raw.as_u64().ok_or_else(|| {
                malformed("`total_size` is not a non-negative integer".to_string())
            })?),
        };
        let part_size = object.get("part_size").and_then(Value::as_u64);
        let digest = match object.get("blake3") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let hex = raw
                    .as_str()
                    .filter(|d| d.len() == 64 && d.bytes().all(|b| b.is_ascii_hexdigit()))
                    .ok_or_else(|| malformed("`blake3` is not a 64-char hex digest".to_string()))?;
                Some(hex.to_ascii_lowercase())
            }
        };

        Ok(Self {
            logical_name: logical_name.to_string(),
            parts,
            total_size,
            part_size,
            digest,
        })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&DescriptorFile {
            file: &self.logical_name,
            parts: &self.parts,
            total_size: self.total_size,
            part_size: self.part_size,
            blake3: self.digest.as_deref(),
        })
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn parts(&self) -> &[PartRef] {
        &self.parts
    }

    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    pub fn part_size(&self) -> Option<u64> {
        self.part_size
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}
