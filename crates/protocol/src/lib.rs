use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod path_filters;

pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

/// One ranked hit produced by the relevance reasoner.
///
/// Owned by the caller once returned; nothing in the core keeps a copy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct QueryResult {
    pub path: String,
    pub score: u32,
    /// First non-empty line of the preview, bounded in length.
    pub snippet: String,
    /// Per-token scoring steps, in token order.
    pub rationale: Vec<String>,
}

/// Full reasoner output: ranked results plus the human-readable trace.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Answer {
    pub query: String,
    pub tokens: Vec<String>,
    pub results: Vec<QueryResult>,
    pub trace: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub synthesis: String,
}

impl Answer {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// One level of a lazily expanded folder.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ChildEntry {
    pub name: String,
    pub is_leaf: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct DirCount {
    pub dir: String,
    pub count: usize,
}

/// Structural overview of one ingested source.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct SourceSummary {
    pub path_count: usize,
    pub tag_count: usize,
    pub largest_dirs: Vec<DirCount>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Comparison {
    pub a_name: String,
    pub b_name: String,
    pub a_paths: usize,
    pub b_paths: usize,
    pub shared: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Envelope used for every `--json` response so consumers can branch on `status`.
#[derive(Debug, Serialize, Clone)]
pub struct Response<T: Serialize> {
    pub schema_version: u32,
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            status: "ok",
            data,
        }
    }
}

impl Response<ErrorEnvelope> {
    pub fn error(envelope: ErrorEnvelope) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            status: "error",
            data: envelope,
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
