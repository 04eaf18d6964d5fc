use crate::descriptor::PartRef;
use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Transport that turns a part reference into bytes.
///
/// Timeouts and retries are the transport's business; the assembler calls
/// `fetch` exactly once per part.
#[async_trait]
pub trait PartFetcher: Send + Sync {
    async fn fetch(&self, reference: &PartRef) -> FetchResult<Vec<u8>>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// Reads parts from a directory on disk.
pub struct LocalPartFetcher {
    root: PathBuf,
}

impl LocalPartFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Only plain relative names are accepted; `..`, roots and prefixes are
    /// rejected so a descriptor cannot point outside the source directory.
    fn resolve(&self, reference: &PartRef) -> FetchResult<PathBuf> {
        let relative = Path::new(reference.as_str());
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !plain || reference.as_str().is_empty() {
            return Err(FetchError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PartFetcher for LocalPartFetcher {
    async fn fetch(&self, reference: &PartRef) -> FetchResult<Vec<u8>> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(reference.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Fetches parts over HTTP(S) relative to a base URL.
pub struct HttpPartFetcher {
    client: reqwest::Client,
    base: String,
}

impl HttpPartFetcher {
    pub fn new(base: impl Into<String>) -> FetchResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { client, base }
    }

    fn url_for(&self, reference: &PartRef) -> String {
        format!("{}{}", self.base, reference.as_str().trim_start_matches('/'))
    }
}

#[async_trait]
impl PartFetcher for HttpPartFetcher {
    async fn fetch(&self, reference: &PartRef) -> FetchResult<Vec<u8>> {
        let url = self.url_for(reference);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(reference.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn describe(&self) -> String {
        self.base.clone()
    }
}

/// Serves parts from memory; useful when the caller already holds the bytes
/// (imported files, tests).
#[derive(Default, Clone)]
pub struct MemoryPartFetcher {
    parts: HashMap<String, Vec<u8>>,
}

impl MemoryPartFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_part(mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(reference, bytes);
        self
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.parts.insert(reference.into(), bytes.into());
    }
}

#[async_trait]
impl PartFetcher for MemoryPartFetcher {
    async fn fetch(&self, reference: &PartRef) -> FetchResult<Vec<u8>> {
        self.parts
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(reference.to_string()))
    }

    fn describe(&self) -> String {
        format!("memory ({} parts)", self.parts.len())
    }
}

/// Where a source's assets live. Selects the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Local(PathBuf),
    Http(String),
}

impl SourceLocation {
    pub fn fetcher(&self) -> FetchResult<Arc<dyn PartFetcher>> {
        Ok(match self {
            Self::Local(root) => Arc::new(LocalPartFetcher::new(root)),
            Self::Http(base) => Arc::new(HttpPartFetcher::new(base.clone())?),
        })
    }
}

impl FromStr for SourceLocation {
    type Err = FetchError;

    fn from_str(raw: &str) -> FetchResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FetchError::InvalidReference(
                "empty source location".to_string(),
            ));
        }
        let lowered = raw.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Ok(Self::Http(raw.to_string()));
        }
        let path = raw.strip_prefix("file://").unwrap_or(raw);
        Ok(Self::Local(PathBuf::from(path)))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(root) => write!(f, "{}", root.display()),
            Self::Http(base) => f.write_str(base),
        }
    }
}
