use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManifestError>;

/// Failure reported by a [`crate::PartFetcher`] for a single reference.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid part reference: {0}")]
    InvalidReference(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors raised while resolving, assembling or producing a manifest.
///
/// Assembly failures are always fatal to the whole call; no partially
/// assembled buffer is ever handed back.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(String),

    #[error("Malformed manifest {name}: {reason}")]
    MalformedManifest { name: String, reason: String },

    #[error("Manifest {0} lists no parts")]
    EmptyManifest(String),

    #[error("Failed to fetch part {part}: {source}")]
    PartFetchFailed {
        part: String,
        #[source]
        source: FetchError,
    },

    #[error("Invalid part size: {0}")]
    InvalidPartSize(u64),

    #[error("Nothing to split: {0} is empty")]
    EmptyInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ManifestError {
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedManifest {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn part_failed(part: impl Into<String>, source: FetchError) -> Self {
        Self::PartFetchFailed {
            part: part.into(),
            source,
        }
    }

    /// Stable machine-readable code, used in JSON error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "manifest_not_found",
            Self::MalformedManifest { .. } => "malformed_manifest",
            Self::EmptyManifest(_) => "empty_manifest",
            Self::PartFetchFailed { .. } => "part_fetch_failed",
            Self::InvalidPartSize(_) => "invalid_part_size",
            Self::EmptyInput(_) => "empty_input",
            Self::IoError(_) => "io_error",
        }
    }
}
