use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid reasoner config: {0}")]
    InvalidConfig(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),
}
