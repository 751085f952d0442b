use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuitError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored state is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no quit item with id `{0}`")]
    ItemNotFound(String),
    #[error("a quit item with id `{0}` already exists")]
    DuplicateItem(String),
    #[error("invalid form: {0}")]
    InvalidForm(String),
}

pub type Result<T> = std::result::Result<T, QuitError>;
