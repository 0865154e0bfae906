use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassloomError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("class map serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("plugin error: {0}")]
    Plugin(String),
}

pub type Result<T> = std::result::Result<T, ClassloomError>;
