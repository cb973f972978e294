use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid version: {0:?} has no numeric components")]
    InvalidVersion(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
