use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Normalization error: {0}")]
    Normalization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type EmbedResult<T> = Result<T, EmbedError>;
