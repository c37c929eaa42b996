use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("'{0}' doesn't exist")]
    StageFileNotFound(String),

    #[error("Failed to parse {path}: {message}")]
    EnvParse { path: String, message: String },

    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    // Chunking
    #[error("Chunk key {key} produced from {source_key} collides with an existing local key")]
    KeyCollision { key: String, source_key: String },

    // Remote
    #[error("Failed to fetch parameters under {prefix}: {source}")]
    RemoteFetch {
        prefix: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to delete {count} parameters: {source}")]
    Delete {
        count: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write {key} after {attempts} attempts: {source}")]
    Write {
        key: String,
        attempts: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Output file {0} already exists (use --force to overwrite)")]
    OutputExists(String),

    // Confirmation gate
    #[error("Aborted: removal of all remote parameters was not confirmed")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, SyncError>;
