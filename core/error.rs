use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Repository Access Error: {0}")]
    RepositoryAccess(String),

    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Encoding Error: '{path}' is not valid UTF-8")]
    Encoding { path: String },

    #[error("Classification Error: '{path}': {reason}")]
    Classification { path: String, reason: String },

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("YAML Parsing/Serialization Error: {0}")]
    YamlError(#[from] serde_yml::Error),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// True for errors that only affect a single file and are recovered by skipping it.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            AppError::Encoding { .. } | AppError::Classification { .. } | AppError::FileRead { .. }
        )
    }
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Configuration(format!("Invalid glob pattern: {}", err))
    }
}
