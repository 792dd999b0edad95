use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot read file: {1}")]
    Read(#[source] std::io::Error, String),

    #[error("Cannot write file: {1}")]
    Write(#[source] std::io::Error, String),

    #[error("Cannot create folders to specified path: {1}")]
    NoCreateFolderPermission(#[source] std::io::Error, String),

    #[error("Cannot parse JSON file: {1}")]
    ParseJson(#[source] serde_json::Error, String),

    #[error("Cannot serialize value.")]
    SerializeJson(#[from] serde_json::Error),

    #[error("Invalid file pattern: {1}")]
    Pattern(#[source] globset::Error, String),

    #[error("Cannot list snapshot files: {1}")]
    ListFiles(#[source] walkdir::Error, String),

    #[error("Failed to download '{0}'.")]
    Download(String, #[source] Box<dyn std::error::Error + Send + Sync>),
}
