use thiserror::Error;

/// Errors surfaced by progress import and pronunciation recording.
#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Failed to parse progress data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported progress format version {found} (latest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("No text to analyze")]
    EmptyText,
}

/// Errors raised while reading the environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
