use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A record is missing a required field or carries an invalid value
    #[error("Record validation error in field `{field}`: {message}")]
    RecordValidation { field: String, message: String },

    /// Transform or predict requested before the corresponding fit
    #[error("Unfitted state: {0}")]
    UnfittedState(String),

    /// Not enough data to perform the requested operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A persisted model artifact is malformed or incomplete
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// Dataset load/store errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Model training errors
    #[error("Training error: {0}")]
    Training(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid lifecycle transition (e.g. refitting a fitted engineer)
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::RecordValidation { .. } => "RECORD_VALIDATION_ERROR",
            AppError::UnfittedState(_) => "UNFITTED_STATE",
            AppError::InsufficientData(_) => "INSUFFICIENT_DATA",
            AppError::CorruptArtifact(_) => "CORRUPT_ARTIFACT",
            AppError::Dataset(_) => "DATASET_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
        }
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Dataset(err.to_string())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
