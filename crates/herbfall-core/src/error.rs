//! Error types for Herbfall

use thiserror::Error;

/// The main error type for Herbfall setup operations.
///
/// Simulation ticks never fail; only configuration, scene loading and
/// host-facing setup return this.
#[derive(Debug, Error)]
pub enum HerbfallError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Scene error: {0}")]
    SceneError(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Result type alias for Herbfall operations
pub type Result<T> = std::result::Result<T, HerbfallError>;

impl From<toml::de::Error> for HerbfallError {
    fn from(err: toml::de::Error) -> Self {
        HerbfallError::TomlParseError(err.to_string())
    }
}
