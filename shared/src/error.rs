use thiserror::Error;

/// Errors raised while loading or checking module configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read module configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid module configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Mapping path must start with '/': {0}")]
    InvalidPath(String),
    #[error("Duplicate mapping path: {0}")]
    DuplicateMapping(String),
    #[error("Mapping {mapping} references unknown form bean '{form}'")]
    UnknownFormBean { mapping: String, form: String },
    #[error("Mapping {0} declares more than one of action, forward and include")]
    ConflictingTargets(String),
    #[error("More than one mapping is flagged as unknown: {0}")]
    DuplicateUnknown(String),
}
