use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaConfigError {
    #[error("unsupported runtime mode '{0}'. Use development or production.")]
    UnknownMode(String),
    #[error("{key} must be an absolute http(s) URL, got '{value}'")]
    InvalidUrl { key: &'static str, value: String },
}
