use std::path::PathBuf;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
  /// A required field is missing or does not have the expected type.
  #[error("{path:?}: malformed report field `{field}`: {reason}")]
  MalformedReport {
    path: PathBuf,
    field: String,
    reason: String,
  },
  /// A measurement array has no samples, so its statistics are undefined.
  #[error("{path:?}: `{field}` has no measurements")]
  EmptyMeasurement { path: PathBuf, field: &'static str },
  #[error("group disagrees on `{field}`: expected {expected}, found {found}")]
  InconsistentGroup {
    field: &'static str,
    expected: String,
    found: String,
  },
  #[error("cannot render an empty group")]
  EmptyGroup,
  #[error("render: {0}")]
  Render(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("{path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  pub fn malformed(path: impl Into<PathBuf>, field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::MalformedReport {
      path: path.into(),
      field: field.into(),
      reason: reason.into(),
    }
  }

  pub fn render(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self::Render(cause.into())
  }

  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
