//! Error types for the public surface of the crate.
//!
//! Internally everything returns `Res<T>`, which is an `anyhow::Result`. At the boundary of a
//! command the error is tagged with an `ErrorType` by calling `pub_result` so that callers can
//! tell a broken configuration apart from a failed spreadsheet call.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub(crate) type Res<T> = anyhow::Result<T>;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an error returned from a public function.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration directory or file is missing or invalid.
    Config,
    /// Service-account credentials could not be loaded or exchanged for a token.
    Auth,
    /// A call to the spreadsheet service failed.
    Sheet,
    /// The user's input could not be used, e.g. a batch file with too many entries.
    Request,
    /// The form server could not be started.
    Service,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error returned from the public functions of this crate.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts any internal result into the public `Result` by tagging it with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_context_chain() {
        let res: Res<()> = Err(anyhow::anyhow!("quota exceeded")).context("Failed to insert rows");
        let err = res.pub_result(ErrorType::Sheet).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Sheet);
        assert_eq!(err.to_string(), "Failed to insert rows: quota exceeded");
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Config.to_string(), "config");
        assert_eq!("auth".parse::<ErrorType>().unwrap(), ErrorType::Auth);
    }
}
