//! Error taxonomy for bound calls.
//!
//! Variants split into local failures (detected before any I/O and never
//! retried) and remote ones surfaced by the executor or the parser.
use perch_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum Error {
    /// A named argument outside the descriptor's allow-list.
    #[error("parameter `{param}` is not accepted by {path}")]
    Parameter { param: String, path: &'static str },

    /// Positional arguments do not line up with the template's placeholders.
    #[error("{template} expects {expected} positional argument(s), got {supplied}")]
    PathSubstitution {
        template: &'static str,
        expected: usize,
        supplied: usize,
    },

    #[error("authentication required for {0}")]
    AuthRequired(&'static str),

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("file is too big ({size} bytes), must be at most {max_kb} KB")]
    FileTooLarge { size: u64, max_kb: u64 },

    #[error("unable to access file {}: {message}", .path.display())]
    FileUnreadable { path: PathBuf, message: String },

    #[error("could not determine file type of {}", .0.display())]
    UnknownType(PathBuf),

    #[error("invalid file type for image: {0}")]
    UnsupportedType(String),

    #[error("network error after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: usize },

    #[error("server returned {status}: {message}")]
    HttpStatus {
        status: u16,
        message: String,
        body: String,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("request could not be built: {0}")]
    Request(String),

    #[error("{0} is not declared as a probe")]
    NotProbe(&'static str),

    #[error("{0} does not declare a pagination mode")]
    NotPaginated(&'static str),
}

impl Error {
    /// True for failures raised before any network activity.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            Error::Network { .. } | Error::HttpStatus { .. } | Error::Parse(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Build(message) => Error::Request(message),
            HttpError::Network { message, attempts } => Error::Network { message, attempts },
            HttpError::Status {
                status,
                message,
                body,
            } => Error::HttpStatus {
                status,
                message,
                body,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
