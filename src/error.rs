use axum::response::{IntoResponse, Response};
use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid archive identifier")]
    InvalidIdentifier,
    #[error("archive not found")]
    ArchiveNotFound,
    #[error("cannot resolve archive path")]
    PathResolve,
    #[error("cannot start archiver")]
    ArchiverSpawn,
    #[error("index page unavailable")]
    IndexUnavailable,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            // Rejected identifiers look exactly like missing directories.
            InvalidIdentifier => StatusCode::NOT_FOUND,
            ArchiveNotFound => StatusCode::NOT_FOUND,
            PathResolve => StatusCode::INTERNAL_SERVER_ERROR,
            ArchiverSpawn => StatusCode::INTERNAL_SERVER_ERROR,
            IndexUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = match self {
            Error::InvalidIdentifier => Error::ArchiveNotFound.to_string(),
            ref other => other.to_string(),
        };
        (self.status_code(), message).into_response()
    }
}

pub mod archive {
    pub use super::Error::{ArchiveNotFound, ArchiverSpawn, InvalidIdentifier, PathResolve};
}

pub mod assets {
    pub use super::Error::IndexUnavailable;
}
