//! Error types for route registration and dispatch.

use hyper::header::InvalidHeaderValue;
use hyper::StatusCode;
use thiserror::Error;

/// An application failure raised by a middleware or resource handler.
///
/// The router never inspects these; they reach the configured hooks or the
/// host unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the router itself.
#[derive(Debug, Error)]
pub enum Error {
    /// The path pattern could not be compiled.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The resource does not implement any recognized HTTP method.
    #[error("resource should have at least one key with a valid HTTP verb")]
    NoRecognizedMethod,

    /// `collection()` was called without a collection resource.
    #[error("collection() requires a `collection` resource, path was: {0}")]
    MissingCollection(String),

    /// `handle()` was called with an unknown fallback type.
    #[error("`type` argument must be one of 'OPTIONS', 'HEAD', 'methodNotAllowed', found: {0}")]
    UnknownFallback(String),

    /// A captured path parameter is not valid percent-encoding.
    #[error("failed to decode param '{0}'")]
    DecodeParam(String),

    /// A header value written by the router was rejected.
    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl Error {
    /// The response status this error maps to when it reaches the host.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::DecodeParam(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, Error>;
