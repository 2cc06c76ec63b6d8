//! Error types for route execution.
//!
//! # Design
//! `RouteError` is the single failure channel for both execution modes. The
//! variants split into pre-dispatch failures (`BaseUrlInvalid`,
//! `UrlEncoding`, `ParametersEncoding`), which never reach the transport, and
//! post-dispatch failures, which are mutually exclusive and produced by the
//! classifier in a fixed order. `TransportError` is whatever the transport
//! reports before an HTTP response exists.

use thiserror::Error;

use crate::types::{Parameters, ResponseDataType};

/// Failure reported by a [`Transport`](crate::transport::Transport) before an
/// HTTP response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket-level failure such as a refused or reset connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The call was cancelled through its `RequestHandle`.
    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors delivered to the caller of a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The session's base URL does not parse, or cannot carry a path.
    #[error("invalid base URL: {base_url:?}")]
    BaseUrlInvalid { base_url: String },

    /// Query items could not be turned into a valid URL.
    #[error("failed to encode URL parameters")]
    UrlEncoding,

    /// The JSON body could not be serialized.
    #[error("failed to encode parameters as JSON: {source}")]
    ParametersEncoding {
        parameters: Parameters,
        #[source]
        source: serde_json::Error,
    },

    /// The transport failed before producing a response.
    #[error("request failed: {0}")]
    Request(#[from] TransportError),

    /// The exchange completed without an HTTP response.
    #[error("no HTTP response received")]
    ResponseFailed,

    /// The server answered with a status outside 200..=299.
    #[error("unexpected HTTP status {status}")]
    HttpStatusCodeInvalid { status: u16 },

    /// A 2xx response carried no payload.
    #[error("response carried no data")]
    NoResponseData,

    /// The payload did not decode into the requested type.
    #[error("failed to decode JSON response: {source}")]
    DecodingJsonData {
        data: Vec<u8>,
        #[source]
        source: serde_json::Error,
    },

    /// Responses of this data type cannot be decoded.
    #[error("{0} responses are not supported")]
    NotImplemented(ResponseDataType),
}

impl RouteError {
    /// Returns `true` if the call failed before anything was sent.
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(
            self,
            RouteError::BaseUrlInvalid { .. }
                | RouteError::UrlEncoding
                | RouteError::ParametersEncoding { .. }
        )
    }

    /// The HTTP status, when the failure was a status-range rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            RouteError::HttpStatusCodeInvalid { status } => Some(*status),
            _ => None,
        }
    }
}

/// Result of executing a route.
pub type RouteResult<T> = Result<T, RouteError>;
