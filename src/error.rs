// Error types shared by the codec, the transport and the operation layer.
//
// Nothing here is fatal: the menu loop renders every variant as a message
// and keeps going. Only the initial login failure ends the process.

use reqwest::StatusCode;

/// Message used when the server reports a failure without a `message` field.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Failures while turning a response document into a result mapping.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid XML response: {0}")]
    Parse(String),
    #[error("invalid SOAP response: Body element missing")]
    MissingBody,
    #[error("{0}Response not found")]
    ResponseNotFound(String),
    #[error("SOAP fault: {0}")]
    Fault(String),
}

/// Failures talking to the server over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("an administrative token is required for this operation")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    /// Business failure reported by the server, message kept verbatim.
    #[error("{0}")]
    Domain(String),
    #[error("could not read the user list: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type ClientResult<T, E = ClientError> = std::result::Result<T, E>;
