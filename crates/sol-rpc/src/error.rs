use sol_core::SolError;
use thiserror::Error;

/// Errors raised by the RPC connection layer.
#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error(transparent)]
    Core(#[from] SolError),

    /// The node answered with a JSON-RPC error object. Code and message are
    /// preserved verbatim.
    #[error("protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// The node answered without an error but also without a value.
    #[error("no result")]
    EmptyResult,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transport could not deliver the request or its response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response did not have the JSON-RPC shape.
    #[error("decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, RpcClientError>;
