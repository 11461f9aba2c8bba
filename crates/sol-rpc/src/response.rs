//! The JSON-RPC result envelope.
//!
//! A node answers either with an error object or with a result, and the
//! result is either a bare value or a `{ context, value }` pair. [`RpcResult`]
//! keeps the two outcomes apart so a remote error stays data until the caller
//! asks for it to be raised.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RpcClientError};

/// Slot context attached to context-wrapped results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcContext {
    pub slot: u64,
}

/// The JSON-RPC `error` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outcome of a single RPC call or subscription notification.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResult<T> {
    /// No error. `value` is `None` when the node returned `null`.
    Success {
        context: Option<RpcContext>,
        value: Option<T>,
    },
    Failure(RpcErrorObject),
}

impl<T: DeserializeOwned> RpcResult<T> {
    /// Decode a full JSON-RPC response object.
    pub fn from_response(response: &Value) -> Result<Self> {
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let error: RpcErrorObject = serde_json::from_value(error.clone())?;
            tracing::debug!(code = error.code, message = %error.message, "rpc error response");
            return Ok(RpcResult::Failure(error));
        }
        match response.get("result") {
            Some(result) => Self::from_result(result),
            None => Err(RpcClientError::Decode(
                "response has neither result nor error".into(),
            )),
        }
    }

    /// Decode the contents of a `result` member.
    pub fn from_result(result: &Value) -> Result<Self> {
        let context = match result.get("context") {
            Some(context) => Some(serde_json::from_value(context.clone())?),
            None => None,
        };

        let raw = match result.get("value") {
            Some(value) if result.is_object() => value,
            _ => result,
        };

        let value = if raw.is_null() {
            None
        } else {
            Some(serde_json::from_value(raw.clone())?)
        };

        Ok(RpcResult::Success { context, value })
    }
}

impl<T> RpcResult<T> {
    /// True when a value is present.
    pub fn is_ok(&self) -> bool {
        matches!(self, RpcResult::Success { value: Some(_), .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            RpcResult::Success { value, .. } => value.as_ref(),
            RpcResult::Failure(_) => None,
        }
    }

    pub fn context(&self) -> Option<&RpcContext> {
        match self {
            RpcResult::Success { context, .. } => context.as_ref(),
            RpcResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcErrorObject> {
        match self {
            RpcResult::Success { .. } => None,
            RpcResult::Failure(error) => Some(error),
        }
    }

    /// `Ok(None)` for an empty success, `Err(Protocol)` for a remote error.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            RpcResult::Success { value, .. } => Ok(value),
            RpcResult::Failure(error) => Err(RpcClientError::Protocol {
                code: error.code,
                message: error.message,
            }),
        }
    }

    /// The value, or a raised fault: [`RpcClientError::Protocol`] for a remote
    /// error, [`RpcClientError::EmptyResult`] when there is no value.
    pub fn unwrap(self) -> Result<T> {
        self.into_result()?.ok_or(RpcClientError::EmptyResult)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RpcResult<U> {
        match self {
            RpcResult::Success { context, value } => RpcResult::Success {
                context,
                value: value.map(f),
            },
            RpcResult::Failure(error) => RpcResult::Failure(error),
        }
    }
}
