//! The standard [`RpcSender`] over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::{Result, RpcClientError};
use crate::request::RpcRequest;
use crate::sender::RpcSender;

pub struct HttpSender {
    client: reqwest::blocking::Client,
    url: String,
    request_id: AtomicU64,
}

impl HttpSender {
    /// Create an HTTP RPC sender with a 30 second timeout.
    ///
    /// The URL is an HTTP URL, usually for port 8899, as in
    /// "http://localhost:8899".
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::new_with_timeout(url, Duration::from_secs(30))
    }

    pub fn new_with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcClientError::Transport(format!("build rpc client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            request_id: AtomicU64::new(1),
        })
    }
}

impl RpcSender for HttpSender {
    fn send(&self, request: RpcRequest, params: Value) -> Result<Value> {
        let request_id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = request.build_request_json(request_id, params).to_string();

        tracing::trace!(%request, request_id, url = %self.url, "http rpc request");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| RpcClientError::Transport(format!("{request}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| RpcClientError::Transport(format!("{request}: {e}")))?;

        // JSON-RPC errors may come back with a non-2xx status; keep them as data.
        match serde_json::from_str::<Value>(&text) {
            Ok(json) if json.get("result").is_some() || json.get("error").is_some() => Ok(json),
            _ if !status.is_success() => Err(RpcClientError::Transport(format!(
                "{request}: http status {status}: {text}"
            ))),
            Ok(json) => Ok(json),
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}
