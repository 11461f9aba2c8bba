//! Transport seams.
//!
//! The connection never opens sockets itself. Request/response calls go
//! through an [`RpcSender`]; subscriptions through a [`PubsubSender`], which
//! hands back one channel per subscription. Notifications are decoded
//! synchronously on the receiving side.

use std::marker::PhantomData;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, RpcClientError};
use crate::request::{PubsubRequest, RpcRequest};
use crate::response::RpcResult;

/// A transport for RPC calls.
///
/// Implemented by [`HttpSender`](crate::http_sender::HttpSender) (feature
/// `http`) in production and [`MockSender`](crate::mock_sender::MockSender)
/// in tests.
pub trait RpcSender {
    /// Send one request and return the full JSON-RPC response object,
    /// including an `error` member if the node reported one.
    fn send(&self, request: RpcRequest, params: Value) -> Result<Value>;

    fn url(&self) -> String;
}

/// A transport for websocket subscriptions.
pub trait PubsubSender {
    /// Open a subscription. Every raw notification message for it is
    /// delivered on the returned channel.
    fn subscribe(&self, request: PubsubRequest, params: Value) -> Result<(u64, Receiver<Value>)>;

    fn unsubscribe(&self, request: PubsubRequest, subscription_id: u64) -> Result<()>;
}

/// A [`PubsubSender`] for connections that only use request/response calls.
/// Every subscription attempt fails with [`RpcClientError::Transport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPubsub;

impl PubsubSender for NoPubsub {
    fn subscribe(&self, request: PubsubRequest, _params: Value) -> Result<(u64, Receiver<Value>)> {
        Err(RpcClientError::Transport(format!(
            "{}: no pubsub transport configured",
            request.subscribe_method()
        )))
    }

    fn unsubscribe(&self, request: PubsubRequest, _subscription_id: u64) -> Result<()> {
        Err(RpcClientError::Transport(format!(
            "{}: no pubsub transport configured",
            request.unsubscribe_method()
        )))
    }
}

/// An open subscription delivering decoded notifications of type `T`.
pub struct Subscription<T> {
    id: u64,
    request: PubsubRequest,
    receiver: Receiver<Value>,
    message_type: PhantomData<T>,
}

impl<T: DeserializeOwned> Subscription<T> {
    pub(crate) fn new(id: u64, request: PubsubRequest, receiver: Receiver<Value>) -> Self {
        Self {
            id,
            request,
            receiver,
            message_type: PhantomData,
        }
    }

    /// Server-assigned subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> PubsubRequest {
        self.request
    }

    /// Block until the next notification arrives.
    pub fn recv(&self) -> Result<RpcResult<T>> {
        let message = self.receiver.recv().map_err(|_| self.closed())?;
        decode_notification(&message)
    }

    /// Next notification if one is already queued.
    pub fn try_recv(&self) -> Result<Option<RpcResult<T>>> {
        match self.receiver.try_recv() {
            Ok(message) => decode_notification(&message).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self.closed()),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<RpcResult<T>>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => decode_notification(&message).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(self.closed()),
        }
    }

    fn closed(&self) -> RpcClientError {
        RpcClientError::Transport(format!(
            "{} subscription {} closed",
            self.request.subscribe_method(),
            self.id
        ))
    }
}

/// Pull `params.result` out of a notification message and decode it.
fn decode_notification<T: DeserializeOwned>(message: &Value) -> Result<RpcResult<T>> {
    match message.get("params").and_then(|params| params.get("result")) {
        Some(result) => RpcResult::from_result(result),
        None => Err(RpcClientError::Decode(format!(
            "unexpected notification: {message}"
        ))),
    }
}
