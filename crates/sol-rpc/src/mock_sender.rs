//! In-memory transports used for testing [`Connection`](crate::Connection).
//!
//! [`MockSender`] answers every request with a canned JSON-RPC response and
//! records what it was asked. [`MockPubsub`] hands out subscriptions backed
//! by plain channels and lets the test push notifications into them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{json, Value};

use crate::error::{Result, RpcClientError};
use crate::request::{PubsubRequest, RpcRequest};
use crate::sender::{PubsubSender, RpcSender};

pub const PUBKEY: &str = "7RoSF9fUmdphVCpabEoefH81WwrW7orsWonXWqTXkKV8";
pub const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";
pub const SIGNATURE: &str =
    "43yNSFC6fYTuPgTNFFhF4axw7AfWxB2BPdurme8yrsWEYwm8299xh8n6TAHjGymiSub1XtyxTNyd9GBfY2hxoBw8";

/// Full JSON-RPC responses keyed by request, overriding the defaults.
pub type Mocks = HashMap<RpcRequest, Value>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An [`RpcSender`] that never touches the network.
///
/// Each request is answered from [`Mocks`] if present (the entry is consumed),
/// otherwise with a plausible default. A sender created with url `"fails"`
/// answers everything with a JSON-RPC error object.
pub struct MockSender {
    url: String,
    mocks: Mutex<Mocks>,
    requests: Mutex<Vec<(RpcRequest, Value)>>,
}

impl MockSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self::new_with_mocks(url, Mocks::default())
    }

    pub fn new_with_mocks(url: impl Into<String>, mocks: Mocks) -> Self {
        Self {
            url: url.into(),
            mocks: Mutex::new(mocks),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for the next `request`.
    pub fn set_response(&self, request: RpcRequest, response: Value) {
        lock(&self.mocks).insert(request, response);
    }

    /// Every `(request, params)` pair sent so far, oldest first.
    pub fn requests(&self) -> Vec<(RpcRequest, Value)> {
        lock(&self.requests).clone()
    }

    /// Params of the most recent call to `request`.
    pub fn last_params(&self, request: RpcRequest) -> Option<Value> {
        lock(&self.requests)
            .iter()
            .rev()
            .find(|(r, _)| *r == request)
            .map(|(_, params)| params.clone())
    }

    fn default_result(request: RpcRequest) -> Value {
        let context = json!({"slot": 1});
        match request {
            RpcRequest::GetAccountInfo => json!({"context": context, "value": null}),
            RpcRequest::GetBalance => json!({"context": context, "value": 50}),
            RpcRequest::GetClusterNodes => json!([{
                "pubkey": PUBKEY,
                "gossip": "127.0.0.1:8001",
                "tpu": "127.0.0.1:8003",
                "rpc": "127.0.0.1:8899",
                "version": "1.18.22",
                "featureSet": 3011795035u32,
                "shredVersion": 1
            }]),
            RpcRequest::GetIdentity => json!({"identity": PUBKEY}),
            RpcRequest::GetLatestBlockhash => json!({
                "context": context,
                "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 3090}
            }),
            RpcRequest::GetLeaderSchedule => {
                let mut schedule = serde_json::Map::new();
                schedule.insert(PUBKEY.to_string(), json!([0, 1, 2]));
                Value::Object(schedule)
            }
            RpcRequest::GetMultipleAccounts => json!({"context": context, "value": [null]}),
            RpcRequest::GetProgramAccounts => json!([]),
            RpcRequest::GetSlot => json!(1),
            RpcRequest::GetSlotLeader => json!(PUBKEY),
            RpcRequest::GetTokenAccountBalance | RpcRequest::GetTokenSupply => json!({
                "context": context,
                "value": {"amount": "1000000", "decimals": 6, "uiAmountString": "1"}
            }),
            RpcRequest::GetTokenAccountsByOwner => json!({"context": context, "value": []}),
            RpcRequest::GetTransaction => Value::Null,
            RpcRequest::GetVersion => json!({"solana-core": "1.18.22", "feature-set": 3011795035u32}),
            RpcRequest::RequestAirdrop | RpcRequest::SendTransaction => json!(SIGNATURE),
            RpcRequest::SimulateTransaction => json!({
                "context": context,
                "value": {"err": null, "logs": [], "accounts": null, "unitsConsumed": 0}
            }),
        }
    }
}

impl RpcSender for MockSender {
    fn send(&self, request: RpcRequest, params: Value) -> Result<Value> {
        lock(&self.requests).push((request, params));

        if let Some(response) = lock(&self.mocks).remove(&request) {
            return Ok(response);
        }
        if self.url == "fails" {
            return Ok(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32603, "message": "Internal error"}
            }));
        }

        Ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": Self::default_result(request),
        }))
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}

// ---------------------------------------------------------------------------
// Pubsub
// ---------------------------------------------------------------------------

struct MockSubscription {
    request: PubsubRequest,
    params: Value,
    sender: Sender<Value>,
}

/// A [`PubsubSender`] whose notifications are pushed by the test.
#[derive(Default)]
pub struct MockPubsub {
    next_id: AtomicU64,
    subscriptions: Mutex<HashMap<u64, MockSubscription>>,
}

impl MockPubsub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `result` to subscription `id`, wrapped as a notification.
    pub fn notify(&self, id: u64, result: Value) -> Result<()> {
        let subscriptions = lock(&self.subscriptions);
        let Some(subscription) = subscriptions.get(&id) else {
            return Err(RpcClientError::Transport(format!("unknown subscription {id}")));
        };
        let method = subscription
            .request
            .subscribe_method()
            .replace("Subscribe", "Notification");
        let message = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": {"result": result, "subscription": id},
        });
        subscription
            .sender
            .send(message)
            .map_err(|_| RpcClientError::Transport(format!("subscription {id} receiver dropped")))
    }

    /// The subscribe method and params used for subscription `id`.
    pub fn subscription(&self, id: u64) -> Option<(PubsubRequest, Value)> {
        lock(&self.subscriptions)
            .get(&id)
            .map(|s| (s.request, s.params.clone()))
    }

    pub fn is_active(&self, id: u64) -> bool {
        lock(&self.subscriptions).contains_key(&id)
    }
}

impl PubsubSender for MockPubsub {
    fn subscribe(&self, request: PubsubRequest, params: Value) -> Result<(u64, Receiver<Value>)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = channel();
        lock(&self.subscriptions).insert(
            id,
            MockSubscription {
                request,
                params,
                sender,
            },
        );
        Ok((id, receiver))
    }

    fn unsubscribe(&self, request: PubsubRequest, subscription_id: u64) -> Result<()> {
        let mut subscriptions = lock(&self.subscriptions);
        match subscriptions.get(&subscription_id) {
            Some(s) if s.request == request => {
                subscriptions.remove(&subscription_id);
                Ok(())
            }
            _ => Err(RpcClientError::Transport(format!(
                "{}: unknown subscription {subscription_id}",
                request.unsubscribe_method()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_response_has_result() {
        let sender = MockSender::new("succeeds");
        let response = sender.send(RpcRequest::GetSlot, Value::Null).unwrap();
        assert_eq!(response["result"], json!(1));
    }

    #[test]
    fn mocks_are_consumed_once() {
        let mut mocks = Mocks::default();
        mocks.insert(RpcRequest::GetSlot, json!({"result": 99}));
        let sender = MockSender::new_with_mocks("succeeds", mocks);
        assert_eq!(sender.send(RpcRequest::GetSlot, Value::Null).unwrap()["result"], 99);
        assert_eq!(sender.send(RpcRequest::GetSlot, Value::Null).unwrap()["result"], 1);
    }

    #[test]
    fn fails_url_returns_error_object() {
        let sender = MockSender::new("fails");
        let response = sender.send(RpcRequest::GetBalance, json!([PUBKEY])).unwrap();
        assert_eq!(response["error"]["code"], -32603);
    }

    #[test]
    fn records_requests() {
        let sender = MockSender::new("succeeds");
        sender.send(RpcRequest::GetBalance, json!(["a"])).unwrap();
        sender.send(RpcRequest::GetBalance, json!(["b"])).unwrap();
        assert_eq!(sender.requests().len(), 2);
        assert_eq!(sender.last_params(RpcRequest::GetBalance), Some(json!(["b"])));
        assert!(sender.last_params(RpcRequest::GetSlot).is_none());
    }

    #[test]
    fn pubsub_notify_and_unsubscribe() {
        let pubsub = MockPubsub::new();
        let (id, rx) = pubsub.subscribe(PubsubRequest::Slot, json!([])).unwrap();
        pubsub.notify(id, json!({"slot": 1, "parent": 0, "root": 0})).unwrap();
        let message = rx.recv().unwrap();
        assert_eq!(message["method"], "slotNotification");
        assert_eq!(message["params"]["subscription"], id);

        assert!(pubsub.unsubscribe(PubsubRequest::Account, id).is_err());
        pubsub.unsubscribe(PubsubRequest::Slot, id).unwrap();
        assert!(!pubsub.is_active(id));
        assert!(rx.recv().is_err());
    }
}
