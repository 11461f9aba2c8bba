//! JSON-RPC method names and request bodies for the request and pubsub transports.

use std::fmt;

use serde_json::{json, Value};

/// JSON-RPC methods issued over the request/response transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcRequest {
    GetAccountInfo,
    GetBalance,
    GetClusterNodes,
    GetIdentity,
    GetLatestBlockhash,
    GetLeaderSchedule,
    GetMultipleAccounts,
    GetProgramAccounts,
    GetSlot,
    GetSlotLeader,
    GetTokenAccountBalance,
    GetTokenAccountsByOwner,
    GetTokenSupply,
    GetTransaction,
    GetVersion,
    RequestAirdrop,
    SendTransaction,
    SimulateTransaction,
}

impl RpcRequest {
    pub fn method(&self) -> &'static str {
        match self {
            RpcRequest::GetAccountInfo => "getAccountInfo",
            RpcRequest::GetBalance => "getBalance",
            RpcRequest::GetClusterNodes => "getClusterNodes",
            RpcRequest::GetIdentity => "getIdentity",
            RpcRequest::GetLatestBlockhash => "getLatestBlockhash",
            RpcRequest::GetLeaderSchedule => "getLeaderSchedule",
            RpcRequest::GetMultipleAccounts => "getMultipleAccounts",
            RpcRequest::GetProgramAccounts => "getProgramAccounts",
            RpcRequest::GetSlot => "getSlot",
            RpcRequest::GetSlotLeader => "getSlotLeader",
            RpcRequest::GetTokenAccountBalance => "getTokenAccountBalance",
            RpcRequest::GetTokenAccountsByOwner => "getTokenAccountsByOwner",
            RpcRequest::GetTokenSupply => "getTokenSupply",
            RpcRequest::GetTransaction => "getTransaction",
            RpcRequest::GetVersion => "getVersion",
            RpcRequest::RequestAirdrop => "requestAirdrop",
            RpcRequest::SendTransaction => "sendTransaction",
            RpcRequest::SimulateTransaction => "simulateTransaction",
        }
    }

    /// The JSON-RPC 2.0 request body. `null` params are omitted.
    pub fn build_request_json(&self, id: u64, params: Value) -> Value {
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": self.method(),
        });
        if !params.is_null() {
            request["params"] = params;
        }
        request
    }
}

impl fmt::Display for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Websocket subscription methods, each paired with its unsubscribe method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PubsubRequest {
    Account,
    Logs,
    Program,
    Slot,
}

impl PubsubRequest {
    pub fn subscribe_method(&self) -> &'static str {
        match self {
            PubsubRequest::Account => "accountSubscribe",
            PubsubRequest::Logs => "logsSubscribe",
            PubsubRequest::Program => "programSubscribe",
            PubsubRequest::Slot => "slotSubscribe",
        }
    }

    pub fn unsubscribe_method(&self) -> &'static str {
        match self {
            PubsubRequest::Account => "accountUnsubscribe",
            PubsubRequest::Logs => "logsUnsubscribe",
            PubsubRequest::Program => "programUnsubscribe",
            PubsubRequest::Slot => "slotUnsubscribe",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_json_with_params() {
        let request = RpcRequest::GetBalance.build_request_json(1, json!(["abc"]));
        assert_eq!(
            request,
            json!({"jsonrpc":"2.0","id":1,"method":"getBalance","params":["abc"]})
        );
    }

    #[test]
    fn build_request_json_without_params() {
        let request = RpcRequest::GetSlotLeader.build_request_json(7, Value::Null);
        assert_eq!(request, json!({"jsonrpc":"2.0","id":7,"method":"getSlotLeader"}));
        assert!(request.get("params").is_none());
    }

    #[test]
    fn display_is_method_name() {
        assert_eq!(RpcRequest::GetTokenAccountsByOwner.to_string(), "getTokenAccountsByOwner");
    }

    #[test]
    fn pubsub_methods_pair_up() {
        for request in [
            PubsubRequest::Account,
            PubsubRequest::Logs,
            PubsubRequest::Program,
            PubsubRequest::Slot,
        ] {
            let sub = request.subscribe_method();
            let unsub = request.unsubscribe_method();
            assert_eq!(sub.trim_end_matches("Subscribe"), unsub.trim_end_matches("Unsubscribe"));
        }
    }
}
