//! Connection configuration: cluster endpoints and commitment level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known public clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    MainnetBeta,
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    /// Default JSON-RPC endpoint for this cluster.
    pub fn api_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }
}

/// How finalized a block must be before the node reports on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    #[default]
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoints and commitment used by a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub rpc_url: String,
    pub ws_url: String,
    #[serde(default)]
    pub commitment: Commitment,
}

impl ConnectionConfig {
    /// Build a config for `rpc_url`, deriving the websocket URL from it.
    pub fn new(rpc_url: impl Into<String>, commitment: Commitment) -> Self {
        let rpc_url = rpc_url.into();
        let ws_url = websocket_url(&rpc_url);
        Self {
            rpc_url,
            ws_url,
            commitment,
        }
    }

    pub fn for_cluster(cluster: Cluster) -> Self {
        Self::new(cluster.api_url(), Commitment::default())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::for_cluster(Cluster::MainnetBeta)
    }
}

/// `http://` becomes `ws://`, `https://` becomes `wss://`. Anything else is
/// returned unchanged.
pub fn websocket_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        rpc_url.to_string()
    }
}
