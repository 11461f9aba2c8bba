//! JSON-RPC connection layer for the Solana client core.
//!
//! [`Connection`] issues queries, submits transactions and opens
//! subscriptions. The wire transport is pluggable: anything implementing
//! [`RpcSender`] / [`PubsubSender`] will do. [`MockSender`] and
//! [`MockPubsub`] are in-memory transports for tests, and the `http` feature
//! adds a blocking `reqwest` sender.

pub mod config;
pub mod connection;
pub mod error;
#[cfg(feature = "http")]
pub mod http_sender;
pub mod mock_sender;
pub mod request;
pub mod response;
pub mod sender;
pub mod token;
pub mod types;

pub use config::{Cluster, Commitment, ConnectionConfig};
pub use connection::Connection;
pub use error::RpcClientError;
#[cfg(feature = "http")]
pub use http_sender::HttpSender;
pub use mock_sender::{MockPubsub, MockSender};
pub use request::{PubsubRequest, RpcRequest};
pub use response::{RpcContext, RpcErrorObject, RpcResult};
pub use sender::{NoPubsub, PubsubSender, RpcSender, Subscription};
pub use types::*;
