//! A connection to a Solana cluster.
//!
//! Each query method builds its JSON-RPC params, hands them to the
//! [`RpcSender`], and decodes the answer into an [`RpcResult`]. Remote errors
//! stay inside the result; only transport and decode failures come back as
//! `Err`.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sol_core::{Address, Keypair, Transaction, LAMPORTS_PER_SOL, TOKEN_PROGRAM_ID};

use crate::config::{Commitment, ConnectionConfig};
use crate::error::Result;
use crate::request::{PubsubRequest, RpcRequest};
use crate::response::RpcResult;
use crate::sender::{NoPubsub, PubsubSender, RpcSender, Subscription};
use crate::types::{
    Account, AccountInfo, Blockhash, ClusterNode, Identity, LeaderSchedule, Logs, SlotInfo,
    TokenAccount, TokenBalance, Version,
};

pub struct Connection<S, P = NoPubsub> {
    config: ConnectionConfig,
    sender: S,
    pubsub: P,
}

impl<S: RpcSender> Connection<S, NoPubsub> {
    /// A connection without subscription support.
    pub fn new(config: ConnectionConfig, sender: S) -> Result<Self> {
        Self::with_pubsub(config, sender, NoPubsub)
    }
}

impl<S: RpcSender, P: PubsubSender> Connection<S, P> {
    pub fn with_pubsub(config: ConnectionConfig, sender: S, pubsub: P) -> Result<Self> {
        sol_core::crypto::init()?;
        tracing::debug!(
            rpc_url = %config.rpc_url,
            ws_url = %config.ws_url,
            commitment = %config.commitment,
            "connection created"
        );
        Ok(Self {
            config,
            sender,
            pubsub,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn commitment(&self) -> Commitment {
        self.config.commitment
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn pubsub(&self) -> &P {
        &self.pubsub
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All information associated with the account at `address`.
    pub fn get_account_info(&self, address: &Address) -> Result<RpcResult<Account>> {
        self.call(
            RpcRequest::GetAccountInfo,
            json!([address, self.encoded_config("base64")]),
        )
    }

    /// Lamport balance of `address`.
    pub fn get_balance(&self, address: &Address) -> Result<RpcResult<u64>> {
        self.call(
            RpcRequest::GetBalance,
            json!([address, self.commitment_config()]),
        )
    }

    /// Every node participating in the cluster.
    pub fn get_cluster_nodes(&self) -> Result<RpcResult<Vec<ClusterNode>>> {
        self.call(RpcRequest::GetClusterNodes, Value::Null)
    }

    /// Identity of the node answering the request.
    pub fn get_identity(&self) -> Result<RpcResult<Identity>> {
        self.call(RpcRequest::GetIdentity, Value::Null)
    }

    pub fn get_latest_blockhash(&self) -> Result<RpcResult<Blockhash>> {
        self.call(
            RpcRequest::GetLatestBlockhash,
            json!([self.commitment_config()]),
        )
    }

    /// Leader slots of `leader` for the current epoch.
    pub fn get_leader_schedule(&self, leader: &Address) -> Result<RpcResult<LeaderSchedule>> {
        self.call(
            RpcRequest::GetLeaderSchedule,
            json!([{
                "identity": leader,
                "commitment": self.config.commitment,
            }]),
        )
    }

    /// Accounts for `addresses`, in order. Missing accounts are `None`.
    pub fn get_multiple_accounts(
        &self,
        addresses: &[Address],
    ) -> Result<RpcResult<Vec<Option<Account>>>> {
        self.call(
            RpcRequest::GetMultipleAccounts,
            json!([addresses, self.encoded_config("base64")]),
        )
    }

    /// All accounts owned by `program_id`.
    pub fn get_program_accounts(&self, program_id: &Address) -> Result<RpcResult<Vec<AccountInfo>>> {
        self.call(
            RpcRequest::GetProgramAccounts,
            json!([program_id, self.encoded_config("base64")]),
        )
    }

    /// The slot reached at the connection's commitment.
    pub fn get_slot(&self) -> Result<RpcResult<u64>> {
        self.get_slot_with_commitment(self.config.commitment)
    }

    pub fn get_slot_with_commitment(&self, commitment: Commitment) -> Result<RpcResult<u64>> {
        self.call(RpcRequest::GetSlot, json!([{"commitment": commitment}]))
    }

    pub fn get_slot_leader(&self) -> Result<RpcResult<Address>> {
        self.call(RpcRequest::GetSlotLeader, json!([self.commitment_config()]))
    }

    /// Balance of an SPL token account.
    pub fn get_token_account_balance(&self, token_account: &Address) -> Result<RpcResult<TokenBalance>> {
        self.call(
            RpcRequest::GetTokenAccountBalance,
            json!([token_account, self.commitment_config()]),
        )
    }

    /// All SPL token accounts held by `owner` under the token program.
    pub fn get_token_accounts_by_owner(&self, owner: &Address) -> Result<RpcResult<Vec<TokenAccount>>> {
        self.call(
            RpcRequest::GetTokenAccountsByOwner,
            json!([
                owner,
                {"programId": TOKEN_PROGRAM_ID},
                self.encoded_config("jsonParsed"),
            ]),
        )
    }

    /// SPL token accounts of a single `mint` held by `owner`.
    pub fn get_token_accounts_by_owner_and_mint(
        &self,
        owner: &Address,
        mint: &Address,
    ) -> Result<RpcResult<Vec<TokenAccount>>> {
        self.call(
            RpcRequest::GetTokenAccountsByOwner,
            json!([owner, {"mint": mint}, self.encoded_config("jsonParsed")]),
        )
    }

    /// Total supply of an SPL token mint.
    pub fn get_token_supply(&self, mint: &Address) -> Result<RpcResult<TokenBalance>> {
        self.call(
            RpcRequest::GetTokenSupply,
            json!([mint, self.commitment_config()]),
        )
    }

    /// Details of a confirmed transaction, undecoded.
    ///
    /// The node does not serve `processed` here, so that level is raised to
    /// `confirmed`.
    pub fn get_transaction(&self, signature: &str) -> Result<RpcResult<Value>> {
        let commitment = match self.config.commitment {
            Commitment::Processed => Commitment::Confirmed,
            other => other,
        };
        self.call(
            RpcRequest::GetTransaction,
            json!([signature, {
                "encoding": "json",
                "commitment": commitment,
                "maxSupportedTransactionVersion": 0,
            }]),
        )
    }

    /// Software version of the node.
    pub fn get_version(&self) -> Result<RpcResult<Version>> {
        self.call(RpcRequest::GetVersion, Value::Null)
    }

    /// Request an airdrop to `recipient`. Returns the airdrop transaction
    /// signature.
    pub fn request_airdrop(&self, recipient: &Address, lamports: u64) -> Result<RpcResult<String>> {
        self.call(
            RpcRequest::RequestAirdrop,
            json!([recipient, lamports, self.commitment_config()]),
        )
    }

    /// Airdrop one SOL.
    pub fn request_airdrop_sol(&self, recipient: &Address) -> Result<RpcResult<String>> {
        self.request_airdrop(recipient, LAMPORTS_PER_SOL)
    }

    /// Simulate an already signed, base64-encoded transaction.
    pub fn simulate_transaction(&self, signed_transaction: &str) -> Result<RpcResult<Value>> {
        self.call(
            RpcRequest::SimulateTransaction,
            json!([signed_transaction, self.encoded_config("base64")]),
        )
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Fetch the latest blockhash, then compile, sign and submit
    /// `transaction`. `signers[0]` pays the fee.
    ///
    /// The blockhash is written back into `transaction`. Returns the
    /// transaction signature reported by the node.
    pub fn sign_and_send_transaction(
        &self,
        transaction: &mut Transaction,
        signers: &[&Keypair],
    ) -> Result<RpcResult<String>> {
        let blockhash = self.get_latest_blockhash()?.unwrap()?;
        transaction.recent_blockhash = blockhash.blockhash;

        let (_signed, wire) = transaction.sign(signers)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&wire);

        tracing::debug!(
            blockhash = %blockhash.blockhash,
            bytes = wire.len(),
            signers = signers.len(),
            "sending transaction"
        );

        self.call(
            RpcRequest::SendTransaction,
            json!([encoded, {
                "encoding": "base64",
                "preflightCommitment": self.config.commitment,
            }]),
        )
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Notify on every change to the account at `address`.
    pub fn on_account_change(&self, address: &Address) -> Result<Subscription<Account>> {
        self.subscribe(
            PubsubRequest::Account,
            json!([address, self.encoded_config("base64")]),
        )
    }

    pub fn remove_account_change_listener(&self, subscription_id: u64) -> Result<()> {
        self.unsubscribe(PubsubRequest::Account, subscription_id)
    }

    /// Notify on every transaction log that mentions `address`.
    pub fn on_logs(&self, address: &Address) -> Result<Subscription<Logs>> {
        self.subscribe(
            PubsubRequest::Logs,
            json!([{"mentions": [address]}, self.commitment_config()]),
        )
    }

    pub fn remove_logs_listener(&self, subscription_id: u64) -> Result<()> {
        self.unsubscribe(PubsubRequest::Logs, subscription_id)
    }

    /// Notify on every change to an account owned by `program_id`.
    pub fn on_program_account_change(&self, program_id: &Address) -> Result<Subscription<AccountInfo>> {
        self.subscribe(
            PubsubRequest::Program,
            json!([program_id, self.encoded_config("base64")]),
        )
    }

    pub fn remove_program_account_change_listener(&self, subscription_id: u64) -> Result<()> {
        self.unsubscribe(PubsubRequest::Program, subscription_id)
    }

    /// Notify whenever the node processes a new slot.
    pub fn on_slot_change(&self) -> Result<Subscription<SlotInfo>> {
        self.subscribe(PubsubRequest::Slot, json!([]))
    }

    pub fn remove_slot_change_listener(&self, subscription_id: u64) -> Result<()> {
        self.unsubscribe(PubsubRequest::Slot, subscription_id)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn call<T: DeserializeOwned>(&self, request: RpcRequest, params: Value) -> Result<RpcResult<T>> {
        tracing::debug!(%request, "rpc call");
        let response = self.sender.send(request, params)?;
        let result = RpcResult::from_response(&response)?;
        if let Some(error) = result.error() {
            tracing::warn!(%request, code = error.code, message = %error.message, "rpc call failed");
        }
        Ok(result)
    }

    fn subscribe<T: DeserializeOwned>(
        &self,
        request: PubsubRequest,
        params: Value,
    ) -> Result<Subscription<T>> {
        let (id, receiver) = self.pubsub.subscribe(request, params)?;
        tracing::debug!(method = request.subscribe_method(), id, "subscribed");
        Ok(Subscription::new(id, request, receiver))
    }

    fn unsubscribe(&self, request: PubsubRequest, subscription_id: u64) -> Result<()> {
        self.pubsub.unsubscribe(request, subscription_id)?;
        tracing::debug!(method = request.unsubscribe_method(), id = subscription_id, "unsubscribed");
        Ok(())
    }

    fn commitment_config(&self) -> Value {
        json!({"commitment": self.config.commitment})
    }

    fn encoded_config(&self, encoding: &str) -> Value {
        json!({"encoding": encoding, "commitment": self.config.commitment})
    }
}
