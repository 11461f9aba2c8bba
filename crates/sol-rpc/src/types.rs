//! Response records.
//!
//! Each JSON shape the node returns is its own flat record with its own
//! decoder. Records that contain other records hold them by type, so every
//! one of them can be decoded and tested on its own.

use std::collections::BTreeMap;

use base64::Engine;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sol_core::{Address, Hash};

// ---------------------------------------------------------------------------
// Chain state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blockhash {
    pub blockhash: Hash,
    #[serde(default)]
    pub last_valid_block_height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    #[serde(rename = "solana-core")]
    pub solana_core: String,
    #[serde(rename = "feature-set", default)]
    pub feature_set: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub identity: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub slot: u64,
    pub parent: u64,
    pub root: u64,
}

/// One gossip peer from `getClusterNodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNode {
    pub pubkey: Address,
    #[serde(default)]
    pub gossip: Option<String>,
    #[serde(default)]
    pub tpu: Option<String>,
    #[serde(default)]
    pub rpc: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub feature_set: Option<u32>,
    #[serde(default)]
    pub shred_version: Option<u16>,
}

/// Leader slots (relative to the epoch start) for a single validator.
///
/// `getLeaderSchedule` filtered by identity answers with a one-entry map
/// `{ "<identity>": [slots] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderSchedule {
    pub leader: Address,
    pub schedule: Vec<u64>,
}

impl<'de> Deserialize<'de> for LeaderSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, Vec<u64>>::deserialize(deserializer)?;
        let Some((leader, schedule)) = map.into_iter().next() else {
            return Err(de::Error::custom("empty leader schedule"));
        };
        let leader = leader.parse().map_err(de::Error::custom)?;
        Ok(Self { leader, schedule })
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A raw account as returned with `base64` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub lamports: u64,
    pub owner: Address,
    #[serde(deserialize_with = "deserialize_account_data")]
    pub data: Vec<u8>,
    pub executable: bool,
    pub rent_epoch: u64,
}

/// An account together with its address, as returned by
/// `getProgramAccounts` and program notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub pubkey: Address,
    pub account: Account,
}

/// Account data arrives either as `[payload, encoding]` or, in the legacy
/// binary form, as a bare base-58 string.
fn deserialize_account_data<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => bs58::decode(&s).into_vec().map_err(de::Error::custom),
        Value::Array(parts) => {
            let (Some(Value::String(payload)), Some(Value::String(encoding))) =
                (parts.first(), parts.get(1))
            else {
                return Err(de::Error::custom("account data must be [payload, encoding]"));
            };
            match encoding.as_str() {
                "base64" => base64::engine::general_purpose::STANDARD
                    .decode(payload)
                    .map_err(de::Error::custom),
                "base58" => bs58::decode(payload).into_vec().map_err(de::Error::custom),
                other => Err(de::Error::custom(format!(
                    "unsupported account data encoding: {other}"
                ))),
            }
        }
        other => Err(de::Error::custom(format!(
            "unexpected account data: {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A token amount in base units plus its decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(with = "amount_string")]
    pub amount: u64,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_amount_string: Option<String>,
}

impl TokenBalance {
    /// The balance in whole tokens.
    pub fn tokens(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

/// The `parsed.info` block of a `jsonParsed` SPL token account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    #[serde(default)]
    pub is_native: bool,
    pub mint: Address,
    pub owner: Address,
    pub token_amount: TokenBalance,
    #[serde(default)]
    pub delegate: Option<Address>,
    #[serde(default)]
    pub delegated_amount: Option<TokenBalance>,
    pub state: String,
}

/// The `parsed` block: account type plus [`TokenAccountInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTokenData {
    pub info: TokenAccountInfo,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The `data` block of a `jsonParsed` account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAccountData {
    pub program: String,
    pub parsed: ParsedTokenData,
    pub space: u64,
}

/// A token account with its data in `jsonParsed` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAccount {
    pub lamports: u64,
    pub owner: Address,
    pub data: ParsedAccountData,
    pub executable: bool,
    pub rent_epoch: u64,
}

/// One entry of `getTokenAccountsByOwner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub pubkey: Address,
    pub account: ParsedAccount,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A `logsNotification` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logs {
    pub signature: String,
    #[serde(default)]
    pub err: Option<Value>,
    pub logs: Vec<String>,
}
