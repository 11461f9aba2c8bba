//! Solana client core.
//!
//! Addresses and their base-58 form, program-derived addresses, Ed25519
//! signers, the transaction model with its canonical message compiler, and
//! the byte-exact wire format. No `solana-sdk`: the compact binary layout is
//! implemented by hand on top of `ed25519-dalek` and `bs58`.
//!
//! Everything here is a synchronous, pure-data transform. Network access
//! lives in the `sol-rpc` crate.

pub mod address;
pub mod crypto;
pub mod error;
pub mod keypair;
pub mod pda;
pub mod spl_token;
pub mod system_program;
pub mod transaction;
pub mod wire;

// Re-export key public types for ergonomic imports.
pub use address::{
    Address, Hash, ADDRESS_BYTES, LAMPORTS_PER_SOL, NATIVE_MINT, SYSTEM_PROGRAM_ID,
    SYSVAR_CLOCK_ID, SYSVAR_INSTRUCTIONS_ID, SYSVAR_RENT_ID, SYSVAR_REWARDS_ID,
    SYSVAR_STAKE_HISTORY_ID,
};
pub use error::SolError;
pub use keypair::{Keypair, Signature, SECRET_KEY_BYTES, SIGNATURE_BYTES};
pub use pda::MAX_SEED_LEN;
pub use spl_token::{ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID};
pub use transaction::{AccountMeta, Instruction, Transaction};
pub use wire::{
    decode_length, encode_length, CompiledInstruction, CompiledMessage, CompiledTransaction,
    MessageHeader, PACKET_DATA_SIZE,
};
