//! SPL Token helpers.
//!
//! Associated token account (ATA) derivation, the ATA creation instruction
//! and the plain `Transfer` instruction, built without the `spl-token`
//! crates.

use crate::address::{Address, SYSTEM_PROGRAM_ID};
use crate::error::SolError;
use crate::transaction::{AccountMeta, Instruction, Transaction};

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// SPL Token Program ID.
pub const TOKEN_PROGRAM_ID: Address =
    Address::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Associated Token Account Program ID.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Address =
    Address::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// SPL Token `Transfer` instruction index.
const TRANSFER_IX_INDEX: u8 = 3;

// ---------------------------------------------------------------------------
// Associated Token Account derivation
// ---------------------------------------------------------------------------

/// Derive the associated token account for an owner + mint pair under the
/// standard token programs.
///
/// Seeds are `[owner, token_program_id, mint]` under the associated token
/// program. Unless `allow_owner_off_curve` is set, an owner that is not a
/// valid Ed25519 point (e.g. a PDA) is rejected.
pub fn get_associated_token_address(
    mint: &Address,
    owner: &Address,
    allow_owner_off_curve: bool,
) -> Result<Address, SolError> {
    get_associated_token_address_with_program_id(
        mint,
        owner,
        allow_owner_off_curve,
        &TOKEN_PROGRAM_ID,
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
}

/// Like [`get_associated_token_address`] with explicit program IDs.
pub fn get_associated_token_address_with_program_id(
    mint: &Address,
    owner: &Address,
    allow_owner_off_curve: bool,
    token_program_id: &Address,
    associated_token_program_id: &Address,
) -> Result<Address, SolError> {
    if !allow_owner_off_curve && !owner.is_on_curve() {
        return Err(SolError::Validation(format!(
            "token owner is off curve: {owner}"
        )));
    }

    let (address, _bump) = Address::find_program_address(
        &[owner.as_ref(), token_program_id.as_ref(), mint.as_ref()],
        associated_token_program_id,
    )?;
    Ok(address)
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Build the instruction that creates `associated_token` for `owner` + `mint`,
/// funded by `payer`.
pub fn create_associated_token_account_instruction(
    payer: &Address,
    associated_token: &Address,
    owner: &Address,
    mint: &Address,
) -> Instruction {
    create_associated_token_account_instruction_with_program_id(
        payer,
        associated_token,
        owner,
        mint,
        &TOKEN_PROGRAM_ID,
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
}

pub fn create_associated_token_account_instruction_with_program_id(
    payer: &Address,
    associated_token: &Address,
    owner: &Address,
    mint: &Address,
    token_program_id: &Address,
    associated_token_program_id: &Address,
) -> Instruction {
    Instruction::new(
        *associated_token_program_id,
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*associated_token, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(*token_program_id, false),
        ],
        Vec::new(),
    )
}

/// A transaction holding only the ATA creation instruction. The blockhash is
/// left zeroed for the sender to fill in.
pub fn create_associated_token_account_transaction(
    payer: &Address,
    associated_token: &Address,
    owner: &Address,
    mint: &Address,
) -> Transaction {
    let mut tx = Transaction::default();
    tx.add(create_associated_token_account_instruction(
        payer,
        associated_token,
        owner,
        mint,
    ));
    tx
}

/// Build an SPL Token `Transfer` instruction.
///
/// `amount` is in base units (for a 6-decimal token, `1_000_000` is one
/// whole token). Data is the instruction index followed by the u64 LE
/// amount, 9 bytes total.
pub fn transfer(
    source: &Address,
    destination: &Address,
    owner: &Address,
    amount: u64,
) -> Result<Instruction, SolError> {
    if amount == 0 {
        return Err(SolError::Validation(
            "SPL transfer amount must be > 0".into(),
        ));
    }

    let mut data = Vec::with_capacity(9);
    data.push(TRANSFER_IX_INDEX);
    data.extend_from_slice(&amount.to_le_bytes());

    Ok(Instruction::new(
        TOKEN_PROGRAM_ID,
        vec![
            AccountMeta::new(*source, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*owner, true),
        ],
        data,
    ))
}
