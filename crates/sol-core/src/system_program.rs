//! System Program instructions.

use crate::address::{Address, SYSTEM_PROGRAM_ID};
use crate::transaction::{AccountMeta, Instruction};

/// System Program `Transfer` instruction index (little-endian u32).
const TRANSFER_IX_INDEX: u32 = 2;

/// Move `lamports` from `from` (signer) to `to`.
///
/// Data layout: `[u32 LE: 2][u64 LE: lamports]`.
pub fn transfer(from: &Address, to: &Address, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    )
}
