//! Transaction model and message compiler.
//!
//! A [`Transaction`] is an ordered list of [`Instruction`]s plus a recent
//! blockhash. [`Transaction::compile`] turns it into the canonical
//! [`CompiledMessage`]: a de-duplicated, fully ordered account key list with
//! every instruction rewritten to index into it.

use std::cmp::Ordering;

use crate::address::{Address, Hash};
use crate::error::SolError;
use crate::keypair::Keypair;
use crate::wire::{CompiledInstruction, CompiledMessage, CompiledTransaction, MessageHeader};

/// Account keys are addressed by a single byte in compiled instructions.
const MAX_ACCOUNT_KEYS: usize = u8::MAX as usize + 1;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub const fn new(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account.
    pub const fn new_readonly(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single program invocation, before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Address, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// An ordered list of instructions awaiting compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub instructions: Vec<Instruction>,
    pub recent_blockhash: Hash,
}

impl Transaction {
    pub fn new(instructions: Vec<Instruction>, recent_blockhash: Hash) -> Self {
        Self {
            instructions,
            recent_blockhash,
        }
    }

    /// Append an instruction. Returns `self` for chaining.
    pub fn add(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Compile against `signers`; `signers[0]` pays the fee.
    pub fn compile(&self, signers: &[&Keypair]) -> Result<CompiledMessage, SolError> {
        let Some(fee_payer) = signers.first() else {
            return Err(SolError::Validation("no signers".into()));
        };
        self.compile_with_payer(&fee_payer.pubkey())
    }

    /// Compile with an explicit fee payer and no key material.
    pub fn compile_with_payer(&self, fee_payer: &Address) -> Result<CompiledMessage, SolError> {
        if self.instructions.is_empty() {
            return Err(SolError::Validation("no instructions".into()));
        }

        // First occurrence of an address wins; later flag differences are
        // dropped.
        let mut metas: Vec<AccountMeta> = Vec::new();
        for ix in &self.instructions {
            for meta in &ix.accounts {
                if !metas.iter().any(|m| m.pubkey == meta.pubkey) {
                    metas.push(*meta);
                }
            }
        }

        // Programs not referenced as accounts are read-only non-signers.
        for ix in &self.instructions {
            if !metas.iter().any(|m| m.pubkey == ix.program_id) {
                metas.push(AccountMeta::new_readonly(ix.program_id, false));
            }
        }

        metas.sort_by(canonical_order);

        metas.retain(|m| m.pubkey != *fee_payer);
        metas.insert(0, AccountMeta::new(*fee_payer, true));

        let (signed, unsigned): (Vec<AccountMeta>, Vec<AccountMeta>) =
            metas.into_iter().partition(|m| m.is_signer);

        if signed.len() > u8::MAX as usize {
            return Err(SolError::Validation(format!(
                "too many signers: {}",
                signed.len()
            )));
        }
        if signed.len() + unsigned.len() > MAX_ACCOUNT_KEYS {
            return Err(SolError::Validation(format!(
                "too many account keys: {}",
                signed.len() + unsigned.len()
            )));
        }

        let header = MessageHeader {
            num_required_signatures: signed.len() as u8,
            num_readonly_signed_accounts: signed.iter().filter(|m| !m.is_writable).count() as u8,
            num_readonly_unsigned_accounts: unsigned.iter().filter(|m| !m.is_writable).count()
                as u8,
        };

        let account_keys: Vec<Address> = signed
            .iter()
            .chain(unsigned.iter())
            .map(|m| m.pubkey)
            .collect();

        let instructions = self
            .instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&account_keys, &ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|meta| index_of(&account_keys, &meta.pubkey))
                        .collect::<Result<Vec<_>, SolError>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, SolError>>()?;

        tracing::debug!(
            %fee_payer,
            accounts = account_keys.len(),
            signers = header.num_required_signatures,
            instructions = instructions.len(),
            "compiled message"
        );

        Ok(CompiledMessage {
            header,
            account_keys,
            recent_blockhash: self.recent_blockhash,
            instructions,
        })
    }

    /// Compile, serialize, sign and wrap in one step.
    ///
    /// Returns the signed envelope and its wire bytes.
    pub fn sign(&self, signers: &[&Keypair]) -> Result<(CompiledTransaction, Vec<u8>), SolError> {
        let message = self.compile(signers)?;
        let mut serialized = Vec::with_capacity(256);
        message.serialize(&mut serialized)?;

        let mut tx = CompiledTransaction::new(message);
        tx.sign(&serialized, signers)?;
        let wire = tx.serialize(&serialized)?;
        Ok((tx, wire))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Signers first, then writable accounts, then ascending address bytes.
fn canonical_order(a: &AccountMeta, b: &AccountMeta) -> Ordering {
    b.is_signer
        .cmp(&a.is_signer)
        .then(b.is_writable.cmp(&a.is_writable))
        .then(a.pubkey.cmp(&b.pubkey))
}

fn index_of(account_keys: &[Address], key: &Address) -> Result<u8, SolError> {
    account_keys
        .iter()
        .position(|k| k == key)
        .map(|i| i as u8)
        .ok_or_else(|| SolError::Validation(format!("unknown account: {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::SYSTEM_PROGRAM_ID;
    use crate::system_program;

    fn key(b: u8) -> Address {
        Address::new([b; 32])
    }

    fn blockhash() -> Hash {
        Address::new([0xCC; 32])
    }

    // -- basic compilation --------------------------------------------------

    #[test]
    fn sol_transfer_layout() {
        let payer = Keypair::from_seed(&[0x11u8; 32]).unwrap();
        let to = key(0x02);
        let mut tx = Transaction::new(Vec::new(), blockhash());
        tx.add(system_program::transfer(&payer.pubkey(), &to, 1_000_000));

        let msg = tx.compile(&[&payer]).unwrap();

        // 3 accounts: payer, to, system program.
        assert_eq!(msg.account_keys, vec![payer.pubkey(), to, SYSTEM_PROGRAM_ID]);
        assert_eq!(msg.header.num_required_signatures, 1);
        assert_eq!(msg.header.num_readonly_signed_accounts, 0);
        assert_eq!(msg.header.num_readonly_unsigned_accounts, 1);
        assert_eq!(msg.instructions[0].program_id_index, 2);
        assert_eq!(msg.instructions[0].accounts, vec![0, 1]);
        assert_eq!(msg.recent_blockhash, blockhash());
    }

    #[test]
    fn empty_instructions_rejected() {
        let payer = Keypair::from_seed(&[0x11u8; 32]).unwrap();
        let tx = Transaction::default();
        assert!(matches!(tx.compile(&[&payer]), Err(SolError::Validation(_))));
    }

    #[test]
    fn empty_signers_rejected() {
        let mut tx = Transaction::default();
        tx.add(system_program::transfer(&key(1), &key(2), 5));
        assert!(matches!(tx.compile(&[]), Err(SolError::Validation(_))));
    }

    // -- ordering -----------------------------------------------------------

    #[test]
    fn accounts_sorted_signer_writable_then_bytes() {
        let payer = key(0x50);
        let ix = Instruction::new(
            key(0xF0),
            vec![
                AccountMeta::new_readonly(key(0x09), false),
                AccountMeta::new(key(0x08), false),
                AccountMeta::new_readonly(key(0x07), true),
                AccountMeta::new(key(0x06), true),
                AccountMeta::new(key(0x05), false),
                AccountMeta::new(key(0x04), true),
            ],
            vec![],
        );
        let msg = Transaction::new(vec![ix], blockhash())
            .compile_with_payer(&payer)
            .unwrap();

        assert_eq!(
            msg.account_keys,
            vec![
                payer,
                key(0x04),
                key(0x06),
                key(0x07),
                key(0x05),
                key(0x08),
                key(0x09),
                key(0xF0),
            ]
        );
        assert_eq!(msg.header.num_required_signatures, 4);
        assert_eq!(msg.header.num_readonly_signed_accounts, 1);
        assert_eq!(msg.header.num_readonly_unsigned_accounts, 2);
    }

    #[test]
    fn fee_payer_promoted_to_signer_writable() {
        // Payer appears only as a read-only non-signer in the instruction.
        let payer = key(0xAA);
        let ix = Instruction::new(
            key(0x01),
            vec![
                AccountMeta::new(key(0x02), true),
                AccountMeta::new_readonly(payer, false),
            ],
            vec![],
        );
        let msg = Transaction::new(vec![ix], blockhash())
            .compile_with_payer(&payer)
            .unwrap();

        assert_eq!(msg.account_keys[0], payer);
        assert_eq!(msg.header.num_required_signatures, 2);
        assert_eq!(msg.header.num_readonly_signed_accounts, 0);
        assert!(msg.is_writable(0));
        assert_eq!(msg.account_keys.iter().filter(|k| **k == payer).count(), 1);
    }

    #[test]
    fn fee_payer_synthesized_when_absent() {
        let payer = key(0x33);
        let ix = Instruction::new(key(0x01), vec![AccountMeta::new(key(0x02), false)], vec![9]);
        let msg = Transaction::new(vec![ix], blockhash())
            .compile_with_payer(&payer)
            .unwrap();
        assert_eq!(msg.account_keys, vec![payer, key(0x02), key(0x01)]);
        assert_eq!(msg.instructions[0].accounts, vec![1]);
    }

    // -- de-duplication -----------------------------------------------------

    #[test]
    fn first_seen_flags_win() {
        // key(0x02) is first seen read-only, then writable. First wins.
        let ix1 = Instruction::new(key(0x01), vec![AccountMeta::new_readonly(key(0x02), false)], vec![]);
        let ix2 = Instruction::new(key(0x01), vec![AccountMeta::new(key(0x02), false)], vec![]);
        let msg = Transaction::new(vec![ix1, ix2], blockhash())
            .compile_with_payer(&key(0xAA))
            .unwrap();

        let idx = msg.account_keys.iter().position(|k| *k == key(0x02)).unwrap();
        assert!(!msg.is_writable(idx));
        assert_eq!(msg.header.num_readonly_unsigned_accounts, 2);
        assert_eq!(msg.instructions[0].accounts, msg.instructions[1].accounts);
    }

    #[test]
    fn self_transfer_deduplicates() {
        let payer = Keypair::from_seed(&[0x11u8; 32]).unwrap();
        let mut tx = Transaction::new(Vec::new(), blockhash());
        tx.add(system_program::transfer(&payer.pubkey(), &payer.pubkey(), 1));
        let msg = tx.compile(&[&payer]).unwrap();

        assert_eq!(msg.account_keys, vec![payer.pubkey(), SYSTEM_PROGRAM_ID]);
        assert_eq!(msg.instructions[0].accounts, vec![0, 0]);
    }

    #[test]
    fn program_referenced_as_account_not_duplicated() {
        let program = key(0x01);
        let ix = Instruction::new(program, vec![AccountMeta::new(program, false)], vec![]);
        let msg = Transaction::new(vec![ix], blockhash())
            .compile_with_payer(&key(0xAA))
            .unwrap();
        // Flags come from the account reference: writable.
        assert_eq!(msg.account_keys, vec![key(0xAA), program]);
        assert_eq!(msg.header.num_readonly_unsigned_accounts, 0);
    }

    // -- indices ------------------------------------------------------------

    #[test]
    fn every_index_in_range() {
        let signer = Keypair::from_seed(&[0x22u8; 32]).unwrap();
        let payer = Keypair::from_seed(&[0x11u8; 32]).unwrap();
        let mut tx = Transaction::new(Vec::new(), blockhash());
        tx.add(system_program::transfer(&signer.pubkey(), &key(3), 1))
            .add(system_program::transfer(&payer.pubkey(), &key(4), 2))
            .add(Instruction::new(key(9), vec![AccountMeta::new_readonly(key(3), false)], vec![]));

        let msg = tx.compile(&[&payer, &signer]).unwrap();
        assert_eq!(msg.account_keys[0], payer.pubkey());
        assert_eq!(msg.header.num_required_signatures, 2);
        for ix in &msg.instructions {
            assert!((ix.program_id_index as usize) < msg.account_keys.len());
            for &i in &ix.accounts {
                assert!((i as usize) < msg.account_keys.len());
            }
        }
    }

    #[test]
    fn too_many_accounts_rejected() {
        let accounts = (0..300u32)
            .map(|i| {
                let mut bytes = [0u8; 32];
                bytes[..4].copy_from_slice(&i.to_le_bytes());
                bytes[31] = 1;
                AccountMeta::new_readonly(Address::new(bytes), false)
            })
            .collect();
        let tx = Transaction::new(vec![Instruction::new(key(0xEE), accounts, vec![])], blockhash());
        assert!(matches!(
            tx.compile_with_payer(&key(0xAA)),
            Err(SolError::Validation(_))
        ));
    }

    // -- end to end ---------------------------------------------------------

    #[test]
    fn sign_produces_verifiable_envelope() {
        let payer = Keypair::from_seed(&[0x11u8; 32]).unwrap();
        let mut tx = Transaction::new(Vec::new(), blockhash());
        tx.add(system_program::transfer(&payer.pubkey(), &key(2), 42));

        let (signed, wire) = tx.sign(&[&payer]).unwrap();
        signed.verify().unwrap();
        assert_eq!(wire[0], 1);
        assert_eq!(CompiledTransaction::deserialize(&wire).unwrap(), signed);
    }
}
