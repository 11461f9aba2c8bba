//! Solana transaction wire format.
//!
//! The layout is a compact binary encoding, documented here:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! Validators compare these bytes exactly; any deviation is a rejected
//! transaction.

use crate::address::{Address, Hash, ADDRESS_BYTES};
use crate::error::SolError;
use crate::keypair::{Keypair, Signature, SIGNATURE_BYTES};

/// Maximum size of a serialized transaction (IPv6 MTU minus headers).
pub const PACKET_DATA_SIZE: usize = 1232;

// ---------------------------------------------------------------------------
// Compact length encoding
// ---------------------------------------------------------------------------

/// Encode a length in the compact base-128 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes, continuing the same scheme
pub fn encode_length(len: usize) -> Vec<u8> {
    let mut rem = len;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if rem == 0 {
            break;
        }
    }

    out
}

/// Decode a compact length from the front of `data`.
///
/// Returns `(value, bytes_consumed)`. At most three bytes are read and the
/// value must fit in a `u16`.
pub fn decode_length(data: &[u8]) -> Result<(usize, usize), SolError> {
    let mut value: usize = 0;
    let mut consumed = 0usize;

    loop {
        let Some(&byte) = data.get(consumed) else {
            return Err(SolError::Validation(
                "unexpected end of data while decoding compact length".into(),
            ));
        };
        value |= ((byte & 0x7f) as usize) << (7 * consumed);
        consumed += 1;

        if byte & 0x80 == 0 {
            // A zero final byte after a continuation is padding.
            if byte == 0 && consumed > 1 {
                return Err(SolError::Validation(format!(
                    "non-canonical compact length: {consumed} bytes for {value}"
                )));
            }
            break;
        }
        if consumed >= 3 {
            return Err(SolError::Validation(
                "compact length longer than 3 bytes".into(),
            ));
        }
    }

    if value > u16::MAX as usize {
        return Err(SolError::Validation(format!(
            "compact length overflow: {value}"
        )));
    }

    Ok((value, consumed))
}

// ---------------------------------------------------------------------------
// Compiled message
// ---------------------------------------------------------------------------

/// The three header counts at the front of every message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// Number of required signatures (first N account keys are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed_accounts: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the message's `account_keys` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index into `account_keys` for the program to invoke.
    pub program_id_index: u8,
    /// Indices into `account_keys` for each account the instruction reads/writes.
    pub accounts: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// The canonical, index-based form of a transaction: the bytes that get signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMessage {
    pub header: MessageHeader,
    /// All account keys referenced by this message, in canonical order:
    ///   1. fee payer
    ///   2. remaining signers (writable before read-only)
    ///   3. non-signers (writable before read-only)
    pub account_keys: Vec<Address>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl CompiledMessage {
    /// The fee payer is always the first account key.
    pub fn fee_payer(&self) -> Option<&Address> {
        self.account_keys.first()
    }

    /// The account keys that must sign, in order.
    pub fn signer_keys(&self) -> &[Address] {
        let n = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Whether the account at `index` may be written.
    pub fn is_writable(&self, index: usize) -> bool {
        let num_signed = self.header.num_required_signatures as usize;
        let readonly_signed = self.header.num_readonly_signed_accounts as usize;
        let readonly_unsigned = self.header.num_readonly_unsigned_accounts as usize;

        if index < num_signed {
            index < num_signed - readonly_signed.min(num_signed)
        } else {
            let num_unsigned = self.account_keys.len().saturating_sub(num_signed);
            index - num_signed < num_unsigned.saturating_sub(readonly_unsigned)
        }
    }

    /// Serialize the message into `out`.
    ///
    /// `out` must be empty: serializing into an already-populated buffer is a
    /// caller bug and fails with [`SolError::State`].
    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<(), SolError> {
        if !out.is_empty() {
            return Err(SolError::State("message is already serialized".into()));
        }
        if self.header.num_required_signatures == 0 {
            return Err(SolError::State(
                "message must have at least one signature".into(),
            ));
        }

        // Header: 3 bytes.
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        // Account keys.
        out.extend_from_slice(&encode_length(self.account_keys.len()));
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }

        // Recent blockhash.
        out.extend_from_slice(self.recent_blockhash.as_bytes());

        // Instructions.
        out.extend_from_slice(&encode_length(self.instructions.len()));
        for ix in &self.instructions {
            out.push(ix.program_id_index);

            out.extend_from_slice(&encode_length(ix.accounts.len()));
            out.extend_from_slice(&ix.accounts);

            out.extend_from_slice(&encode_length(ix.data.len()));
            out.extend_from_slice(&ix.data);
        }

        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SolError> {
        let mut out = Vec::with_capacity(256);
        self.serialize(&mut out)?;
        Ok(out)
    }

    /// Parse a serialized message. Trailing bytes are rejected.
    pub fn deserialize(data: &[u8]) -> Result<Self, SolError> {
        let mut reader = Reader::new(data);
        let message = reader.message()?;
        reader.finish()?;
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Signed envelope
// ---------------------------------------------------------------------------

/// A compiled message plus its signatures: what actually goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTransaction {
    pub message: CompiledMessage,
    pub signatures: Vec<Signature>,
}

impl CompiledTransaction {
    /// Wrap an unsigned message.
    pub fn new(message: CompiledMessage) -> Self {
        Self {
            message,
            signatures: Vec::new(),
        }
    }

    /// Sign `serialized_message` with every signer, in signer-list order.
    ///
    /// Matching signer order to account-key order is the caller's
    /// responsibility. Fails with [`SolError::State`] if this envelope is
    /// already signed or the message was never serialized.
    pub fn sign(&mut self, serialized_message: &[u8], signers: &[&Keypair]) -> Result<(), SolError> {
        if !self.signatures.is_empty() {
            return Err(SolError::State(format!(
                "transaction already carries {} signature(s)",
                self.signatures.len()
            )));
        }
        if serialized_message.is_empty() {
            return Err(SolError::State("message is not serialized".into()));
        }

        let signatures = signers
            .iter()
            .map(|signer| signer.sign(serialized_message))
            .collect::<Result<Vec<_>, _>>()?;

        if signatures.len() != self.message.header.num_required_signatures as usize {
            tracing::warn!(
                signatures = signatures.len(),
                required = self.message.header.num_required_signatures,
                "signature count does not match required signatures"
            );
        }

        self.signatures = signatures;
        Ok(())
    }

    /// Produce the final wire bytes from the signatures and the
    /// already-serialized message.
    pub fn serialize(&self, serialized_message: &[u8]) -> Result<Vec<u8>, SolError> {
        if serialized_message.is_empty() {
            return Err(SolError::State("message is not serialized".into()));
        }

        let sig_count = encode_length(self.signatures.len());
        let mut wire = Vec::with_capacity(
            sig_count.len() + self.signatures.len() * SIGNATURE_BYTES + serialized_message.len(),
        );

        wire.extend_from_slice(&sig_count);
        for signature in &self.signatures {
            wire.extend_from_slice(signature.as_bytes());
        }
        wire.extend_from_slice(serialized_message);

        if wire.len() > PACKET_DATA_SIZE {
            return Err(SolError::Validation(format!(
                "transaction too large: {} > {PACKET_DATA_SIZE} bytes",
                wire.len()
            )));
        }

        Ok(wire)
    }

    /// Parse a full wire-format transaction.
    pub fn deserialize(data: &[u8]) -> Result<Self, SolError> {
        let mut reader = Reader::new(data);
        let count = reader.length()?;
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            signatures.push(Signature::try_from(reader.take(SIGNATURE_BYTES)?)?);
        }
        let message = reader.message()?;
        reader.finish()?;
        Ok(Self {
            message,
            signatures,
        })
    }

    /// Check every signature against its signer key.
    pub fn verify(&self) -> Result<(), SolError> {
        let message = self.message.to_bytes()?;
        let signers = self.message.signer_keys();
        if signers.len() != self.signatures.len() {
            return Err(SolError::Validation(format!(
                "expected {} signatures, found {}",
                signers.len(),
                self.signatures.len()
            )));
        }
        for (key, signature) in signers.iter().zip(&self.signatures) {
            if !signature.verify(key, &message) {
                return Err(SolError::Crypto(format!("signature for {key} does not verify")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Bounds-checked cursor over wire bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            return Err(SolError::Validation(format!(
                "truncated input: need {n} bytes at offset {}, have {}",
                self.pos,
                self.data.len() - self.pos
            )));
        };
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, SolError> {
        Ok(self.take(1)?[0])
    }

    fn length(&mut self) -> Result<usize, SolError> {
        let (value, consumed) = decode_length(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    fn address(&mut self) -> Result<Address, SolError> {
        Address::try_from(self.take(ADDRESS_BYTES)?)
    }

    fn message(&mut self) -> Result<CompiledMessage, SolError> {
        let header = MessageHeader {
            num_required_signatures: self.byte()?,
            num_readonly_signed_accounts: self.byte()?,
            num_readonly_unsigned_accounts: self.byte()?,
        };

        let num_keys = self.length()?;
        let account_keys = (0..num_keys)
            .map(|_| self.address())
            .collect::<Result<Vec<_>, _>>()?;

        let recent_blockhash = self.address()?;

        let num_instructions = self.length()?;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_id_index = self.byte()?;
            let num_accounts = self.length()?;
            let accounts = self.take(num_accounts)?.to_vec();
            let data_len = self.length()?;
            let data = self.take(data_len)?.to_vec();
            instructions.push(CompiledInstruction {
                program_id_index,
                accounts,
                data,
            });
        }

        Ok(CompiledMessage {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    fn finish(&self) -> Result<(), SolError> {
        if self.pos != self.data.len() {
            return Err(SolError::Validation(format!(
                "{} trailing bytes after transaction",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_message(payer: Address) -> CompiledMessage {
        CompiledMessage {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![payer, Address::new([2u8; 32]), Address::new([0u8; 32])],
            recent_blockhash: Address::new([0xCC; 32]),
            instructions: vec![CompiledInstruction {
                program_id_index: 2,
                accounts: vec![0, 1],
                data: vec![2, 0, 0, 0, 0x40, 0x42, 0x0f, 0, 0, 0, 0, 0],
            }],
        }
    }

    // -- compact length encoding --------------------------------------------

    #[test]
    fn compact_length_zero() {
        assert_eq!(encode_length(0), vec![0x00]);
    }

    #[test]
    fn compact_length_one_byte_max() {
        // 127 = 0x7f, fits in one byte.
        assert_eq!(encode_length(0x7f), vec![0x7f]);
    }

    #[test]
    fn compact_length_boundary_128() {
        // 128 = 0x80 -> two bytes: (0x00 | 0x80), 0x01
        assert_eq!(encode_length(128), vec![0x80, 0x01]);
    }

    #[test]
    fn compact_length_two_byte_max() {
        // 16383 = 0x3fff -> two bytes: (0x7f | 0x80), 0x7f
        assert_eq!(encode_length(16383), vec![0xff, 0x7f]);
    }

    #[test]
    fn compact_length_boundary_16384() {
        // 16384 = 0x4000 -> three bytes: 0x80, 0x80, 0x01
        assert_eq!(encode_length(16384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn compact_length_u16_max() {
        assert_eq!(encode_length(u16::MAX as usize), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn decode_length_known_values() {
        assert_eq!(decode_length(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_length(&[0x7f]).unwrap(), (127, 1));
        assert_eq!(decode_length(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_length(&[0x80, 0x80, 0x01]).unwrap(), (16384, 3));
    }

    #[test]
    fn decode_length_rejects_bad_input() {
        assert!(decode_length(&[]).is_err());
        assert!(decode_length(&[0x80]).is_err());
        // Fourth continuation byte.
        assert!(decode_length(&[0x80, 0x80, 0x80, 0x01]).is_err());
        // 0x7f << 14 exceeds u16.
        assert!(decode_length(&[0xff, 0xff, 0x7f]).is_err());
        // Padded encodings of 0 and 127.
        assert!(matches!(decode_length(&[0x80, 0x00]), Err(SolError::Validation(_))));
        assert!(matches!(decode_length(&[0xff, 0x80, 0x00]), Err(SolError::Validation(_))));
        assert!(decode_length(&[0xff, 0x00]).is_err());
    }

    #[test]
    fn padded_instruction_count_rejected() {
        let message = sample_message(Address::new([1u8; 32]));
        let bytes = message.to_bytes().unwrap();
        // header(3) + key count(1) + 3 keys + blockhash
        let count_at = 3 + 1 + 3 * 32 + 32;
        assert_eq!(bytes[count_at], 1);

        let mut padded = bytes[..count_at].to_vec();
        padded.extend_from_slice(&[0x81, 0x00]);
        padded.extend_from_slice(&bytes[count_at + 1..]);

        assert!(matches!(
            CompiledMessage::deserialize(&padded),
            Err(SolError::Validation(_))
        ));
    }

    proptest! {
        #[test]
        fn compact_length_roundtrip(value in 0usize..=u16::MAX as usize) {
            let encoded = encode_length(value);
            prop_assert_eq!(decode_length(&encoded).unwrap(), (value, encoded.len()));
        }
    }

    // -- message serialization ----------------------------------------------

    #[test]
    fn serialize_exact_layout() {
        let payer = Address::new([1u8; 32]);
        let msg = sample_message(payer).to_bytes().unwrap();

        let mut expected = vec![1u8, 0, 1, 3];
        expected.extend_from_slice(&[1u8; 32]);
        expected.extend_from_slice(&[2u8; 32]);
        expected.extend_from_slice(&[0u8; 32]);
        expected.extend_from_slice(&[0xCC; 32]);
        expected.extend_from_slice(&[1, 2, 2, 0, 1, 12]);
        expected.extend_from_slice(&[2, 0, 0, 0, 0x40, 0x42, 0x0f, 0, 0, 0, 0, 0]);
        assert_eq!(msg, expected);
    }

    #[test]
    fn serialize_twice_is_state_error() {
        let message = sample_message(Address::new([1u8; 32]));
        let mut out = Vec::new();
        message.serialize(&mut out).unwrap();
        let err = message.serialize(&mut out).unwrap_err();
        assert!(matches!(err, SolError::State(_)));
    }

    #[test]
    fn serialize_without_signers_is_state_error() {
        let mut message = sample_message(Address::new([1u8; 32]));
        message.header.num_required_signatures = 0;
        assert!(matches!(message.to_bytes(), Err(SolError::State(_))));
    }

    #[test]
    fn message_deserialize_roundtrip() {
        let message = sample_message(Address::new([1u8; 32]));
        let bytes = message.to_bytes().unwrap();
        assert_eq!(CompiledMessage::deserialize(&bytes).unwrap(), message);
    }

    #[test]
    fn message_deserialize_rejects_truncation_and_trailing() {
        let bytes = sample_message(Address::new([1u8; 32])).to_bytes().unwrap();
        assert!(CompiledMessage::deserialize(&bytes[..bytes.len() - 1]).is_err());
        let mut long = bytes.clone();
        long.push(0);
        assert!(CompiledMessage::deserialize(&long).is_err());
    }

    #[test]
    fn writable_positions_follow_header() {
        let message = sample_message(Address::new([1u8; 32]));
        assert!(message.is_writable(0));
        assert!(message.is_writable(1));
        assert!(!message.is_writable(2));
        assert_eq!(message.signer_keys(), &[Address::new([1u8; 32])]);
        assert_eq!(message.fee_payer(), Some(&Address::new([1u8; 32])));
        let keyless = CompiledMessage {
            account_keys: vec![],
            ..message
        };
        assert_eq!(keyless.fee_payer(), None);
    }

    // -- signing ------------------------------------------------------------

    #[test]
    fn sign_and_serialize_envelope() {
        let payer = Keypair::from_seed(&[0x42u8; 32]).unwrap();
        let message = sample_message(payer.pubkey());
        let msg_bytes = message.to_bytes().unwrap();

        let mut tx = CompiledTransaction::new(message);
        tx.sign(&msg_bytes, &[&payer]).unwrap();
        let wire = tx.serialize(&msg_bytes).unwrap();

        // Wire starts with compact-u16 num_signatures = 1 (one byte: 0x01).
        assert_eq!(wire[0], 0x01);
        let signature = Signature::try_from(&wire[1..65]).unwrap();
        assert!(signature.verify(&payer.pubkey(), &wire[65..]));
        assert_eq!(&wire[65..], msg_bytes.as_slice());
        tx.verify().unwrap();
    }

    #[test]
    fn sign_twice_is_state_error() {
        let payer = Keypair::from_seed(&[0x42u8; 32]).unwrap();
        let message = sample_message(payer.pubkey());
        let msg_bytes = message.to_bytes().unwrap();

        let mut tx = CompiledTransaction::new(message);
        tx.sign(&msg_bytes, &[&payer]).unwrap();
        let err = tx.sign(&msg_bytes, &[&payer]).unwrap_err();
        assert!(matches!(err, SolError::State(_)));
        assert_eq!(tx.signatures.len(), 1);
    }

    #[test]
    fn sign_before_serialize_is_state_error() {
        let payer = Keypair::from_seed(&[0x42u8; 32]).unwrap();
        let mut tx = CompiledTransaction::new(sample_message(payer.pubkey()));
        assert!(matches!(tx.sign(&[], &[&payer]), Err(SolError::State(_))));
        assert!(matches!(tx.serialize(&[]), Err(SolError::State(_))));
    }

    #[test]
    fn signatures_follow_signer_list_order() {
        let a = Keypair::from_seed(&[0x01u8; 32]).unwrap();
        let b = Keypair::from_seed(&[0x02u8; 32]).unwrap();
        let mut message = sample_message(a.pubkey());
        message.header.num_required_signatures = 2;
        message.account_keys[1] = b.pubkey();
        let msg_bytes = message.to_bytes().unwrap();

        let mut tx = CompiledTransaction::new(message);
        tx.sign(&msg_bytes, &[&b, &a]).unwrap();
        assert!(tx.signatures[0].verify(&b.pubkey(), &msg_bytes));
        assert!(tx.signatures[1].verify(&a.pubkey(), &msg_bytes));
        // Out of account-key order, so verification against keys fails.
        assert!(tx.verify().is_err());
    }

    #[test]
    fn transaction_deserialize_roundtrip() {
        let payer = Keypair::from_seed(&[0x42u8; 32]).unwrap();
        let message = sample_message(payer.pubkey());
        let msg_bytes = message.to_bytes().unwrap();
        let mut tx = CompiledTransaction::new(message);
        tx.sign(&msg_bytes, &[&payer]).unwrap();
        let wire = tx.serialize(&msg_bytes).unwrap();

        assert_eq!(CompiledTransaction::deserialize(&wire).unwrap(), tx);
    }

    #[test]
    fn oversized_envelope_rejected() {
        let payer = Keypair::from_seed(&[0x42u8; 32]).unwrap();
        let mut message = sample_message(payer.pubkey());
        message.instructions[0].data = vec![0u8; PACKET_DATA_SIZE];
        let msg_bytes = message.to_bytes().unwrap();
        let mut tx = CompiledTransaction::new(message);
        tx.sign(&msg_bytes, &[&payer]).unwrap();
        assert!(matches!(tx.serialize(&msg_bytes), Err(SolError::Validation(_))));
    }
}
