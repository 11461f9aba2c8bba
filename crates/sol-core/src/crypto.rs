//! Process-wide initialization gate for the Ed25519 primitives.
//!
//! `ed25519-dalek` needs no global setup, but we still run a one-shot
//! self-test before the first key is built so that a miscompiled or
//! mis-linked backend fails loudly with [`SolError::Crypto`] instead of
//! producing signatures the network rejects. The outcome is cached; every
//! later call is a cheap read.

use ed25519_dalek::{Signer, SigningKey, Verifier};
use once_cell::sync::OnceCell;

use crate::address::Address;
use crate::error::SolError;

static INIT: OnceCell<Result<(), String>> = OnceCell::new();

/// Initialize the crypto subsystem. Idempotent and thread-safe.
pub fn init() -> Result<(), SolError> {
    INIT.get_or_init(|| {
        let outcome = self_test();
        match &outcome {
            Ok(()) => tracing::debug!("ed25519 self-test passed"),
            Err(e) => tracing::error!(error = %e, "ed25519 self-test failed"),
        }
        outcome
    })
    .clone()
    .map_err(SolError::Crypto)
}

fn self_test() -> Result<(), String> {
    // The Ed25519 basepoint must decompress.
    let mut basepoint = [0x66u8; 32];
    basepoint[0] = 0x58;
    if !Address::new(basepoint).is_on_curve() {
        return Err("basepoint failed to decompress".into());
    }

    let key = SigningKey::from_bytes(&[0x01u8; 32]);
    let message = b"sol-core self-test";
    let signature = key.sign(message);
    key.verifying_key()
        .verify(message, &signature)
        .map_err(|e| format!("sign/verify roundtrip failed: {e}"))
}
