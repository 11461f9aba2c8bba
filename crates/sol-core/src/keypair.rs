//! Ed25519 keypairs and detached signatures.
//!
//! A Solana secret key is 64 bytes: the 32-byte Ed25519 seed followed by the
//! 32-byte public key. Key files on disk hold exactly those 64 bytes with no
//! framing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::address::Address;
use crate::crypto;
use crate::error::SolError;

/// Length of a serialized secret key (seed || public key).
pub const SECRET_KEY_BYTES: usize = 64;

/// Length of an Ed25519 seed.
pub const SEED_BYTES: usize = 32;

/// Length of a detached signature.
pub const SIGNATURE_BYTES: usize = 64;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte detached Ed25519 signature.
///
/// The first signature of a transaction doubles as its identifier, so the
/// `Display` form is Base58 like an address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }

    pub const fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    /// Verify this signature over `message` against `signer`.
    ///
    /// Returns `false` for any failure, including a signer that is not a
    /// valid curve point.
    pub fn verify(&self, signer: &Address, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
            return false;
        };
        key.verify(message, &ed25519_dalek::Signature::from_bytes(&self.0))
            .is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = SolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; SIGNATURE_BYTES] = bytes.try_into().map_err(|_| {
            SolError::Validation(format!(
                "signature must be {SIGNATURE_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Signature {
    type Err = SolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SolError::Validation(format!("base58 decode failed for signature: {e}")))?;
        Self::try_from(bytes.as_slice())
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 signing identity.
///
/// The signing key is zeroized on drop (ed25519-dalek's `zeroize` feature).
/// `Debug` only ever shows the public address.
pub struct Keypair {
    signing_key: SigningKey,
    pubkey: Address,
}

impl Keypair {
    /// Create a fresh random keypair from the OS RNG.
    pub fn generate() -> Result<Self, SolError> {
        crypto::init()?;
        let signing_key = SigningKey::generate(&mut OsRng);
        Ok(Self::from_signing_key(signing_key))
    }

    /// Deterministically expand a 32-byte seed into a keypair.
    pub fn from_seed(seed: &[u8; SEED_BYTES]) -> Result<Self, SolError> {
        crypto::init()?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(seed)))
    }

    /// Rebuild a keypair from a previously exported 64-byte secret key.
    ///
    /// Unless `skip_validation` is set, the public half is re-derived from
    /// the seed and must match the trailing 32 bytes. With validation
    /// skipped the trailing bytes are trusted as the address.
    pub fn from_secret_bytes(bytes: &[u8], skip_validation: bool) -> Result<Self, SolError> {
        crypto::init()?;

        if bytes.len() != SECRET_KEY_BYTES {
            return Err(SolError::Validation(format!(
                "secret key must be {SECRET_KEY_BYTES} bytes, got {}",
                bytes.len()
            )));
        }

        let mut seed = Zeroizing::new([0u8; SEED_BYTES]);
        seed.copy_from_slice(&bytes[..SEED_BYTES]);
        let signing_key = SigningKey::from_bytes(&seed);

        let claimed = Address::try_from(&bytes[SEED_BYTES..])?;
        if skip_validation {
            return Ok(Self {
                signing_key,
                pubkey: claimed,
            });
        }

        let derived = Address::new(signing_key.verifying_key().to_bytes());
        if derived != claimed {
            return Err(SolError::Crypto(format!(
                "invalid secret key: derives {derived}, claims {claimed}"
            )));
        }

        Ok(Self {
            signing_key,
            pubkey: derived,
        })
    }

    /// Load a keypair from a raw 64-byte secret key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SolError> {
        let path = path.as_ref();
        let bytes = Zeroizing::new(std::fs::read(path)?);
        if bytes.len() != SECRET_KEY_BYTES {
            return Err(SolError::Validation(format!(
                "invalid secret key file {}: expected {SECRET_KEY_BYTES} bytes, got {}",
                path.display(),
                bytes.len()
            )));
        }
        Self::from_secret_bytes(&bytes, false)
    }

    /// Write the raw 64-byte secret key to `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), SolError> {
        std::fs::write(path, self.secret_bytes().as_slice())?;
        Ok(())
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let pubkey = Address::new(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            pubkey,
        }
    }

    /// The public address of this keypair.
    pub fn pubkey(&self) -> Address {
        self.pubkey
    }

    /// Export the 64-byte secret key (seed || public key).
    pub fn secret_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_BYTES]> {
        let mut out = Zeroizing::new([0u8; SECRET_KEY_BYTES]);
        out[..SEED_BYTES].copy_from_slice(self.signing_key.as_bytes());
        out[SEED_BYTES..].copy_from_slice(self.pubkey.as_bytes());
        out
    }

    /// Produce a detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, SolError> {
        let signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| SolError::Crypto(format!("could not sign message with {}: {e}", self.pubkey)))?;
        Ok(Signature(signature.to_bytes()))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("pubkey", &self.pubkey).finish_non_exhaustive()
    }
}
