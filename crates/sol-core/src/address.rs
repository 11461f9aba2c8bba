//! The 32-byte account identity and its Base58 text form.
//!
//! Solana addresses are simply Base58-encoded 32-byte Ed25519 public keys.
//! There is no hashing step (unlike Bitcoin or Ethereum). The canonical
//! alphabet is the standard Bitcoin Base58 alphabet used by the `bs58` crate.
//!
//! Not every address is a public key: program-derived addresses are chosen
//! precisely because they do NOT decode to a point on the curve. See
//! [`Address::is_on_curve`].

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::SolError;

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 32;

/// Longest possible Base58 rendering of 32 bytes.
const MAX_BASE58_LEN: usize = 44;

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// A 32-byte account, program or blockhash identity.
///
/// Ordering is lexicographic over the raw bytes, which is what the message
/// compiler relies on for its final tie-break.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_BYTES]);

/// A recent blockhash shares the address representation.
pub type Hash = Address;

impl Address {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    /// Decode a Base58 literal at compile time.
    ///
    /// Intended for well-known constants; an invalid literal fails const
    /// evaluation. Use [`Address::from_base58`] for runtime input.
    pub const fn from_str_const(s: &str) -> Self {
        let input = s.as_bytes();
        assert!(
            !input.is_empty() && input.len() <= MAX_BASE58_LEN,
            "base58 literal has invalid length"
        );

        let mut out = [0u8; ADDRESS_BYTES];
        let mut i = 0;
        while i < input.len() {
            let mut carry = base58_digit(input[i]) as u32;
            let mut j = ADDRESS_BYTES;
            while j > 0 {
                j -= 1;
                carry += out[j] as u32 * 58;
                out[j] = (carry & 0xff) as u8;
                carry >>= 8;
            }
            assert!(carry == 0, "base58 literal overflows 32 bytes");
            i += 1;
        }

        // Each leading '1' stands for one zero byte; the rest is the number.
        let mut leading_ones = 0;
        while leading_ones < input.len() && input[leading_ones] == b'1' {
            leading_ones += 1;
        }
        let mut first_nonzero = 0;
        while first_nonzero < ADDRESS_BYTES && out[first_nonzero] == 0 {
            first_nonzero += 1;
        }
        assert!(
            leading_ones + (ADDRESS_BYTES - first_nonzero) == ADDRESS_BYTES,
            "base58 literal does not decode to 32 bytes"
        );
        Self(out)
    }

    /// Decode a Base58 string.
    ///
    /// Fails if the text is not Base58 or does not decode to exactly 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self, SolError> {
        if s.len() > MAX_BASE58_LEN {
            return Err(SolError::Validation(format!(
                "address string too long: {} chars",
                s.len()
            )));
        }

        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SolError::Validation(format!("base58 decode failed for {s:?}: {e}")))?;

        Self::try_from(bytes.as_slice())
    }

    /// Encode as Base58.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// The raw bytes.
    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    pub const fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Returns `true` iff these bytes are the canonical encoding of a point
    /// on the Ed25519 curve.
    ///
    /// The canonical-encoding check runs before decompression: a `y`
    /// coordinate at or above the field modulus is rejected outright even
    /// though it would reduce to a valid point.
    pub fn is_on_curve(&self) -> bool {
        is_canonical_y(&self.0) && CompressedEdwardsY(self.0).decompress().is_some()
    }
}

/// Check that the little-endian `y` coordinate (sign bit masked) is below
/// 2^255 - 19.
///
/// The only non-canonical encodings are `p..2^255`, i.e. a top byte of `0x7f`,
/// thirty `0xff` bytes, and a low byte of at least `0xed`.
fn is_canonical_y(bytes: &[u8; ADDRESS_BYTES]) -> bool {
    if bytes[31] & 0x7f != 0x7f {
        return true;
    }
    if bytes[1..31].iter().any(|&b| b != 0xff) {
        return true;
    }
    bytes[0] < 0xed
}

const fn base58_digit(c: u8) -> u8 {
    let mut i = 0;
    while i < BASE58_ALPHABET.len() {
        if BASE58_ALPHABET[i] == c {
            return i as u8;
        }
        i += 1;
    }
    panic!("invalid base58 character");
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; ADDRESS_BYTES] {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = SolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; ADDRESS_BYTES] = bytes.try_into().map_err(|_| {
            SolError::Validation(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Address {
    type Err = SolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

// RPC payloads carry addresses as Base58 strings.

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AddressVisitor;

        impl Visitor<'_> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a base58-encoded 32-byte address")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Address, E> {
                Address::from_base58(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}

// ---------------------------------------------------------------------------
// Well-known addresses
// ---------------------------------------------------------------------------

/// The System Program: 32 zero bytes.
pub const SYSTEM_PROGRAM_ID: Address = Address::new([0u8; ADDRESS_BYTES]);

/// Wrapped SOL mint.
pub const NATIVE_MINT: Address = Address::from_str_const("So11111111111111111111111111111111111111112");

pub const SYSVAR_RENT_ID: Address =
    Address::from_str_const("SysvarRent111111111111111111111111111111111");
pub const SYSVAR_CLOCK_ID: Address =
    Address::from_str_const("SysvarC1ock11111111111111111111111111111111");
pub const SYSVAR_REWARDS_ID: Address =
    Address::from_str_const("SysvarRewards111111111111111111111111111111");
pub const SYSVAR_STAKE_HISTORY_ID: Address =
    Address::from_str_const("SysvarStakeHistory1111111111111111111111111");
pub const SYSVAR_INSTRUCTIONS_ID: Address =
    Address::from_str_const("Sysvar1nstructions1111111111111111111111111");

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
