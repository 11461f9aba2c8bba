//! Program Derived Address (PDA) derivation.
//!
//! A PDA is `SHA-256(seed_0 || ... || seed_n || program_id || "ProgramDerivedAddress")`,
//! accepted only when the digest is NOT a valid Ed25519 point, so no private
//! key can ever exist for it.

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::SolError;

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

impl Address {
    /// Derive a program address from `seeds` and `program_id`.
    ///
    /// Returns `Ok(None)` when the digest falls on the curve. Fails only if a
    /// seed is longer than [`MAX_SEED_LEN`].
    pub fn create_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<Option<Address>, SolError> {
        let mut hasher = Sha256::new();

        for (i, seed) in seeds.iter().enumerate() {
            if seed.len() > MAX_SEED_LEN {
                return Err(SolError::Validation(format!(
                    "max seed length exceeded: seed {i} is {} bytes",
                    seed.len()
                )));
            }
            hasher.update(seed);
        }
        hasher.update(program_id);
        hasher.update(PDA_MARKER);

        let address = Address::new(hasher.finalize().into());

        // A valid PDA must NOT be on the Ed25519 curve.
        if address.is_on_curve() {
            return Ok(None);
        }

        Ok(Some(address))
    }

    /// Find the first valid program address, searching bump seeds from 255
    /// down to 1.
    ///
    /// The bump is appended to `seeds` as a final one-byte seed. Bump 0 is
    /// never tried.
    pub fn find_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<(Address, u8), SolError> {
        let (address, bump) = search_bump(seeds, |seeds_with_bump| {
            Self::create_program_address(seeds_with_bump, program_id)
        })?;
        tracing::trace!(%program_id, bump, %address, "found program address");
        Ok((address, bump))
    }
}

/// Try bumps 255 down to 1, each appended to `seeds`, until `derive`
/// yields an address.
fn search_bump<F>(seeds: &[&[u8]], mut derive: F) -> Result<(Address, u8), SolError>
where
    F: FnMut(&[&[u8]]) -> Result<Option<Address>, SolError>,
{
    for bump in (1u8..=255).rev() {
        let bump_seed = [bump];
        let mut seeds_with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        seeds_with_bump.extend_from_slice(seeds);
        seeds_with_bump.push(&bump_seed);

        if let Some(address) = derive(&seeds_with_bump)? {
            return Ok((address, bump));
        }
    }

    Err(SolError::NoViableBump)
}
