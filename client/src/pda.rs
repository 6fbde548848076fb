//! Program-derived address helpers for the staking program.
//!
//! The on-chain program stores its pool-wide state in an account whose
//! address is derived from the admin and stake mint, and per-user stake
//! records in accounts derived from the staker's address. Both sides of
//! the wire must agree on the seed layout, so the constants live here
//! rather than in the callers.

use {
    crate::error::StakingClientError,
    solana_sdk::pubkey::Pubkey,
};

/// Seed prefix for the pool-wide contract state account.
pub const STAKE_STATE_SEED: &[u8] = b"spl_staking";

/// Seed prefix for per-user stake record accounts.
pub const USER_STAKE_SEED: &[u8] = b"spl_staking_user";

/// A derived program address together with the bump seed that pushed it
/// off the ed25519 curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Derives the contract state address for an `(admin, stake_mint)` pair.
///
/// The derivation is deterministic: the same inputs always produce the
/// same address and bump, so callers may re-derive instead of persisting
/// the result.
pub fn derive_stake_state_address(
    admin: &Pubkey,
    stake_mint: &Pubkey,
    program_id: &Pubkey,
) -> Result<DerivedAddress, StakingClientError> {
    derive(
        &[STAKE_STATE_SEED, admin.as_ref(), stake_mint.as_ref()],
        program_id,
    )
}

/// Derives the stake record address for an individual staker.
pub fn derive_user_stake_address(
    user: &Pubkey,
    program_id: &Pubkey,
) -> Result<DerivedAddress, StakingClientError> {
    derive(&[USER_STAKE_SEED, user.as_ref()], program_id)
}

fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<DerivedAddress, StakingClientError> {
    for bump in (0..=255u8).rev() {
        let bump_seed = [bump];
        let mut seeds_with_bump = seeds.to_vec();
        seeds_with_bump.push(&bump_seed);
        if let Ok(address) = Pubkey::create_program_address(&seeds_with_bump, program_id) {
            return Ok(DerivedAddress { address, bump });
        }
    }
    Err(StakingClientError::AddressDerivation {
        program_id: *program_id,
    })
}
