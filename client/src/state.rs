//! Account state layout for the staking program.

use {
    crate::error::StakingClientError,
    arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs},
    solana_sdk::pubkey::Pubkey,
};

/// Pool-wide contract state, stored at the derived stake-state address.
///
/// The layout is fixed: a one-byte initialization flag, three pubkeys,
/// then nine little-endian `u64` words in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractState {
    pub is_initialized: bool,
    pub admin_pubkey: Pubkey,
    pub stake_token_mint: Pubkey,
    pub stake_token_account: Pubkey,
    pub minimum_stake_amount: u64,
    pub minimum_lock_duration: u64,
    pub normal_staking_apy: u64,
    pub locked_staking_apy: u64,
    pub early_withdrawal_fee: u64,
    pub fee_basis_points: u64,
    pub max_fee: u64,
    pub total_staked: u64,
    pub total_earned: u64,
}

impl ContractState {
    /// Serialized size: flag + 3 pubkeys + 9 u64 fields.
    pub const LEN: usize = 1 + 32 * 3 + 8 * 9;

    /// Deserializes the state from account data.
    ///
    /// The buffer must be exactly [`Self::LEN`] bytes and the
    /// initialization flag must be `0` or `1`.
    pub fn unpack(src: &[u8]) -> Result<Self, StakingClientError> {
        if src.len() != Self::LEN {
            return Err(StakingClientError::InvalidAccountData(format!(
                "contract state must be {} bytes, got {}",
                Self::LEN,
                src.len()
            )));
        }
        let src = array_ref![src, 0, ContractState::LEN];
        let (
            is_initialized,
            admin_pubkey,
            stake_token_mint,
            stake_token_account,
            minimum_stake_amount,
            minimum_lock_duration,
            normal_staking_apy,
            locked_staking_apy,
            early_withdrawal_fee,
            fee_basis_points,
            max_fee,
            total_staked,
            total_earned,
        ) = array_refs![src, 1, 32, 32, 32, 8, 8, 8, 8, 8, 8, 8, 8, 8];
        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            flag => {
                return Err(StakingClientError::InvalidAccountData(format!(
                    "initialization flag must be 0 or 1, got {flag}"
                )))
            }
        };
        Ok(Self {
            is_initialized,
            admin_pubkey: Pubkey::new_from_array(*admin_pubkey),
            stake_token_mint: Pubkey::new_from_array(*stake_token_mint),
            stake_token_account: Pubkey::new_from_array(*stake_token_account),
            minimum_stake_amount: u64::from_le_bytes(*minimum_stake_amount),
            minimum_lock_duration: u64::from_le_bytes(*minimum_lock_duration),
            normal_staking_apy: u64::from_le_bytes(*normal_staking_apy),
            locked_staking_apy: u64::from_le_bytes(*locked_staking_apy),
            early_withdrawal_fee: u64::from_le_bytes(*early_withdrawal_fee),
            fee_basis_points: u64::from_le_bytes(*fee_basis_points),
            max_fee: u64::from_le_bytes(*max_fee),
            total_staked: u64::from_le_bytes(*total_staked),
            total_earned: u64::from_le_bytes(*total_earned),
        })
    }

    /// Serializes the state into its fixed account layout.
    pub fn pack(&self) -> [u8; Self::LEN] {
        let mut dst = [0u8; Self::LEN];
        {
            let dst = array_mut_ref![dst, 0, ContractState::LEN];
            let (
                is_initialized,
                admin_pubkey,
                stake_token_mint,
                stake_token_account,
                minimum_stake_amount,
                minimum_lock_duration,
                normal_staking_apy,
                locked_staking_apy,
                early_withdrawal_fee,
                fee_basis_points,
                max_fee,
                total_staked,
                total_earned,
            ) = mut_array_refs![dst, 1, 32, 32, 32, 8, 8, 8, 8, 8, 8, 8, 8, 8];
            is_initialized[0] = self.is_initialized as u8;
            admin_pubkey.copy_from_slice(self.admin_pubkey.as_ref());
            stake_token_mint.copy_from_slice(self.stake_token_mint.as_ref());
            stake_token_account.copy_from_slice(self.stake_token_account.as_ref());
            *minimum_stake_amount = self.minimum_stake_amount.to_le_bytes();
            *minimum_lock_duration = self.minimum_lock_duration.to_le_bytes();
            *normal_staking_apy = self.normal_staking_apy.to_le_bytes();
            *locked_staking_apy = self.locked_staking_apy.to_le_bytes();
            *early_withdrawal_fee = self.early_withdrawal_fee.to_le_bytes();
            *fee_basis_points = self.fee_basis_points.to_le_bytes();
            *max_fee = self.max_fee.to_le_bytes();
            *total_staked = self.total_staked.to_le_bytes();
            *total_earned = self.total_earned.to_le_bytes();
        }
        dst
    }
}
