//! Instruction definitions for the staking program.
//!
//! The wire format is deliberately plain: a one-byte opcode followed by
//! the variant's fields as little-endian `u64` words in declaration
//! order. Scaled integers only; see [`crate::units`] for the conversion
//! from human-readable values.

use {
    crate::error::StakingClientError,
    arrayref::{array_ref, array_refs},
    solana_sdk::{
        instruction::{AccountMeta, Instruction},
        pubkey::Pubkey,
        system_program, sysvar,
    },
};

/// Instructions supported by the staking program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingInstruction {
    /// One-time initialization of the stake pool.
    ///
    /// Creates the contract state at the derived stake-state address and
    /// takes ownership of the pool token account.
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer]`   The pool admin, also the fee payer.
    /// 1. `[writable]` Contract state account, at the derived address.
    /// 2. `[writable]` Pool token account holding staked funds.
    /// 3. `[]`         Stake token mint.
    /// 4. `[]`         Token program.
    /// 5. `[]`         Rent sysvar.
    /// 6. `[]`         System program.
    Initialize {
        minimum_stake_amount: u64,
        minimum_lock_duration: u64,
        normal_staking_apy: u64,
        locked_staking_apy: u64,
        early_withdrawal_fee: u64,
        fee_basis_points: u64,
        max_fee: u64,
    },

    /// Deposit tokens into the pool.
    ///
    /// Reserved for the staker-facing client; the admin tooling never
    /// submits it but must keep the opcode allocated.
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer, writable]` The staker.
    /// 1. `[writable]`         Staker's token account.
    /// 2. `[writable]`         Staker's stake record account.
    /// 3. `[writable]`         Pool token account.
    /// 4. `[writable]`         Contract state account.
    /// 5. `[]`                 Stake token mint.
    /// 6. `[]`                 Token program.
    /// 7. `[]`                 System program.
    Stake {
        stake_type: u8,
        amount: u64,
        decimals: u64,
        lock_duration: u64,
    },

    /// Withdraw a stake together with accrued rewards.
    ///
    /// Reserved for the staker-facing client, like [`Self::Stake`].
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer, writable]` The staker.
    /// 1. `[writable]`         Staker's token account.
    /// 2. `[writable]`         Staker's stake record account.
    /// 3. `[writable]`         Pool token account.
    /// 4. `[writable]`         Contract state account.
    /// 5. `[]`                 Stake token mint.
    /// 6. `[]`                 Token program.
    Unstake {
        decimals: u64,
    },

    /// Replace both APY rates in the contract state.
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer]`   The pool admin.
    /// 1. `[writable]` Contract state account.
    UpdateApy {
        normal_staking_apy: u64,
        locked_staking_apy: u64,
    },
}

impl StakingInstruction {
    /// Serializes the instruction into the program's wire format.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::Initialize {
                minimum_stake_amount,
                minimum_lock_duration,
                normal_staking_apy,
                locked_staking_apy,
                early_withdrawal_fee,
                fee_basis_points,
                max_fee,
            } => {
                let mut data = Vec::with_capacity(1 + 7 * 8);
                data.push(0);
                data.extend_from_slice(&minimum_stake_amount.to_le_bytes());
                data.extend_from_slice(&minimum_lock_duration.to_le_bytes());
                data.extend_from_slice(&normal_staking_apy.to_le_bytes());
                data.extend_from_slice(&locked_staking_apy.to_le_bytes());
                data.extend_from_slice(&early_withdrawal_fee.to_le_bytes());
                data.extend_from_slice(&fee_basis_points.to_le_bytes());
                data.extend_from_slice(&max_fee.to_le_bytes());
                data
            }
            Self::Stake {
                stake_type,
                amount,
                decimals,
                lock_duration,
            } => {
                let mut data = Vec::with_capacity(2 + 3 * 8);
                data.push(1);
                data.push(*stake_type);
                data.extend_from_slice(&amount.to_le_bytes());
                data.extend_from_slice(&decimals.to_le_bytes());
                data.extend_from_slice(&lock_duration.to_le_bytes());
                data
            }
            Self::Unstake { decimals } => {
                let mut data = Vec::with_capacity(1 + 8);
                data.push(2);
                data.extend_from_slice(&decimals.to_le_bytes());
                data
            }
            Self::UpdateApy {
                normal_staking_apy,
                locked_staking_apy,
            } => {
                let mut data = Vec::with_capacity(1 + 2 * 8);
                data.push(3);
                data.extend_from_slice(&normal_staking_apy.to_le_bytes());
                data.extend_from_slice(&locked_staking_apy.to_le_bytes());
                data
            }
        }
    }

    /// Deserializes an instruction from the program's wire format.
    pub fn unpack(data: &[u8]) -> Result<Self, StakingClientError> {
        let (&opcode, rest) = data.split_first().ok_or_else(|| {
            StakingClientError::InvalidInstructionData("instruction data is empty".to_string())
        })?;
        match opcode {
            0 => {
                if rest.len() != 7 * 8 {
                    return Err(payload_length_error(opcode, 7 * 8, rest.len()));
                }
                let fields = array_ref![rest, 0, 56];
                let (
                    minimum_stake_amount,
                    minimum_lock_duration,
                    normal_staking_apy,
                    locked_staking_apy,
                    early_withdrawal_fee,
                    fee_basis_points,
                    max_fee,
                ) = array_refs![fields, 8, 8, 8, 8, 8, 8, 8];
                Ok(Self::Initialize {
                    minimum_stake_amount: u64::from_le_bytes(*minimum_stake_amount),
                    minimum_lock_duration: u64::from_le_bytes(*minimum_lock_duration),
                    normal_staking_apy: u64::from_le_bytes(*normal_staking_apy),
                    locked_staking_apy: u64::from_le_bytes(*locked_staking_apy),
                    early_withdrawal_fee: u64::from_le_bytes(*early_withdrawal_fee),
                    fee_basis_points: u64::from_le_bytes(*fee_basis_points),
                    max_fee: u64::from_le_bytes(*max_fee),
                })
            }
            1 => {
                let (&stake_type, rest) = rest.split_first().ok_or_else(|| {
                    payload_length_error(opcode, 1 + 3 * 8, rest.len())
                })?;
                if rest.len() != 3 * 8 {
                    return Err(payload_length_error(opcode, 1 + 3 * 8, 1 + rest.len()));
                }
                let fields = array_ref![rest, 0, 24];
                let (amount, decimals, lock_duration) = array_refs![fields, 8, 8, 8];
                Ok(Self::Stake {
                    stake_type,
                    amount: u64::from_le_bytes(*amount),
                    decimals: u64::from_le_bytes(*decimals),
                    lock_duration: u64::from_le_bytes(*lock_duration),
                })
            }
            2 => {
                if rest.len() != 8 {
                    return Err(payload_length_error(opcode, 8, rest.len()));
                }
                let decimals = array_ref![rest, 0, 8];
                Ok(Self::Unstake {
                    decimals: u64::from_le_bytes(*decimals),
                })
            }
            3 => {
                if rest.len() != 2 * 8 {
                    return Err(payload_length_error(opcode, 2 * 8, rest.len()));
                }
                let fields = array_ref![rest, 0, 16];
                let (normal_staking_apy, locked_staking_apy) = array_refs![fields, 8, 8];
                Ok(Self::UpdateApy {
                    normal_staking_apy: u64::from_le_bytes(*normal_staking_apy),
                    locked_staking_apy: u64::from_le_bytes(*locked_staking_apy),
                })
            }
            _ => Err(StakingClientError::InvalidInstructionData(format!(
                "unknown opcode {opcode}"
            ))),
        }
    }
}

fn payload_length_error(opcode: u8, expected: usize, got: usize) -> StakingClientError {
    StakingClientError::InvalidInstructionData(format!(
        "opcode {opcode}: expected {expected} payload bytes, got {got}"
    ))
}

/// Scaled field values for [`StakingInstruction::Initialize`].
///
/// Produced from human-readable parameters by
/// [`crate::workflow::InitializeParams::to_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeFields {
    pub minimum_stake_amount: u64,
    pub minimum_lock_duration: u64,
    pub normal_staking_apy: u64,
    pub locked_staking_apy: u64,
    pub early_withdrawal_fee: u64,
    pub fee_basis_points: u64,
    pub max_fee: u64,
}

/// Builds an `Initialize` instruction with the account list the program
/// expects.
pub fn initialize(
    program_id: &Pubkey,
    admin: &Pubkey,
    stake_state: &Pubkey,
    stake_token_account: &Pubkey,
    stake_mint: &Pubkey,
    token_program_id: &Pubkey,
    fields: InitializeFields,
) -> Instruction {
    let data = StakingInstruction::Initialize {
        minimum_stake_amount: fields.minimum_stake_amount,
        minimum_lock_duration: fields.minimum_lock_duration,
        normal_staking_apy: fields.normal_staking_apy,
        locked_staking_apy: fields.locked_staking_apy,
        early_withdrawal_fee: fields.early_withdrawal_fee,
        fee_basis_points: fields.fee_basis_points,
        max_fee: fields.max_fee,
    }
    .pack();
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new(*stake_state, false),
            AccountMeta::new(*stake_token_account, false),
            AccountMeta::new_readonly(*stake_mint, false),
            AccountMeta::new_readonly(*token_program_id, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Builds an `UpdateApy` instruction.
pub fn update_apy(
    program_id: &Pubkey,
    admin: &Pubkey,
    stake_state: &Pubkey,
    normal_staking_apy: u64,
    locked_staking_apy: u64,
) -> Instruction {
    let data = StakingInstruction::UpdateApy {
        normal_staking_apy,
        locked_staking_apy,
    }
    .pack();
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new(*stake_state, false),
        ],
        data,
    }
}

/// Builds a `Stake` instruction for the staker-facing flow.
#[allow(clippy::too_many_arguments)]
pub fn stake(
    program_id: &Pubkey,
    user: &Pubkey,
    user_token_account: &Pubkey,
    user_stake_record: &Pubkey,
    stake_token_account: &Pubkey,
    stake_state: &Pubkey,
    stake_mint: &Pubkey,
    token_program_id: &Pubkey,
    stake_type: u8,
    amount: u64,
    decimals: u64,
    lock_duration: u64,
) -> Instruction {
    let data = StakingInstruction::Stake {
        stake_type,
        amount,
        decimals,
        lock_duration,
    }
    .pack();
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*user, true),
            AccountMeta::new(*user_token_account, false),
            AccountMeta::new(*user_stake_record, false),
            AccountMeta::new(*stake_token_account, false),
            AccountMeta::new(*stake_state, false),
            AccountMeta::new_readonly(*stake_mint, false),
            AccountMeta::new_readonly(*token_program_id, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Builds an `Unstake` instruction for the staker-facing flow.
#[allow(clippy::too_many_arguments)]
pub fn unstake(
    program_id: &Pubkey,
    user: &Pubkey,
    user_token_account: &Pubkey,
    user_stake_record: &Pubkey,
    stake_token_account: &Pubkey,
    stake_state: &Pubkey,
    stake_mint: &Pubkey,
    token_program_id: &Pubkey,
    decimals: u64,
) -> Instruction {
    let data = StakingInstruction::Unstake { decimals }.pack();
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*user, true),
            AccountMeta::new(*user_token_account, false),
            AccountMeta::new(*user_stake_record, false),
            AccountMeta::new(*stake_token_account, false),
            AccountMeta::new(*stake_state, false),
            AccountMeta::new_readonly(*stake_mint, false),
            AccountMeta::new_readonly(*token_program_id, false),
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches};

    #[test]
    fn initialize_packs_to_the_documented_layout() {
        let packed = StakingInstruction::Initialize {
            minimum_stake_amount: 10_000_000_000,
            minimum_lock_duration: 604_800,
            normal_staking_apy: 26_390,
            locked_staking_apy: 60_570,
            early_withdrawal_fee: 100,
            fee_basis_points: 800,
            max_fee: 1_000_000_000_000_000,
        }
        .pack();

        let mut expected = vec![0];
        for value in [
            10_000_000_000u64,
            604_800,
            26_390,
            60_570,
            100,
            800,
            1_000_000_000_000_000,
        ] {
            expected.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(packed, expected);
        assert_eq!(packed.len(), 57);
    }

    #[test]
    fn update_apy_packs_to_the_documented_layout() {
        let packed = StakingInstruction::UpdateApy {
            normal_staking_apy: 1780,
            locked_staking_apy: 3127,
        }
        .pack();

        let mut expected = vec![3];
        expected.extend_from_slice(&1780u64.to_le_bytes());
        expected.extend_from_slice(&3127u64.to_le_bytes());
        assert_eq!(packed, expected);
    }

    #[test]
    fn every_variant_round_trips_through_pack() {
        let variants = [
            StakingInstruction::Initialize {
                minimum_stake_amount: 1,
                minimum_lock_duration: 2,
                normal_staking_apy: 3,
                locked_staking_apy: 4,
                early_withdrawal_fee: 5,
                fee_basis_points: 6,
                max_fee: 7,
            },
            StakingInstruction::Stake {
                stake_type: 1,
                amount: 5_000_000_000,
                decimals: 9,
                lock_duration: 604_800,
            },
            StakingInstruction::Unstake { decimals: 9 },
            StakingInstruction::UpdateApy {
                normal_staking_apy: 500,
                locked_staking_apy: 900,
            },
        ];
        for variant in variants {
            let decoded = StakingInstruction::unpack(&variant.pack()).unwrap();
            assert_eq!(decoded, variant);
        }
    }

    #[test]
    fn unpack_rejects_malformed_data() {
        assert_matches!(
            StakingInstruction::unpack(&[]),
            Err(StakingClientError::InvalidInstructionData(_))
        );
        assert_matches!(
            StakingInstruction::unpack(&[9]),
            Err(StakingClientError::InvalidInstructionData(_))
        );
        // Initialize payload cut short by one byte.
        assert_matches!(
            StakingInstruction::unpack(&[0; 56]),
            Err(StakingClientError::InvalidInstructionData(_))
        );
        // UpdateApy payload with trailing garbage.
        assert_matches!(
            StakingInstruction::unpack(&[3; 18]),
            Err(StakingClientError::InvalidInstructionData(_))
        );
    }

    #[test]
    fn initialize_builder_sets_the_expected_account_flags() {
        let program_id = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let stake_state = Pubkey::new_unique();
        let stake_token_account = Pubkey::new_unique();
        let stake_mint = Pubkey::new_unique();

        let instruction = initialize(
            &program_id,
            &admin,
            &stake_state,
            &stake_token_account,
            &stake_mint,
            &spl_token_2022::id(),
            InitializeFields {
                minimum_stake_amount: 1,
                minimum_lock_duration: 1,
                normal_staking_apy: 1,
                locked_staking_apy: 1,
                early_withdrawal_fee: 1,
                fee_basis_points: 1,
                max_fee: 1,
            },
        );

        assert_eq!(instruction.program_id, program_id);
        assert_eq!(instruction.accounts.len(), 7);
        assert_eq!(instruction.accounts[0], AccountMeta::new_readonly(admin, true));
        assert_eq!(instruction.accounts[1], AccountMeta::new(stake_state, false));
        assert_eq!(
            instruction.accounts[2],
            AccountMeta::new(stake_token_account, false)
        );
        assert_eq!(
            instruction.accounts[3],
            AccountMeta::new_readonly(stake_mint, false)
        );
        assert_eq!(
            instruction.accounts[4],
            AccountMeta::new_readonly(spl_token_2022::id(), false)
        );
        assert_eq!(
            instruction.accounts[5],
            AccountMeta::new_readonly(sysvar::rent::id(), false)
        );
        assert_eq!(
            instruction.accounts[6],
            AccountMeta::new_readonly(system_program::id(), false)
        );
    }

    #[test]
    fn update_apy_builder_keeps_the_admin_readonly() {
        let program_id = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let stake_state = Pubkey::new_unique();

        let instruction = update_apy(&program_id, &admin, &stake_state, 500, 900);

        assert_eq!(instruction.accounts.len(), 2);
        assert_eq!(instruction.accounts[0], AccountMeta::new_readonly(admin, true));
        assert_eq!(instruction.accounts[1], AccountMeta::new(stake_state, false));
    }

    #[test]
    fn staker_builders_order_accounts_for_the_program() {
        let program_id = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let user_token_account = Pubkey::new_unique();
        let user_stake_record = Pubkey::new_unique();
        let stake_token_account = Pubkey::new_unique();
        let stake_state = Pubkey::new_unique();
        let stake_mint = Pubkey::new_unique();

        let staked = stake(
            &program_id,
            &user,
            &user_token_account,
            &user_stake_record,
            &stake_token_account,
            &stake_state,
            &stake_mint,
            &spl_token_2022::id(),
            1,
            5_000_000_000,
            9,
            604_800,
        );
        assert_eq!(staked.accounts.len(), 8);
        assert_eq!(staked.accounts[0], AccountMeta::new(user, true));
        assert_eq!(
            staked.accounts[7],
            AccountMeta::new_readonly(system_program::id(), false)
        );
        assert_eq!(staked.data[0], 1);
        assert_eq!(staked.data[1], 1);

        let unstaked = unstake(
            &program_id,
            &user,
            &user_token_account,
            &user_stake_record,
            &stake_token_account,
            &stake_state,
            &stake_mint,
            &spl_token_2022::id(),
            9,
        );
        assert_eq!(unstaked.accounts.len(), 7);
        assert_eq!(unstaked.data, {
            let mut expected = vec![2];
            expected.extend_from_slice(&9u64.to_le_bytes());
            expected
        });
    }
}
