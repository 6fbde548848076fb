//! High-level admin workflows: pool initialization, APY updates, and
//! state inspection.
//!
//! Workflows take human-readable parameters, scale them into the
//! program's integer fields, and drive the submitter. Credentials are
//! persisted only after a transaction confirms, so a failed run leaves
//! the keystore exactly as it found it and can simply be re-run.

use {
    crate::{
        config::StakingConfig,
        error::StakingClientError,
        instruction::{self, InitializeFields},
        keystore::{Keystore, ADMIN_KEY, STAKE_STATE_RECORD, STAKE_TOKEN_ACCOUNT_KEY},
        pda::{self, DerivedAddress},
        state::ContractState,
        submit::{LedgerRpc, TransactionSubmitter},
        units,
    },
    log::info,
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Keypair, Signature},
        signer::Signer,
        system_instruction,
    },
};

/// Human-readable pool parameters for [`StakingAdmin::initialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeParams {
    /// Minimum stake, in whole tokens.
    pub minimum_stake_tokens: f64,
    pub minimum_lock_duration_secs: u64,
    /// Yearly rate in percent, carried on chain with one fractional
    /// digit.
    pub normal_staking_apy: f64,
    pub locked_staking_apy: f64,
    /// Fee charged on early withdrawal from a locked stake, in percent.
    pub early_withdrawal_fee: f64,
    /// Transfer fee the pool accounts for, in basis points. Stored on
    /// chain unscaled.
    pub fee_basis_points: u64,
    /// Cap on the transfer fee, in whole tokens.
    pub max_fee_tokens: f64,
}

impl Default for InitializeParams {
    /// The parameters the deployment scripts launch with.
    fn default() -> Self {
        Self {
            minimum_stake_tokens: 10.0,
            minimum_lock_duration_secs: 604_800,
            normal_staking_apy: 2_639.0,
            locked_staking_apy: 6_057.0,
            early_withdrawal_fee: 10.0,
            fee_basis_points: 800,
            max_fee_tokens: 1_000_000.0,
        }
    }
}

impl InitializeParams {
    /// Scales the human-readable values into the program's integer
    /// fields for a mint with the given decimals.
    pub fn to_fields(&self, decimals: u8) -> Result<InitializeFields, StakingClientError> {
        Ok(InitializeFields {
            minimum_stake_amount: units::scale_token_amount(
                "minimum stake",
                self.minimum_stake_tokens,
                decimals,
            )?,
            minimum_lock_duration: self.minimum_lock_duration_secs,
            normal_staking_apy: units::scale_rate("normal staking apy", self.normal_staking_apy)?,
            locked_staking_apy: units::scale_rate("locked staking apy", self.locked_staking_apy)?,
            early_withdrawal_fee: units::scale_rate(
                "early withdrawal fee",
                self.early_withdrawal_fee,
            )?,
            fee_basis_points: self.fee_basis_points,
            max_fee: units::scale_token_amount("max fee", self.max_fee_tokens, decimals)?,
        })
    }
}

/// Replacement APY rates for [`StakingAdmin::update_apy`], in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateApyParams {
    pub normal_staking_apy: f64,
    pub locked_staking_apy: f64,
}

/// What a confirmed [`StakingAdmin::initialize`] created.
#[derive(Debug, Clone)]
pub struct InitializeReport {
    pub signature: Signature,
    pub slot: u64,
    pub stake_state: Pubkey,
    pub stake_state_bump: u8,
    pub stake_token_account: Pubkey,
}

/// Outcome of a confirmed [`StakingAdmin::update_apy`].
#[derive(Debug, Clone)]
pub struct UpdateApyReport {
    pub signature: Signature,
    pub slot: u64,
    pub stake_state: Pubkey,
}

/// The admin-side entry point, tying the keystore, deployment config,
/// and submitter together.
pub struct StakingAdmin<'a, C> {
    rpc: &'a C,
    keystore: &'a Keystore,
    config: &'a StakingConfig,
    submitter: TransactionSubmitter,
}

impl<'a, C: LedgerRpc + Sync> StakingAdmin<'a, C> {
    pub fn new(rpc: &'a C, keystore: &'a Keystore, config: &'a StakingConfig) -> Self {
        Self::with_submitter(rpc, keystore, config, TransactionSubmitter::new())
    }

    pub fn with_submitter(
        rpc: &'a C,
        keystore: &'a Keystore,
        config: &'a StakingConfig,
        submitter: TransactionSubmitter,
    ) -> Self {
        Self {
            rpc,
            keystore,
            config,
            submitter,
        }
    }

    /// Creates the pool in one atomic transaction: fund the pool token
    /// account, initialize it for the stake mint, and initialize the
    /// contract state at the derived address.
    ///
    /// Refuses to run if the keystore already holds pool credentials,
    /// since a second pool under the same admin and mint would derive
    /// the same state address anyway.
    pub async fn initialize(
        &self,
        params: &InitializeParams,
    ) -> Result<InitializeReport, StakingClientError> {
        let admin = self.keystore.load_keypair(ADMIN_KEY)?;
        if self.keystore.contains_keypair(STAKE_TOKEN_ACCOUNT_KEY) {
            return Err(StakingClientError::CredentialExists(
                STAKE_TOKEN_ACCOUNT_KEY.to_string(),
            ));
        }
        if self.keystore.contains_address(STAKE_STATE_RECORD) {
            return Err(StakingClientError::CredentialExists(
                STAKE_STATE_RECORD.to_string(),
            ));
        }

        let derived = pda::derive_stake_state_address(
            &admin.pubkey(),
            &self.config.stake_mint,
            &self.config.program_id,
        )?;
        let token_account = Keypair::new();
        let fields = params.to_fields(self.config.token_decimals)?;

        let space = self.config.token_program.stake_account_space()?;
        let lamports = self.rpc.minimum_balance_for_rent_exemption(space).await?;

        let token_program_id = self.config.token_program.id();
        let create_account = system_instruction::create_account(
            &admin.pubkey(),
            &token_account.pubkey(),
            lamports,
            space as u64,
            &token_program_id,
        );
        // The token-2022 builder understands both token programs.
        let initialize_token_account = spl_token_2022::instruction::initialize_account(
            &token_program_id,
            &token_account.pubkey(),
            &self.config.stake_mint,
            &admin.pubkey(),
        )
        .map_err(|err| {
            StakingClientError::InvalidInstructionData(format!("initialize_account: {err}"))
        })?;
        let initialize_pool = instruction::initialize(
            &self.config.program_id,
            &admin.pubkey(),
            &derived.address,
            &token_account.pubkey(),
            &self.config.stake_mint,
            &token_program_id,
            fields,
        );

        let (signature, slot) = self
            .submitter
            .submit(
                self.rpc,
                &[create_account, initialize_token_account, initialize_pool],
                &admin.pubkey(),
                &[&admin, &token_account],
            )
            .await?
            .into_result()?;

        self.keystore
            .store_keypair(STAKE_TOKEN_ACCOUNT_KEY, &token_account)?;
        self.keystore
            .record_address(STAKE_STATE_RECORD, &derived.address)?;
        info!(
            "stake pool initialized at {} in slot {slot}",
            derived.address
        );

        Ok(InitializeReport {
            signature,
            slot,
            stake_state: derived.address,
            stake_state_bump: derived.bump,
            stake_token_account: token_account.pubkey(),
        })
    }

    /// Replaces both APY rates in the contract state.
    pub async fn update_apy(
        &self,
        params: &UpdateApyParams,
    ) -> Result<UpdateApyReport, StakingClientError> {
        let admin = self.keystore.load_keypair(ADMIN_KEY)?;
        let stake_state = self.stake_state_address()?;
        let normal = units::scale_rate("normal staking apy", params.normal_staking_apy)?;
        let locked = units::scale_rate("locked staking apy", params.locked_staking_apy)?;
        let instruction = instruction::update_apy(
            &self.config.program_id,
            &admin.pubkey(),
            &stake_state,
            normal,
            locked,
        );

        let (signature, slot) = self
            .submitter
            .submit(self.rpc, &[instruction], &admin.pubkey(), &[&admin])
            .await?
            .into_result()?;
        info!(
            "apy updated to {}/{} in slot {slot}",
            params.normal_staking_apy, params.locked_staking_apy
        );

        Ok(UpdateApyReport {
            signature,
            slot,
            stake_state,
        })
    }

    /// The stake-state address: the keystore record when present,
    /// re-derived from the admin key otherwise.
    pub fn stake_state_address(&self) -> Result<Pubkey, StakingClientError> {
        if self.keystore.contains_address(STAKE_STATE_RECORD) {
            return self.keystore.load_address(STAKE_STATE_RECORD);
        }
        let admin = self.keystore.load_keypair(ADMIN_KEY)?;
        let DerivedAddress { address, .. } = pda::derive_stake_state_address(
            &admin.pubkey(),
            &self.config.stake_mint,
            &self.config.program_id,
        )?;
        Ok(address)
    }

    /// Reads and decodes the pool's contract state.
    pub async fn fetch_state(&self) -> Result<ContractState, StakingClientError> {
        let address = self.stake_state_address()?;
        let data = self.rpc.account_data(&address).await?.ok_or_else(|| {
            StakingClientError::InvalidAccountData(format!("no account at {address}"))
        })?;
        ContractState::unpack(&data)
    }
}
