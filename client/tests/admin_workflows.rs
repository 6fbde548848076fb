//! End-to-end admin workflow tests against the in-memory ledger.
//!
//! These cover the contractual behavior of the workflows: the exact
//! transaction envelopes they build, when credentials are persisted,
//! and how terminal submission outcomes surface to the caller.

use {
    assert_matches::assert_matches,
    solana_sdk::{
        instruction::InstructionError, pubkey::Pubkey, signature::Keypair, signer::Signer,
        transaction::TransactionError,
    },
    spl_staking_client::{
        config::{Cluster, StakingConfig},
        error::StakingClientError,
        instruction::StakingInstruction,
        keystore::{Keystore, ADMIN_KEY, STAKE_STATE_RECORD, STAKE_TOKEN_ACCOUNT_KEY},
        mock::MockLedger,
        pda,
        state::ContractState,
        submit::TransactionSubmitter,
        workflow::{InitializeParams, StakingAdmin, UpdateApyParams},
    },
    std::time::Duration,
    tempfile::TempDir,
};

fn test_config() -> StakingConfig {
    StakingConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), Cluster::Localnet)
}

fn keystore_with_admin() -> (TempDir, Keystore, Keypair) {
    let dir = TempDir::new().unwrap();
    let keystore = Keystore::open(dir.path()).unwrap();
    let admin = Keypair::new();
    keystore.store_keypair(ADMIN_KEY, &admin).unwrap();
    (dir, keystore, admin)
}

fn fast_submitter() -> TransactionSubmitter {
    TransactionSubmitter::with_poll_interval(Duration::ZERO)
}

#[tokio::test]
async fn initialize_confirms_atomically_and_persists_credentials() {
    let (_dir, keystore, admin) = keystore_with_admin();
    let config = test_config();
    let ledger = MockLedger::confirming();
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    let report = staking
        .initialize(&InitializeParams::default())
        .await
        .unwrap();

    // One transaction carrying the full three-instruction envelope:
    // create the pool token account, initialize it, initialize the pool.
    let transactions = ledger.transactions();
    assert_eq!(transactions.len(), 1);
    let message = &transactions[0].message;
    assert_eq!(message.instructions.len(), 3);
    assert_eq!(message.header.num_required_signatures, 2);
    assert_eq!(message.header.num_readonly_signed_accounts, 0);
    assert_eq!(message.header.num_readonly_unsigned_accounts, 5);
    assert_eq!(message.account_keys.len(), 8);

    // The program instruction carries the scaled launch parameters.
    let program_ix = &message.instructions[2];
    assert_eq!(
        message.account_keys[program_ix.program_id_index as usize],
        config.program_id
    );
    let decoded = StakingInstruction::unpack(&program_ix.data).unwrap();
    assert_eq!(
        decoded,
        StakingInstruction::Initialize {
            minimum_stake_amount: 10_000_000_000,
            minimum_lock_duration: 604_800,
            normal_staking_apy: 26_390,
            locked_staking_apy: 60_570,
            early_withdrawal_fee: 100,
            fee_basis_points: 800,
            max_fee: 1_000_000_000_000_000,
        }
    );

    // Confirmed, so the credentials landed in the keystore.
    let derived =
        pda::derive_stake_state_address(&admin.pubkey(), &config.stake_mint, &config.program_id)
            .unwrap();
    assert_eq!(report.stake_state, derived.address);
    assert_eq!(report.stake_state_bump, derived.bump);
    assert_eq!(
        keystore.load_address(STAKE_STATE_RECORD).unwrap(),
        derived.address
    );
    assert_eq!(
        keystore
            .load_keypair(STAKE_TOKEN_ACCOUNT_KEY)
            .unwrap()
            .pubkey(),
        report.stake_token_account
    );
}

#[tokio::test]
async fn a_rejected_initialize_persists_nothing() {
    let (_dir, keystore, _admin) = keystore_with_admin();
    let config = test_config();
    let err = TransactionError::InstructionError(2, InstructionError::Custom(0));
    let ledger = MockLedger::rejecting_on_send(err.clone());
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    let outcome = staking.initialize(&InitializeParams::default()).await;
    assert_matches!(outcome, Err(StakingClientError::Rejected(ref e)) if *e == err);

    assert!(!keystore.contains_keypair(STAKE_TOKEN_ACCOUNT_KEY));
    assert!(!keystore.contains_address(STAKE_STATE_RECORD));
}

#[tokio::test]
async fn an_expired_initialize_persists_nothing() {
    let (_dir, keystore, _admin) = keystore_with_admin();
    let config = test_config();
    let ledger = MockLedger::expiring(600);
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    assert_matches!(
        staking.initialize(&InitializeParams::default()).await,
        Err(StakingClientError::BlockhashExpired)
    );
    assert!(!keystore.contains_keypair(STAKE_TOKEN_ACCOUNT_KEY));
    assert!(!keystore.contains_address(STAKE_STATE_RECORD));
}

#[tokio::test]
async fn initialize_refuses_to_overwrite_pool_credentials() {
    let (_dir, keystore, _admin) = keystore_with_admin();
    keystore
        .store_keypair(STAKE_TOKEN_ACCOUNT_KEY, &Keypair::new())
        .unwrap();
    let config = test_config();
    let ledger = MockLedger::confirming();
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    assert_matches!(
        staking.initialize(&InitializeParams::default()).await,
        Err(StakingClientError::CredentialExists(name)) if name == STAKE_TOKEN_ACCOUNT_KEY
    );
    // Refused before anything reached the cluster.
    assert_eq!(ledger.sends(), 0);
}

#[tokio::test]
async fn workflows_require_the_admin_keypair() {
    let dir = TempDir::new().unwrap();
    let keystore = Keystore::open(dir.path()).unwrap();
    let config = test_config();
    let ledger = MockLedger::confirming();
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    assert_matches!(
        staking.initialize(&InitializeParams::default()).await,
        Err(StakingClientError::MissingCredential(name)) if name == ADMIN_KEY
    );
    assert_matches!(
        staking
            .update_apy(&UpdateApyParams {
                normal_staking_apy: 50.0,
                locked_staking_apy: 90.0,
            })
            .await,
        Err(StakingClientError::MissingCredential(_))
    );
    assert_eq!(ledger.sends(), 0);
}

#[tokio::test]
async fn update_apy_encodes_rates_with_one_fractional_digit() {
    let (_dir, keystore, admin) = keystore_with_admin();
    let config = test_config();
    let ledger = MockLedger::confirming();
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    let report = staking
        .update_apy(&UpdateApyParams {
            normal_staking_apy: 178.0,
            locked_staking_apy: 312.7,
        })
        .await
        .unwrap();

    let transactions = ledger.transactions();
    assert_eq!(transactions.len(), 1);
    let message = &transactions[0].message;
    assert_eq!(message.header.num_required_signatures, 1);
    assert_eq!(message.header.num_readonly_signed_accounts, 0);
    assert_eq!(message.header.num_readonly_unsigned_accounts, 1);
    assert_eq!(message.account_keys.len(), 3);

    let mut expected = vec![3];
    expected.extend_from_slice(&1780u64.to_le_bytes());
    expected.extend_from_slice(&3127u64.to_le_bytes());
    assert_eq!(message.instructions[0].data, expected);

    // No record yet, so the address came from re-derivation.
    let derived =
        pda::derive_stake_state_address(&admin.pubkey(), &config.stake_mint, &config.program_id)
            .unwrap();
    assert_eq!(report.stake_state, derived.address);
}

#[tokio::test]
async fn fetch_state_decodes_the_contract_account() {
    let (_dir, keystore, admin) = keystore_with_admin();
    let config = test_config();
    let derived =
        pda::derive_stake_state_address(&admin.pubkey(), &config.stake_mint, &config.program_id)
            .unwrap();
    keystore
        .record_address(STAKE_STATE_RECORD, &derived.address)
        .unwrap();

    let state = ContractState {
        is_initialized: true,
        admin_pubkey: admin.pubkey(),
        stake_token_mint: config.stake_mint,
        stake_token_account: Pubkey::new_unique(),
        minimum_stake_amount: 10_000_000_000,
        minimum_lock_duration: 604_800,
        normal_staking_apy: 26_390,
        locked_staking_apy: 60_570,
        early_withdrawal_fee: 100,
        fee_basis_points: 800,
        max_fee: 1_000_000_000_000_000,
        total_staked: 5_000_000_000,
        total_earned: 123_456_789,
    };
    let ledger = MockLedger::confirming().with_account(derived.address, state.pack().to_vec());
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    let fetched = staking.fetch_state().await.unwrap();
    assert_eq!(fetched, state);
}

#[tokio::test]
async fn fetch_state_reports_a_missing_pool() {
    let (_dir, keystore, _admin) = keystore_with_admin();
    let config = test_config();
    let ledger = MockLedger::confirming();
    let staking = StakingAdmin::with_submitter(&ledger, &keystore, &config, fast_submitter());

    assert_matches!(
        staking.fetch_state().await,
        Err(StakingClientError::InvalidAccountData(_))
    );
}
