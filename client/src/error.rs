//! Error type for the staking client.

use {
    solana_sdk::{pubkey::Pubkey, signer::SignerError, transaction::TransactionError},
    thiserror::Error,
};

/// Errors produced by the staking client.
///
/// Credential and configuration problems are fatal and reported before any
/// network traffic. Submission failures distinguish transport trouble (safe
/// to rerun as-is) from on-chain rejection (carries the program's error,
/// never retried) and from an expired blockhash (rebuild before rerunning).
#[derive(Debug, Error)]
pub enum StakingClientError {
    /// A required signing key or address record is absent from the keystore.
    #[error("required credential '{0}' was not found in the keystore")]
    MissingCredential(String),

    /// The keystore already holds an entry under this name. Entries are
    /// never overwritten.
    #[error("credential '{0}' already exists; refusing to overwrite")]
    CredentialExists(String),

    /// The keystore entry exists but could not be decoded.
    #[error("credential '{name}' is unreadable: {reason}")]
    CorruptCredential { name: String, reason: String },

    /// Invalid or inconsistent deployment configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No bump produced an off-curve address for the configured seeds.
    /// Indicates corrupted inputs, not a transient fault.
    #[error("no valid program-derived address under program {program_id}")]
    AddressDerivation { program_id: Pubkey },

    /// A human-scale value fell outside the u64 range after scaling.
    #[error("{label} value {value} cannot be represented on the wire")]
    ValueOutOfRange { label: &'static str, value: f64 },

    #[error("invalid instruction data: {0}")]
    InvalidInstructionData(String),

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("transaction signing failed: {0}")]
    Signing(#[from] SignerError),

    /// Transport-level failure that outlived the retry budget.
    #[error("rpc transport failure after {attempts} attempt(s): {message}")]
    TransportFailure { attempts: usize, message: String },

    /// The cluster evaluated the transaction and turned it down.
    #[error("transaction rejected on chain: {0}")]
    Rejected(TransactionError),

    /// The blockhash's validity window lapsed before confirmation was
    /// observed. The transaction may still have landed late; check the
    /// chain before rebuilding with a fresh blockhash.
    #[error("blockhash expired before the transaction was confirmed")]
    BlockhashExpired,
}
