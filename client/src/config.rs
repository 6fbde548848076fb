//! Client configuration: target cluster, token program flavor, and the
//! parameters shared by every workflow.

use {
    crate::error::StakingClientError,
    serde::{Deserialize, Serialize},
    solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey},
    spl_token_2022::extension::ExtensionType,
    std::{fmt, str::FromStr},
};

/// The cluster the client submits transactions to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cluster {
    MainnetBeta,
    Devnet,
    Testnet,
    Localnet,
    /// A custom RPC endpoint, given as a full URL.
    Custom(String),
}

impl Cluster {
    /// The JSON RPC endpoint for this cluster.
    pub fn rpc_url(&self) -> String {
        match self {
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com".to_string(),
            Self::Devnet => "https://api.devnet.solana.com".to_string(),
            Self::Testnet => "https://api.testnet.solana.com".to_string(),
            Self::Localnet => "http://localhost:8899".to_string(),
            Self::Custom(url) => url.clone(),
        }
    }
}

impl FromStr for Cluster {
    type Err = StakingClientError;

    /// Accepts the standard single-letter monikers as well as full URLs.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "m" | "mainnet-beta" => Ok(Self::MainnetBeta),
            "d" | "devnet" => Ok(Self::Devnet),
            "t" | "testnet" => Ok(Self::Testnet),
            "l" | "localhost" => Ok(Self::Localnet),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Self::Custom(url.to_string()))
            }
            other => Err(StakingClientError::Config(format!(
                "unrecognized cluster moniker or URL: {other}"
            ))),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MainnetBeta => write!(f, "mainnet-beta"),
            Self::Devnet => write!(f, "devnet"),
            Self::Testnet => write!(f, "testnet"),
            Self::Localnet => write!(f, "localhost"),
            Self::Custom(url) => write!(f, "{url}"),
        }
    }
}

/// Which token program owns the stake mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenProgram {
    SplToken,
    SplToken2022,
}

impl TokenProgram {
    /// The on-chain program id.
    pub fn id(self) -> Pubkey {
        match self {
            Self::SplToken => spl_token::id(),
            Self::SplToken2022 => spl_token_2022::id(),
        }
    }

    /// Space to allocate for the pool token account.
    ///
    /// Token-2022 accounts carry the `TransferFeeAmount` extension so
    /// they can hold mints with a transfer fee config; legacy accounts
    /// are the fixed base size.
    pub fn stake_account_space(self) -> Result<usize, StakingClientError> {
        let extensions: &[ExtensionType] = match self {
            Self::SplToken => &[],
            Self::SplToken2022 => &[ExtensionType::TransferFeeAmount],
        };
        ExtensionType::try_calculate_account_len::<spl_token_2022::state::Account>(extensions)
            .map_err(|err| {
                StakingClientError::Config(format!("token account size calculation failed: {err}"))
            })
    }
}

impl FromStr for TokenProgram {
    type Err = StakingClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "token" => Ok(Self::SplToken),
            "token-2022" => Ok(Self::SplToken2022),
            other => Err(StakingClientError::Config(format!(
                "unrecognized token program: {other}"
            ))),
        }
    }
}

impl fmt::Display for TokenProgram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SplToken => write!(f, "token"),
            Self::SplToken2022 => write!(f, "token-2022"),
        }
    }
}

/// Everything the workflows need to know about the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// The deployed staking program.
    pub program_id: Pubkey,
    /// Mint of the token accepted for staking.
    pub stake_mint: Pubkey,
    pub cluster: Cluster,
    pub token_program: TokenProgram,
    /// Decimals of the stake mint, used to scale human-readable amounts.
    pub token_decimals: u8,
    pub commitment: CommitmentConfig,
}

impl StakingConfig {
    /// A config with the defaults the deployment scripts assume: the
    /// token-2022 program, nine decimals, and confirmed commitment.
    pub fn new(program_id: Pubkey, stake_mint: Pubkey, cluster: Cluster) -> Self {
        Self {
            program_id,
            stake_mint,
            cluster,
            token_program: TokenProgram::SplToken2022,
            token_decimals: 9,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}
