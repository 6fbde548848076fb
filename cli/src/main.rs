//! Command-line admin utility for the SPL staking program.
//!
//! Wraps the workflows in `spl-staking-client`: one-time pool
//! initialization, APY updates, and state inspection. Credentials live
//! in a local keystore directory; the target deployment is described
//! entirely by command-line arguments plus the standard Solana CLI
//! config file for the RPC URL fallback.

use {
    clap::{
        crate_version, value_t_or_exit, App, AppSettings, Arg, ArgMatches, SubCommand,
    },
    log::debug,
    serde::{Deserialize, Serialize},
    solana_clap_utils::{
        input_parsers::pubkey_of,
        input_validators::{is_parsable, is_url_or_moniker, is_valid_pubkey},
    },
    solana_cli_output::OutputFormat,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_sdk::commitment_config::CommitmentConfig,
    spl_staking_client::{
        config::{Cluster, StakingConfig, TokenProgram},
        keystore::Keystore,
        submit::LedgerRpc,
        units::{ui_rate, ui_token_amount},
        workflow::{InitializeParams, StakingAdmin, UpdateApyParams},
    },
    std::{fmt, process::exit, str::FromStr},
};

type ProcessResult = Result<String, Box<dyn std::error::Error>>;

// ── CLI command definitions ─────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum StakingCliCommand {
    Initialize(InitializeParams),
    UpdateApy(UpdateApyParams),
    Show,
}

// ── Output structs ──────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CliInitializeReport {
    signature: String,
    slot: u64,
    stake_state: String,
    stake_state_bump: u8,
    stake_token_account: String,
}

impl fmt::Display for CliInitializeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stake pool initialized.")?;
        writeln!(f, "  Signature:           {}", self.signature)?;
        writeln!(f, "  Slot:                {}", self.slot)?;
        writeln!(f, "  Stake State:         {}", self.stake_state)?;
        writeln!(f, "  Stake State Bump:    {}", self.stake_state_bump)?;
        writeln!(f, "  Pool Token Account:  {}", self.stake_token_account)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CliUpdateApyReport {
    signature: String,
    slot: u64,
    stake_state: String,
    normal_staking_apy: f64,
    locked_staking_apy: f64,
}

impl fmt::Display for CliUpdateApyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "APY updated.")?;
        writeln!(f, "  Signature:    {}", self.signature)?;
        writeln!(f, "  Slot:         {}", self.slot)?;
        writeln!(f, "  Stake State:  {}", self.stake_state)?;
        writeln!(f, "  Normal APY:   {}%", self.normal_staking_apy)?;
        writeln!(f, "  Locked APY:   {}%", self.locked_staking_apy)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CliStakePoolInfo {
    stake_state: String,
    initialized: bool,
    admin: String,
    stake_mint: String,
    stake_token_account: String,
    minimum_stake_tokens: f64,
    minimum_lock_duration_secs: u64,
    normal_staking_apy: f64,
    locked_staking_apy: f64,
    early_withdrawal_fee: f64,
    fee_basis_points: u64,
    max_fee_tokens: f64,
    total_staked_tokens: f64,
    total_earned_tokens: f64,
}

impl fmt::Display for CliStakePoolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stake Pool: {}", self.stake_state)?;
        writeln!(f, "  Initialized:         {}", self.initialized)?;
        writeln!(f, "  Admin:               {}", self.admin)?;
        writeln!(f, "  Stake Mint:          {}", self.stake_mint)?;
        writeln!(f, "  Pool Token Account:  {}", self.stake_token_account)?;
        writeln!(f, "  Minimum Stake:       {} tokens", self.minimum_stake_tokens)?;
        writeln!(f, "  Minimum Lock:        {} s", self.minimum_lock_duration_secs)?;
        writeln!(f, "  Normal APY:          {}%", self.normal_staking_apy)?;
        writeln!(f, "  Locked APY:          {}%", self.locked_staking_apy)?;
        writeln!(f, "  Early Withdrawal:    {}%", self.early_withdrawal_fee)?;
        writeln!(f, "  Transfer Fee:        {} bps", self.fee_basis_points)?;
        writeln!(f, "  Max Fee:             {} tokens", self.max_fee_tokens)?;
        writeln!(f, "  Total Staked:        {} tokens", self.total_staked_tokens)?;
        writeln!(f, "  Total Earned:        {} tokens", self.total_earned_tokens)?;
        Ok(())
    }
}

fn format_output<T: Serialize + fmt::Display>(
    output_format: &OutputFormat,
    output: &T,
) -> ProcessResult {
    match output_format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(output)?),
        _ => Ok(output.to_string()),
    }
}

// ── Subcommand definition (clap) ────────────────────────────────────

trait StakingSubCommands {
    fn staking_subcommands(self) -> Self;
}

impl StakingSubCommands for App<'_, '_> {
    fn staking_subcommands(self) -> Self {
        self.subcommand(
            SubCommand::with_name("initialize")
                .about("Create and fund the stake pool (one-time)")
                .arg(
                    Arg::with_name("minimum_stake")
                        .long("minimum-stake")
                        .value_name("TOKENS")
                        .takes_value(true)
                        .default_value("10")
                        .validator(is_parsable::<f64>)
                        .help("Minimum stake, in whole tokens"),
                )
                .arg(
                    Arg::with_name("minimum_lock_duration")
                        .long("minimum-lock-duration")
                        .value_name("SECONDS")
                        .takes_value(true)
                        .default_value("604800")
                        .validator(is_parsable::<u64>)
                        .help("Minimum lock duration for locked staking, in seconds"),
                )
                .arg(
                    Arg::with_name("normal_apy")
                        .long("normal-apy")
                        .value_name("PERCENT")
                        .takes_value(true)
                        .default_value("2639")
                        .validator(is_parsable::<f64>)
                        .help("Yearly rate for normal staking, in percent"),
                )
                .arg(
                    Arg::with_name("locked_apy")
                        .long("locked-apy")
                        .value_name("PERCENT")
                        .takes_value(true)
                        .default_value("6057")
                        .validator(is_parsable::<f64>)
                        .help("Yearly rate for locked staking, in percent"),
                )
                .arg(
                    Arg::with_name("early_withdrawal_fee")
                        .long("early-withdrawal-fee")
                        .value_name("PERCENT")
                        .takes_value(true)
                        .default_value("10")
                        .validator(is_parsable::<f64>)
                        .help("Fee for withdrawing a locked stake early, in percent"),
                )
                .arg(
                    Arg::with_name("fee_basis_points")
                        .long("fee-basis-points")
                        .value_name("BPS")
                        .takes_value(true)
                        .default_value("800")
                        .validator(is_parsable::<u64>)
                        .help("Transfer fee of the stake mint, in basis points"),
                )
                .arg(
                    Arg::with_name("max_fee")
                        .long("max-fee")
                        .value_name("TOKENS")
                        .takes_value(true)
                        .default_value("1000000")
                        .validator(is_parsable::<f64>)
                        .help("Cap on the transfer fee, in whole tokens"),
                ),
        )
        .subcommand(
            SubCommand::with_name("update-apy")
                .about("Replace both APY rates in the contract state")
                .arg(
                    Arg::with_name("normal_apy")
                        .index(1)
                        .value_name("NORMAL_PERCENT")
                        .takes_value(true)
                        .required(true)
                        .validator(is_parsable::<f64>)
                        .help("New yearly rate for normal staking, in percent"),
                )
                .arg(
                    Arg::with_name("locked_apy")
                        .index(2)
                        .value_name("LOCKED_PERCENT")
                        .takes_value(true)
                        .required(true)
                        .validator(is_parsable::<f64>)
                        .help("New yearly rate for locked staking, in percent"),
                ),
        )
        .subcommand(
            SubCommand::with_name("show").about("Display the pool's contract state"),
        )
    }
}

fn staking_app<'a, 'b>() -> App<'a, 'b> {
    App::new("spl-staking")
        .about("Admin utility for the SPL staking program")
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config_file")
                .short("C")
                .long("config")
                .value_name("PATH")
                .takes_value(true)
                .global(true)
                .help("Configuration file to use"),
        )
        .arg(
            Arg::with_name("json_rpc_url")
                .short("u")
                .long("url")
                .value_name("URL_OR_MONIKER")
                .takes_value(true)
                .global(true)
                .validator(is_url_or_moniker)
                .help(
                    "URL for Solana's JSON RPC or moniker (or their first letter): \
                     [mainnet-beta, testnet, devnet, localhost]",
                ),
        )
        .arg(
            Arg::with_name("program_id")
                .long("program-id")
                .value_name("ADDRESS")
                .takes_value(true)
                .required(true)
                .validator(is_valid_pubkey)
                .help("Address of the deployed staking program"),
        )
        .arg(
            Arg::with_name("mint")
                .long("mint")
                .value_name("ADDRESS")
                .takes_value(true)
                .required(true)
                .validator(is_valid_pubkey)
                .help("Mint of the token accepted for staking"),
        )
        .arg(
            Arg::with_name("keystore")
                .long("keystore")
                .value_name("DIR")
                .takes_value(true)
                .default_value("keys")
                .help("Directory holding the admin credentials"),
        )
        .arg(
            Arg::with_name("token_program")
                .long("token-program")
                .value_name("FLAVOR")
                .takes_value(true)
                .possible_values(&["token", "token-2022"])
                .default_value("token-2022")
                .help("Token program that owns the stake mint"),
        )
        .arg(
            Arg::with_name("decimals")
                .long("decimals")
                .value_name("DECIMALS")
                .takes_value(true)
                .default_value("9")
                .validator(is_parsable::<u8>)
                .help("Decimals of the stake mint"),
        )
        .arg(
            Arg::with_name("commitment")
                .long("commitment")
                .value_name("LEVEL")
                .takes_value(true)
                .possible_values(&["processed", "confirmed", "finalized"])
                .default_value("confirmed")
                .help("Commitment level for submissions and queries"),
        )
        .arg(
            Arg::with_name("output_format")
                .long("output")
                .value_name("FORMAT")
                .takes_value(true)
                .global(true)
                .possible_values(&["json", "json-compact"])
                .help("Return information in specified output format"),
        )
        .staking_subcommands()
}

// ── Argument parsing ────────────────────────────────────────────────

fn parse_staking_command(matches: &ArgMatches<'_>) -> StakingCliCommand {
    match matches.subcommand() {
        ("initialize", Some(matches)) => StakingCliCommand::Initialize(InitializeParams {
            minimum_stake_tokens: value_t_or_exit!(matches, "minimum_stake", f64),
            minimum_lock_duration_secs: value_t_or_exit!(matches, "minimum_lock_duration", u64),
            normal_staking_apy: value_t_or_exit!(matches, "normal_apy", f64),
            locked_staking_apy: value_t_or_exit!(matches, "locked_apy", f64),
            early_withdrawal_fee: value_t_or_exit!(matches, "early_withdrawal_fee", f64),
            fee_basis_points: value_t_or_exit!(matches, "fee_basis_points", u64),
            max_fee_tokens: value_t_or_exit!(matches, "max_fee", f64),
        }),
        ("update-apy", Some(matches)) => StakingCliCommand::UpdateApy(UpdateApyParams {
            normal_staking_apy: value_t_or_exit!(matches, "normal_apy", f64),
            locked_staking_apy: value_t_or_exit!(matches, "locked_apy", f64),
        }),
        ("show", Some(_)) => StakingCliCommand::Show,
        _ => unreachable!(),
    }
}

fn staking_config_from_matches(
    matches: &ArgMatches<'_>,
) -> Result<(StakingConfig, OutputFormat), Box<dyn std::error::Error>> {
    let cli_config = if let Some(config_file) = matches.value_of("config_file") {
        solana_cli_config::Config::load(config_file).unwrap_or_default()
    } else if let Some(config_file) = &*solana_cli_config::CONFIG_FILE {
        solana_cli_config::Config::load(config_file).unwrap_or_default()
    } else {
        solana_cli_config::Config::default()
    };
    let cluster = match matches.value_of("json_rpc_url") {
        Some(value) => Cluster::from_str(value)?,
        None => Cluster::Custom(cli_config.json_rpc_url),
    };

    let program_id = pubkey_of(matches, "program_id").unwrap();
    let stake_mint = pubkey_of(matches, "mint").unwrap();
    let token_program = TokenProgram::from_str(matches.value_of("token_program").unwrap())?;
    let token_decimals = value_t_or_exit!(matches, "decimals", u8);
    let commitment = CommitmentConfig::from_str(matches.value_of("commitment").unwrap())?;

    let output_format = matches
        .value_of("output_format")
        .map(|value| match value {
            "json" => OutputFormat::Json,
            "json-compact" => OutputFormat::JsonCompact,
            _ => unreachable!(),
        })
        .unwrap_or(OutputFormat::Display);

    Ok((
        StakingConfig {
            program_id,
            stake_mint,
            cluster,
            token_program,
            token_decimals,
            commitment,
        },
        output_format,
    ))
}

// ── Command processing ──────────────────────────────────────────────

async fn process_initialize<C: LedgerRpc + Sync>(
    staking: &StakingAdmin<'_, C>,
    params: &InitializeParams,
    output_format: &OutputFormat,
) -> ProcessResult {
    let report = staking.initialize(params).await?;
    let output = CliInitializeReport {
        signature: report.signature.to_string(),
        slot: report.slot,
        stake_state: report.stake_state.to_string(),
        stake_state_bump: report.stake_state_bump,
        stake_token_account: report.stake_token_account.to_string(),
    };
    format_output(output_format, &output)
}

async fn process_update_apy<C: LedgerRpc + Sync>(
    staking: &StakingAdmin<'_, C>,
    params: &UpdateApyParams,
    output_format: &OutputFormat,
) -> ProcessResult {
    let report = staking.update_apy(params).await?;
    let output = CliUpdateApyReport {
        signature: report.signature.to_string(),
        slot: report.slot,
        stake_state: report.stake_state.to_string(),
        normal_staking_apy: params.normal_staking_apy,
        locked_staking_apy: params.locked_staking_apy,
    };
    format_output(output_format, &output)
}

async fn process_show<C: LedgerRpc + Sync>(
    staking: &StakingAdmin<'_, C>,
    config: &StakingConfig,
    output_format: &OutputFormat,
) -> ProcessResult {
    let state = staking.fetch_state().await?;
    let output = CliStakePoolInfo {
        stake_state: staking.stake_state_address()?.to_string(),
        initialized: state.is_initialized,
        admin: state.admin_pubkey.to_string(),
        stake_mint: state.stake_token_mint.to_string(),
        stake_token_account: state.stake_token_account.to_string(),
        minimum_stake_tokens: ui_token_amount(state.minimum_stake_amount, config.token_decimals),
        minimum_lock_duration_secs: state.minimum_lock_duration,
        normal_staking_apy: ui_rate(state.normal_staking_apy),
        locked_staking_apy: ui_rate(state.locked_staking_apy),
        early_withdrawal_fee: ui_rate(state.early_withdrawal_fee),
        fee_basis_points: state.fee_basis_points,
        max_fee_tokens: ui_token_amount(state.max_fee, config.token_decimals),
        total_staked_tokens: ui_token_amount(state.total_staked, config.token_decimals),
        total_earned_tokens: ui_token_amount(state.total_earned, config.token_decimals),
    };
    format_output(output_format, &output)
}

async fn run(matches: &ArgMatches<'_>) -> ProcessResult {
    let command = parse_staking_command(matches);
    let (config, output_format) = staking_config_from_matches(matches)?;
    let keystore = Keystore::open(matches.value_of("keystore").unwrap())?;
    debug!(
        "targeting {} for program {} with mint {}",
        config.cluster, config.program_id, config.stake_mint
    );

    let rpc_client = RpcClient::new_with_commitment(config.cluster.rpc_url(), config.commitment);
    let staking = StakingAdmin::new(&rpc_client, &keystore, &config);

    match command {
        StakingCliCommand::Initialize(params) => {
            process_initialize(&staking, &params, &output_format).await
        }
        StakingCliCommand::UpdateApy(params) => {
            process_update_apy(&staking, &params, &output_format).await
        }
        StakingCliCommand::Show => process_show(&staking, &config, &output_format).await,
    }
}

#[tokio::main]
async fn main() {
    solana_logger::setup_with_default("solana=info");
    let matches = staking_app().get_matches();
    match run(&matches).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            exit(1);
        }
    }
}
