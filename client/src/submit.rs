//! Transaction submission with bounded retries and expiry tracking.
//!
//! A submitted transaction is only valid while its recent blockhash is:
//! once the chain's block height passes the hash's last valid height the
//! transaction can never land, and the caller has to rebuild and re-sign.
//! [`TransactionSubmitter`] owns that lifecycle: it fetches a fresh
//! blockhash, signs once, resends the same signed bytes across transient
//! transport failures, and polls for confirmation until the outcome is
//! known or the blockhash lapses.

use {
    crate::error::StakingClientError,
    async_trait::async_trait,
    log::{debug, info, warn},
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_rpc_client_api::{
        client_error::Error as RpcClientError, config::RpcSendTransactionConfig,
    },
    solana_sdk::{
        hash::Hash,
        instruction::{Instruction, InstructionError},
        pubkey::Pubkey,
        signature::Signature,
        signers::Signers,
        transaction::{Transaction, TransactionError},
    },
    std::{fmt, time::Duration},
};

/// How many times a send is retried after a transient transport failure.
///
/// The first send plus the retries gives at most six sends per signed
/// transaction.
pub const SEND_RETRY_LIMIT: usize = 5;

/// Delay between confirmation polls.
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A single RPC failure, split by whether retrying can help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcFault {
    /// The transport or node misbehaved; the same request may succeed
    /// later.
    Transient(String),
    /// The cluster processed the transaction and rejected it; retrying
    /// the same bytes can only fail the same way.
    Rejected(TransactionError),
}

impl fmt::Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Transient(message) => write!(f, "transient rpc failure: {message}"),
            Self::Rejected(err) => write!(f, "transaction rejected: {err}"),
        }
    }
}

impl From<RpcFault> for StakingClientError {
    fn from(fault: RpcFault) -> Self {
        match fault {
            RpcFault::Transient(message) => Self::TransportFailure {
                attempts: 1,
                message,
            },
            RpcFault::Rejected(err) => Self::Rejected(err),
        }
    }
}

/// The ledger operations the workflows need, abstracted so tests can
/// run against an in-memory double instead of a cluster.
#[async_trait]
pub trait LedgerRpc {
    /// A recent blockhash and the last block height at which it is
    /// accepted.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), RpcFault>;

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, RpcFault>;

    /// Submits a signed transaction once, with node-side resends
    /// disabled so the client controls the retry schedule.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcFault>;

    /// The status of a submitted transaction: `None` until the cluster
    /// has processed it at the configured commitment, then the slot it
    /// landed in or the error that rejected it.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<u64, TransactionError>>, RpcFault>;

    async fn block_height(&self) -> Result<u64, RpcFault>;

    /// Raw account data, or `None` if the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcFault>;
}

fn classify(error: RpcClientError) -> RpcFault {
    match error.get_transaction_error() {
        Some(err) => RpcFault::Rejected(err),
        None => RpcFault::Transient(error.to_string()),
    }
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), RpcFault> {
        self.get_latest_blockhash_with_commitment(self.commitment())
            .await
            .map_err(classify)
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, RpcFault> {
        self.get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(classify)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcFault> {
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.commitment().commitment),
            max_retries: Some(0),
            ..RpcSendTransactionConfig::default()
        };
        self.send_transaction_with_config(transaction, config)
            .await
            .map_err(classify)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<u64, TransactionError>>, RpcFault> {
        let response = self
            .get_signature_statuses(&[*signature])
            .await
            .map_err(classify)?;
        let status = response.value.into_iter().next().flatten();
        Ok(status.and_then(|status| {
            let satisfied = status.satisfies_commitment(self.commitment());
            match status.err {
                Some(err) => Some(Err(err)),
                None if satisfied => Some(Ok(status.slot)),
                None => None,
            }
        }))
    }

    async fn block_height(&self) -> Result<u64, RpcFault> {
        self.get_block_height().await.map_err(classify)
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcFault> {
        let response = self
            .get_account_with_commitment(address, self.commitment())
            .await
            .map_err(classify)?;
        Ok(response.value.map(|account| account.data))
    }
}

/// The terminal outcome of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The transaction landed at the configured commitment.
    Confirmed { signature: Signature, slot: u64 },
    /// The cluster rejected the transaction.
    Rejected { err: TransactionError },
    /// The blockhash lapsed before the transaction was confirmed. The
    /// transaction may still have landed; the caller must check before
    /// re-submitting anything non-idempotent.
    Expired,
    /// Every send attempt failed in transport before the blockhash
    /// lapsed.
    TransientFailure { attempts: usize },
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// The program's custom error code, if that is what rejected the
    /// transaction.
    pub fn rejection_code(&self) -> Option<u32> {
        match self {
            Self::Rejected {
                err: TransactionError::InstructionError(_, InstructionError::Custom(code)),
            } => Some(*code),
            _ => None,
        }
    }

    /// Collapses the outcome into a `Result` for callers that treat
    /// anything but confirmation as an error.
    pub fn into_result(self) -> Result<(Signature, u64), StakingClientError> {
        match self {
            Self::Confirmed { signature, slot } => Ok((signature, slot)),
            Self::Rejected { err } => Err(StakingClientError::Rejected(err)),
            Self::Expired => Err(StakingClientError::BlockhashExpired),
            Self::TransientFailure { attempts } => Err(StakingClientError::TransportFailure {
                attempts,
                message: "send retry budget exhausted".to_string(),
            }),
        }
    }
}

/// Signs and submits transactions, driving each one to a terminal
/// [`Confirmation`].
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    send_retry_limit: usize,
    poll_interval: Duration,
}

impl Default for TransactionSubmitter {
    fn default() -> Self {
        Self {
            send_retry_limit: SEND_RETRY_LIMIT,
            poll_interval: CONFIRMATION_POLL_INTERVAL,
        }
    }
}

impl TransactionSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A submitter with a custom confirmation poll delay. Tests use a
    /// zero interval to poll the mock ledger without waiting.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Self::default()
        }
    }

    /// Builds, signs, and submits a transaction, then polls until it is
    /// confirmed, rejected, or its blockhash lapses.
    ///
    /// Transport failures during the send phase are retried up to the
    /// configured limit with the same signed transaction. A rejection is
    /// terminal immediately; resending rejected bytes cannot change the
    /// outcome.
    pub async fn submit<C, S>(
        &self,
        rpc: &C,
        instructions: &[Instruction],
        payer: &Pubkey,
        signers: &S,
    ) -> Result<Confirmation, StakingClientError>
    where
        C: LedgerRpc + Sync,
        S: Signers + ?Sized,
    {
        let (blockhash, last_valid_block_height) = rpc.latest_blockhash().await?;
        let mut transaction = Transaction::new_with_payer(instructions, Some(payer));
        transaction.try_sign(signers, blockhash)?;

        let signature = {
            let mut attempts = 0usize;
            loop {
                attempts = attempts.saturating_add(1);
                match rpc.send_transaction(&transaction).await {
                    Ok(signature) => break signature,
                    Err(RpcFault::Rejected(err)) => return Ok(Confirmation::Rejected { err }),
                    Err(fault @ RpcFault::Transient(_)) => {
                        warn!("send attempt {attempts} failed: {fault}");
                        if attempts > self.send_retry_limit {
                            return Ok(Confirmation::TransientFailure { attempts });
                        }
                        // Best effort: give up early if the blockhash
                        // already lapsed while we were failing to send.
                        if let Ok(height) = rpc.block_height().await {
                            if height > last_valid_block_height {
                                return Ok(Confirmation::Expired);
                            }
                        }
                    }
                }
            }
        };
        info!("transaction {signature} sent, awaiting confirmation");

        let mut consecutive_failures = 0usize;
        loop {
            let mut poll_fault = None;
            match rpc.signature_status(&signature).await {
                Ok(Some(Ok(slot))) => return Ok(Confirmation::Confirmed { signature, slot }),
                Ok(Some(Err(err))) => return Ok(Confirmation::Rejected { err }),
                Ok(None) => debug!("transaction {signature} not yet confirmed"),
                Err(fault) => {
                    warn!("status poll for {signature} failed: {fault}");
                    poll_fault = Some(fault);
                }
            }
            match rpc.block_height().await {
                Ok(height) if height > last_valid_block_height => {
                    return Ok(Confirmation::Expired)
                }
                Ok(_) => {}
                Err(fault) => {
                    warn!("block height poll for {signature} failed: {fault}");
                    poll_fault = Some(fault);
                }
            }
            // Both polls share one consecutive-failure budget, cleared
            // only by an iteration without a fault. Expiry detection
            // depends on height responses, so height faults count too.
            if let Some(fault) = poll_fault {
                consecutive_failures = consecutive_failures.saturating_add(1);
                if consecutive_failures > self.send_retry_limit {
                    return Err(StakingClientError::TransportFailure {
                        attempts: consecutive_failures,
                        message: fault.to_string(),
                    });
                }
            } else {
                consecutive_failures = 0;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock::MockLedger,
        assert_matches::assert_matches,
        solana_sdk::{signature::Keypair, signer::Signer},
    };

    fn noop_instruction() -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![0],
        }
    }

    fn fast_submitter() -> TransactionSubmitter {
        TransactionSubmitter::with_poll_interval(Duration::ZERO)
    }

    fn transient() -> RpcFault {
        RpcFault::Transient("connection reset".to_string())
    }

    #[tokio::test]
    async fn confirmed_transactions_report_signature_and_slot() {
        let ledger = MockLedger::confirming();
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        assert!(confirmation.is_confirmed());
        let (signature, slot) = confirmation.into_result().unwrap();
        assert_eq!(slot, 42);
        assert_eq!(ledger.sends(), 1);
        assert_eq!(ledger.transactions()[0].signatures[0], signature);
    }

    #[tokio::test]
    async fn transient_send_faults_are_retried_then_surfaced() {
        let ledger = MockLedger::confirming().with_send_faults(6);
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        // One initial send plus SEND_RETRY_LIMIT retries.
        assert_eq!(confirmation, Confirmation::TransientFailure { attempts: 6 });
        assert_eq!(ledger.sends(), 6);
        assert_matches!(
            confirmation.into_result(),
            Err(StakingClientError::TransportFailure { attempts: 6, .. })
        );
    }

    #[tokio::test]
    async fn sends_recover_once_the_transport_does() {
        let ledger = MockLedger::confirming().with_send_faults(2);
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        assert!(confirmation.is_confirmed());
        assert_eq!(ledger.sends(), 3);
    }

    #[tokio::test]
    async fn rejections_are_terminal_and_never_retried() {
        let err = TransactionError::InstructionError(1, InstructionError::Custom(2));
        let ledger = MockLedger::rejecting_on_send(err.clone());
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        assert_eq!(confirmation, Confirmation::Rejected { err });
        assert_eq!(confirmation.rejection_code(), Some(2));
        assert_eq!(ledger.sends(), 1);
    }

    #[tokio::test]
    async fn rejections_reported_by_status_polls_are_terminal() {
        let err = TransactionError::AlreadyProcessed;
        let ledger = MockLedger::rejecting_on_status(err.clone());
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        assert_eq!(confirmation, Confirmation::Rejected { err });
        assert_eq!(confirmation.rejection_code(), None);
    }

    #[tokio::test]
    async fn a_lapsed_blockhash_surfaces_as_expiry() {
        let ledger = MockLedger::expiring(600);
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        assert_eq!(confirmation, Confirmation::Expired);
        assert_matches!(
            confirmation.into_result(),
            Err(StakingClientError::BlockhashExpired)
        );
    }

    #[tokio::test]
    async fn persistent_height_poll_failures_are_bounded() {
        let ledger = MockLedger::pending().with_height_results(vec![Err(transient()); 8]);
        let payer = Keypair::new();

        let outcome = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await;

        // Status stays pending while every height query fails, so expiry
        // is undetectable and the failure budget must end the loop.
        assert_matches!(
            outcome,
            Err(StakingClientError::TransportFailure { attempts: 6, .. })
        );
        assert_eq!(ledger.sends(), 1);
    }

    #[tokio::test]
    async fn poll_failures_reset_after_a_clean_iteration() {
        let mut heights: Vec<Result<u64, RpcFault>> = vec![Err(transient()); 5];
        heights.push(Ok(100));
        heights.extend(vec![Err(transient()); 5]);
        let ledger = MockLedger::confirming()
            .with_status_sequence(vec![None; 11])
            .with_height_results(heights);
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        // Ten faults in total, but never more than five consecutive.
        assert!(confirmation.is_confirmed());
    }

    #[tokio::test]
    async fn scripted_statuses_replay_before_the_steady_state() {
        let ledger =
            MockLedger::confirming().with_status_sequence(vec![None, None, Some(Ok(7))]);
        let payer = Keypair::new();

        let confirmation = fast_submitter()
            .submit(&ledger, &[noop_instruction()], &payer.pubkey(), &[&payer])
            .await
            .unwrap();

        // Confirmed from the queued entry, not the steady slot 42.
        assert_eq!(
            confirmation,
            Confirmation::Confirmed {
                signature: ledger.transactions()[0].signatures[0],
                slot: 7,
            }
        );
    }
}
