//! An in-memory [`LedgerRpc`] double for exercising submission and
//! workflow logic without a cluster.
//!
//! The mock records every send and replays scripted send faults, status
//! responses, and block-height results, so tests can drive the submitter
//! through retry, rejection, and expiry paths deterministically.

use {
    crate::submit::{LedgerRpc, RpcFault},
    async_trait::async_trait,
    solana_sdk::{
        hash::Hash,
        pubkey::Pubkey,
        signature::Signature,
        transaction::{Transaction, TransactionError},
    },
    std::{
        collections::{HashMap, VecDeque},
        sync::{
            atomic::{AtomicU64, Ordering},
            Mutex,
        },
    },
};

type ScriptedStatus = Option<Result<u64, TransactionError>>;

pub struct MockLedger {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
    pub minimum_balance: u64,
    send_faults: Mutex<VecDeque<RpcFault>>,
    reject_sends: Option<TransactionError>,
    statuses: Mutex<VecDeque<ScriptedStatus>>,
    steady_status: ScriptedStatus,
    block_height: AtomicU64,
    height_step: u64,
    heights: Mutex<VecDeque<Result<u64, RpcFault>>>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    sent: Mutex<Vec<Transaction>>,
}

impl MockLedger {
    /// A ledger that accepts the first send and confirms it in slot 42.
    pub fn confirming() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            last_valid_block_height: 1_000,
            minimum_balance: 2_039_280,
            send_faults: Mutex::new(VecDeque::new()),
            reject_sends: None,
            statuses: Mutex::new(VecDeque::new()),
            steady_status: Some(Ok(42)),
            block_height: AtomicU64::new(100),
            height_step: 0,
            heights: Mutex::new(VecDeque::new()),
            accounts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A ledger that accepts sends but never reports a status, leaving
    /// the transaction pending.
    pub fn pending() -> Self {
        Self {
            steady_status: None,
            ..Self::confirming()
        }
    }

    /// A ledger whose block height advances by `step` per query and
    /// never confirms anything, so the blockhash lapses first.
    pub fn expiring(step: u64) -> Self {
        Self {
            height_step: step,
            ..Self::pending()
        }
    }

    /// A ledger that rejects every send with the given error.
    pub fn rejecting_on_send(err: TransactionError) -> Self {
        Self {
            reject_sends: Some(err),
            ..Self::confirming()
        }
    }

    /// A ledger that accepts sends but reports the transaction failed.
    pub fn rejecting_on_status(err: TransactionError) -> Self {
        Self {
            steady_status: Some(Err(err)),
            ..Self::confirming()
        }
    }

    /// Queues `count` transient send failures ahead of any success.
    pub fn with_send_faults(self, count: usize) -> Self {
        {
            let mut faults = self.send_faults.lock().unwrap();
            for attempt in 0..count {
                faults.push_back(RpcFault::Transient(format!("connection reset {attempt}")));
            }
        }
        self
    }

    /// Queues explicit status responses ahead of the steady state.
    pub fn with_status_sequence(self, sequence: Vec<ScriptedStatus>) -> Self {
        self.statuses.lock().unwrap().extend(sequence);
        self
    }

    /// Queues explicit block-height responses ahead of the stepped
    /// counter.
    pub fn with_height_results(self, sequence: Vec<Result<u64, RpcFault>>) -> Self {
        self.heights.lock().unwrap().extend(sequence);
        self
    }

    /// Seeds an account with raw data.
    pub fn with_account(self, address: Pubkey, data: Vec<u8>) -> Self {
        self.accounts.lock().unwrap().insert(address, data);
        self
    }

    /// Number of send attempts observed.
    pub fn sends(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Every transaction passed to `send_transaction`, in order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), RpcFault> {
        Ok((self.blockhash, self.last_valid_block_height))
    }

    async fn minimum_balance_for_rent_exemption(&self, _data_len: usize) -> Result<u64, RpcFault> {
        Ok(self.minimum_balance)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcFault> {
        self.sent.lock().unwrap().push(transaction.clone());
        if let Some(err) = &self.reject_sends {
            return Err(RpcFault::Rejected(err.clone()));
        }
        if let Some(fault) = self.send_faults.lock().unwrap().pop_front() {
            return Err(fault);
        }
        Ok(transaction.signatures[0])
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<ScriptedStatus, RpcFault> {
        if let Some(status) = self.statuses.lock().unwrap().pop_front() {
            return Ok(status);
        }
        Ok(self.steady_status.clone())
    }

    async fn block_height(&self) -> Result<u64, RpcFault> {
        if let Some(result) = self.heights.lock().unwrap().pop_front() {
            return result;
        }
        Ok(self
            .block_height
            .fetch_add(self.height_step, Ordering::Relaxed))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcFault> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }
}
