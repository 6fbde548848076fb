//! Client library for administering the SPL staking program.
//!
//! The program itself runs on chain; this crate is the admin's side of
//! the wire. It owns four concerns:
//!
//! - **Encoding**: the instruction wire format ([`instruction`]), the
//!   contract state layout ([`state`]), and the scaling between
//!   human-readable values and on-chain integers ([`units`]).
//! - **Derivation**: the program-derived addresses both sides agree on
//!   ([`pda`]).
//! - **Submission**: signing, bounded resends, and confirmation
//!   tracking against a cluster ([`submit`]).
//! - **Workflows**: the end-to-end admin operations ([`workflow`]),
//!   backed by a write-once credential store ([`keystore`]).
//!
//! ## Workflows
//!
//! | Operation    | Description                                           |
//! |--------------|-------------------------------------------------------|
//! | `initialize` | Create and fund the pool in one atomic transaction    |
//! | `update_apy` | Replace both APY rates in the contract state          |
//! | `fetch_state`| Read and decode the pool's contract state             |
//!
//! All RPC access goes through the [`submit::LedgerRpc`] trait, so the
//! workflows run unchanged against the real
//! [`RpcClient`](solana_rpc_client::nonblocking::rpc_client::RpcClient)
//! or the in-memory [`mock::MockLedger`].

pub mod config;
pub mod error;
pub mod instruction;
pub mod keystore;
pub mod mock;
pub mod pda;
pub mod state;
pub mod submit;
pub mod units;
pub mod workflow;
