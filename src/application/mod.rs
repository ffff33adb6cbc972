//! Application layer containing the ledger's business logic.
//!
//! [`engine::LedgerEngine`] is the async entry point. Underneath it the
//! [`executor::TransactionExecutor`] runs operation batches against a
//! working copy of the ledger, delegating offers to [`matcher`] and path
//! payments to [`path_payment`]; both take liquidity through [`exchange`].

pub mod engine;
pub mod exchange;
pub mod executor;
pub mod matcher;
pub mod path_payment;
pub mod pathfinding;
