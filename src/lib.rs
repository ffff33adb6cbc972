//! A deterministic single-ledger accounting and matching engine.
//!
//! Accounts hold assets on limit-bounded trustlines, trade them through a
//! price-time priority order book and pay each other directly or across
//! chains of markets. Every transaction applies all-or-nothing.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logging;
