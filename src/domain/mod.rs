//! Ledger state and its invariants: assets, amounts, trustlines, offers and
//! the operations that act on them. Nothing here performs I/O.

pub mod amount;
pub mod asset;
pub mod ledger;
pub mod offer;
pub mod operation;
pub mod ports;
pub mod trustline;
