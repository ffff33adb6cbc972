use super::ledger::Ledger;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Holds the committed ledger state.
///
/// `load` hands out an immutable snapshot; `commit` replaces it wholesale.
/// Callers serialize commits themselves.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> Result<Arc<Ledger>>;
    async fn commit(&self, ledger: Ledger) -> Result<()>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type LedgerStoreFactory = Box<dyn Fn() -> LedgerStoreBox + Send + Sync>;
