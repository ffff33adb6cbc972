use crate::domain::ledger::Ledger;
use crate::domain::ports::LedgerStore;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory ledger store.
///
/// Holds the committed ledger behind `Arc<RwLock<Arc<Ledger>>>`: readers clone
/// the inner `Arc` and release the lock at once, a commit swaps the pointer.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    ledger: Arc<RwLock<Arc<Ledger>>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<Arc<Ledger>> {
        Ok(Arc::clone(&*self.ledger.read().await))
    }

    async fn commit(&self, ledger: Ledger) -> Result<()> {
        *self.ledger.write().await = Arc::new(ledger);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{AccountId, Asset};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_commit_replaces_snapshot() {
        let store = InMemoryLedgerStore::new();
        let empty = store.load().await.unwrap();

        let mut ledger = Ledger::new();
        let alice = AccountId::new("alice").unwrap();
        ledger.fund_account(alice.clone(), dec!(5)).unwrap();
        store.commit(ledger).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.get_balance(&alice, &Asset::Native).unwrap(), dec!(5));
        assert!(empty.trust.account(&alice).is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryLedgerStore::new();
        let other = store.clone();
        let mut ledger = Ledger::new();
        ledger
            .fund_account(AccountId::new("bob").unwrap(), dec!(1))
            .unwrap();
        store.commit(ledger).await.unwrap();
        assert_eq!(other.load().await.unwrap().trust.accounts().count(), 1);
    }
}
