use crate::application::executor::TransactionExecutor;
use crate::application::pathfinding::{PathFinder, PathQuote};
use crate::config::EngineConfig;
use crate::domain::asset::{AccountId, Asset};
use crate::domain::ledger::Ledger;
use crate::domain::offer::{Offer, OfferFilter};
use crate::domain::operation::{Transaction, TransactionResult};
use crate::domain::ports::LedgerStoreBox;
use crate::error::{EngineError, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The entry point for submitting transactions and querying the ledger.
///
/// `LedgerEngine` owns the storage backend. Writers are serialized through a
/// single lock and each transaction runs against a private working copy, so
/// a failed transaction never reaches the store. Readers work on the last
/// committed snapshot and never wait for a writer to finish.
pub struct LedgerEngine {
    store: LedgerStoreBox,
    executor: TransactionExecutor,
    finder: PathFinder,
    write_lock: Mutex<()>,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` over `store`.
    pub fn new(store: LedgerStoreBox, config: EngineConfig) -> Self {
        Self {
            store,
            executor: TransactionExecutor::new(&config),
            finder: PathFinder::new(&config),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates an account holding `native` units of the native asset.
    pub async fn fund_account(&self, id: AccountId, native: Decimal) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut working = Ledger::clone(&*self.store.load().await?);
        working
            .fund_account(id.clone(), native)
            .map_err(EngineError::Rejected)?;
        self.store.commit(working).await?;
        tracing::debug!(account = %id, %native, "account funded");
        Ok(())
    }

    /// Applies `tx` atomically and persists the outcome.
    ///
    /// On error the committed state is untouched; the error names the failing
    /// operation index where there is one.
    pub async fn submit(&self, tx: Transaction) -> Result<TransactionResult> {
        let _guard = self.write_lock.lock().await;
        let working = Ledger::clone(&*self.store.load().await?);

        match self.executor.apply_owned(working, &tx) {
            Ok((working, result)) => {
                self.store.commit(working).await?;
                tracing::info!(
                    source = %tx.source,
                    operations = result.results.len(),
                    sequence = result.sequence,
                    memo = tx.memo.as_deref().unwrap_or(""),
                    "transaction committed"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(
                    source = %tx.source,
                    failed_index = ?e.failed_index(),
                    error = %e,
                    "transaction rejected"
                );
                Err(e)
            }
        }
    }

    /// The last committed state.
    pub async fn snapshot(&self) -> Result<Arc<Ledger>> {
        self.store.load().await
    }

    pub async fn get_balance(&self, account: &AccountId, asset: &Asset) -> Result<Decimal> {
        self.snapshot()
            .await?
            .get_balance(account, asset)
            .map_err(EngineError::Query)
    }

    pub async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<Offer>> {
        Ok(self.snapshot().await?.list_offers(filter))
    }

    pub async fn find_paths_strict_send(
        &self,
        source_asset: &Asset,
        source_amount: Decimal,
        dest_asset: &Asset,
    ) -> Result<Vec<PathQuote>> {
        let ledger = self.snapshot().await?;
        self.finder
            .strict_send(&ledger, source_asset, source_amount, dest_asset)
            .map_err(EngineError::Query)
    }

    pub async fn find_paths_strict_receive(
        &self,
        source_asset: &Asset,
        dest_asset: &Asset,
        dest_amount: Decimal,
    ) -> Result<Vec<PathQuote>> {
        let ledger = self.snapshot().await?;
        self.finder
            .strict_receive(&ledger, source_asset, dest_asset, dest_amount)
            .map_err(EngineError::Query)
    }
}
