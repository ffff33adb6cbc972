use crate::domain::ledger::{Ledger, LedgerSnapshot};
use crate::domain::offer::{Offer, OfferId};
use crate::domain::ports::LedgerStore;
use crate::domain::trustline::{Account, TrustLine};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Column Family for account records.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for trustlines.
pub const CF_TRUSTLINES: &str = "trustlines";
/// Column Family for resting offers.
pub const CF_OFFERS: &str = "offers";
/// Column Family for ledger-wide counters.
pub const CF_META: &str = "meta";

const NEXT_OFFER_ID_KEY: &[u8] = b"next_offer_id";

/// A persistent ledger store backed by RocksDB.
///
/// Every commit rewrites the ledger through a single `WriteBatch`, so the
/// on-disk state always corresponds to a whole number of transactions. The
/// last committed ledger is also cached in memory to serve readers.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    current: Arc<RwLock<Arc<Ledger>>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path` and loads its ledger.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ACCOUNTS, CF_TRUSTLINES, CF_OFFERS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        let ledger = read_ledger(&db)?;
        tracing::debug!(
            accounts = ledger.trust.accounts().count(),
            offers = ledger.offers.len(),
            "ledger restored from disk"
        );
        Ok(Self {
            db: Arc::new(db),
            current: Arc::new(RwLock::new(Arc::new(ledger))),
        })
    }
}

fn internal(message: String) -> EngineError {
    EngineError::InternalError(Box::new(std::io::Error::other(message)))
}

fn handle<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| internal(format!("{name} column family not found")))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| internal(format!("Serialization error: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| internal(format!("Deserialization error: {e}")))
}

fn read_all<T: DeserializeOwned>(db: &DB, name: &str) -> Result<Vec<T>> {
    let cf = handle(db, name)?;
    db.iterator_cf(cf, IteratorMode::Start)
        .map(|item| {
            let (_key, value) =
                item.map_err(|e| internal(format!("RocksDB iteration error: {e}")))?;
            decode(&value)
        })
        .collect()
}

fn read_ledger(db: &DB) -> Result<Ledger> {
    let accounts: Vec<Account> = read_all(db, CF_ACCOUNTS)?;
    let trustlines: Vec<TrustLine> = read_all(db, CF_TRUSTLINES)?;
    let offers: Vec<Offer> = read_all(db, CF_OFFERS)?;
    let next_offer_id: OfferId = match db.get_cf(handle(db, CF_META)?, NEXT_OFFER_ID_KEY)? {
        Some(bytes) => decode(&bytes)?,
        None => 1,
    };
    Ok(Ledger::from(LedgerSnapshot {
        accounts,
        trustlines,
        offers,
        next_offer_id,
    }))
}

fn clear(db: &DB, batch: &mut WriteBatch, name: &str) -> Result<()> {
    let cf = handle(db, name)?;
    for item in db.iterator_cf(cf, IteratorMode::Start) {
        let (key, _value) = item.map_err(|e| internal(format!("RocksDB iteration error: {e}")))?;
        batch.delete_cf(cf, key);
    }
    Ok(())
}

fn trustline_key(line: &TrustLine) -> Vec<u8> {
    format!("{}/{}", line.account, line.asset).into_bytes()
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn load(&self) -> Result<Arc<Ledger>> {
        Ok(Arc::clone(&*self.current.read().await))
    }

    async fn commit(&self, ledger: Ledger) -> Result<()> {
        let db = &self.db;
        let snapshot = LedgerSnapshot::from(&ledger);
        let mut batch = WriteBatch::default();
        for name in [CF_ACCOUNTS, CF_TRUSTLINES, CF_OFFERS] {
            clear(db, &mut batch, name)?;
        }

        let accounts = handle(db, CF_ACCOUNTS)?;
        for account in &snapshot.accounts {
            batch.put_cf(accounts, account.id.as_str(), encode(account)?);
        }
        let trustlines = handle(db, CF_TRUSTLINES)?;
        for line in &snapshot.trustlines {
            batch.put_cf(trustlines, trustline_key(line), encode(line)?);
        }
        let offers = handle(db, CF_OFFERS)?;
        for offer in &snapshot.offers {
            batch.put_cf(offers, offer.id.to_be_bytes(), encode(offer)?);
        }
        batch.put_cf(
            handle(db, CF_META)?,
            NEXT_OFFER_ID_KEY,
            encode(&snapshot.next_offer_id)?,
        );

        self.db.write(batch)?;
        *self.current.write().await = Arc::new(ledger);
        Ok(())
    }
}
