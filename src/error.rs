use crate::domain::asset::{AccountId, Asset};
use crate::domain::offer::OfferId;
use thiserror::Error;

/// Failure of a single ledger operation.
///
/// Every variant is recoverable by the caller: the enclosing transaction is
/// aborted and the ledger is left exactly as it was before the transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("account {0} does not exist")]
    NoAccount(AccountId),
    #[error("account {account} has no trustline for {asset}")]
    NoTrustline { account: AccountId, asset: Asset },
    #[error("limit for {asset} on {account} is below committed exposure")]
    InsufficientTrust { account: AccountId, asset: Asset },
    #[error("trustline {asset} on {account} cannot receive more")]
    LineFull { account: AccountId, asset: Asset },
    #[error("trustline {asset} on {account} still holds a balance or liabilities")]
    TrustLineNotEmpty { account: AccountId, asset: Asset },
    #[error("account {account} has insufficient spendable {asset}")]
    InsufficientBalance { account: AccountId, asset: Asset },
    #[error("offer {0} not found")]
    OfferNotFound(OfferId),
    #[error("offer would cross a resting offer of the same account")]
    SelfCrossNotAllowed,
    #[error("not enough liquidity selling {selling} for {buying}")]
    InsufficientLiquidity { selling: Asset, buying: Asset },
    #[error("path payment delivers less than the destination minimum")]
    TooFewDestinationAssets,
    #[error("path payment needs more than the source maximum")]
    TooMuchSourceAssets,
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::ValidationError(message.into())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("operation {index} failed: {source}")]
    OperationFailed {
        index: usize,
        #[source]
        source: LedgerError,
    },
    #[error("transaction rejected: {0}")]
    Rejected(LedgerError),
    #[error("query failed: {0}")]
    Query(LedgerError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    /// The ledger failure behind this error, if it came from the engine core.
    pub fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            EngineError::OperationFailed { source, .. } => Some(source),
            EngineError::Rejected(source) | EngineError::Query(source) => Some(source),
            _ => None,
        }
    }

    /// Index of the operation that aborted the transaction.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            EngineError::OperationFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
