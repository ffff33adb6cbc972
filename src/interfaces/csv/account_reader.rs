use crate::domain::asset::AccountId;
use crate::error::{EngineError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// A genesis row: an account and its opening native balance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenesisRecord {
    pub account: AccountId,
    pub native: Decimal,
}

/// Reads genesis accounts from a CSV source with columns `account,native`.
pub struct AccountReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> AccountReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn accounts(self) -> impl Iterator<Item = Result<GenesisRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(EngineError::from))
    }
}
