use crate::domain::amount::Price;
use crate::domain::asset::{AccountId, Asset, parse_path};
use crate::domain::operation::{
    EstablishTrust, OpaqueDataEntry, Operation, PathPaymentStrictReceive, PathPaymentStrictSend,
    Payment, PlaceOffer, Transaction,
};
use crate::error::{EngineError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::iter::Peekable;
use std::str::FromStr;

/// One row of the operations file. Which columns matter depends on `op`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRecord {
    pub tx: String,
    pub op: String,
    pub source: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub counter_asset: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub bound: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub passive: Option<String>,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// A transaction read from the file, labelled with its `tx` column.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub tx: String,
    pub transaction: Transaction,
}

/// Reads operation rows from a CSV source and groups them into transactions.
///
/// Consecutive rows sharing a `tx` value form one transaction, sourced by the
/// first row's `source`. A row that cannot be understood fails its whole
/// transaction rather than letting the rest of it through.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a new `OperationReader` from any `Read` source.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one item per transaction, in file order.
    pub fn transactions(mut self) -> Batches<R> {
        let headers = self.reader.headers().ok().cloned();
        let tx_column = headers
            .as_ref()
            .and_then(|headers| headers.iter().position(|name| name == "tx"))
            .unwrap_or(0);
        Batches {
            headers,
            tx_column,
            records: self.reader.into_records().peekable(),
        }
    }
}

/// Rows are grouped on the raw `tx` column before any of them is decoded, so
/// an undecodable row still lands in its own transaction.
pub struct Batches<R: Read> {
    headers: Option<csv::StringRecord>,
    tx_column: usize,
    records: Peekable<csv::StringRecordsIntoIter<R>>,
}

impl<R: Read> Iterator for Batches<R> {
    type Item = Result<BatchEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(EngineError::from(e))),
        };
        let column = self.tx_column;
        let tx = first.get(column).unwrap_or_default().to_owned();
        let mut rows = vec![first];
        while let Some(Ok(record)) = self.records.peek()
            && record.get(column) == Some(tx.as_str())
        {
            if let Some(Ok(record)) = self.records.next() {
                rows.push(record);
            }
        }

        let decoded = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                row.deserialize::<OperationRecord>(self.headers.as_ref())
                    .map_err(|e| invalid(&tx, index, EngineError::InvalidRecord(e.to_string())))
            })
            .collect::<Result<Vec<_>>>();
        Some(decoded.and_then(|rows| assemble(tx, rows)))
    }
}

fn assemble(tx: String, rows: Vec<OperationRecord>) -> Result<BatchEntry> {
    let source = account("source", Some(&rows[0].source))
        .map_err(|e| invalid(&tx, 0, e))?;
    let memo = rows.iter().find_map(|row| row.memo.clone());
    let operations = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| Operation::try_from(row).map_err(|e| invalid(&tx, index, e)))
        .collect::<Result<Vec<_>>>()?;

    let mut transaction = Transaction::new(source, operations);
    if let Some(memo) = memo {
        transaction = transaction.with_memo(memo);
    }
    Ok(BatchEntry { tx, transaction })
}

fn invalid(tx: &str, index: usize, error: EngineError) -> EngineError {
    match error {
        EngineError::InvalidRecord(message) => {
            EngineError::InvalidRecord(format!("tx {tx}, row {index}: {message}"))
        }
        other => other,
    }
}

impl TryFrom<OperationRecord> for Operation {
    type Error = EngineError;

    fn try_from(row: OperationRecord) -> Result<Self> {
        let source = account("source", Some(&row.source))?;
        let operation = match row.op.as_str() {
            "trust" => Operation::EstablishTrust(EstablishTrust {
                account: source,
                asset: asset("asset", row.asset.as_ref())?,
                limit: decimal("amount", row.amount.as_ref())?,
            }),
            "payment" => Operation::Payment(Payment {
                source,
                destination: account("destination", row.destination.as_ref())?,
                asset: asset("asset", row.asset.as_ref())?,
                amount: decimal("amount", row.amount.as_ref())?,
            }),
            "offer" => Operation::PlaceOffer(PlaceOffer {
                owner: source,
                selling: asset("asset", row.asset.as_ref())?,
                buying: asset("counter_asset", row.counter_asset.as_ref())?,
                amount: decimal("amount", row.amount.as_ref())?,
                price: parse("price", row.price.as_ref(), Price::from_str)?,
                passive: flag(row.passive.as_ref())?,
                existing_offer_id: row
                    .offer_id
                    .as_ref()
                    .map(|id| parse("offer_id", Some(id), u64::from_str))
                    .transpose()?,
            }),
            "strict_send" => Operation::PathPaymentStrictSend(PathPaymentStrictSend {
                source,
                destination: account("destination", row.destination.as_ref())?,
                source_asset: asset("asset", row.asset.as_ref())?,
                source_amount: decimal("amount", row.amount.as_ref())?,
                dest_asset: asset("counter_asset", row.counter_asset.as_ref())?,
                dest_min: decimal("bound", row.bound.as_ref())?,
                hops: hops(row.path.as_ref())?,
            }),
            "strict_receive" => Operation::PathPaymentStrictReceive(PathPaymentStrictReceive {
                source,
                destination: account("destination", row.destination.as_ref())?,
                source_asset: asset("asset", row.asset.as_ref())?,
                send_max: decimal("bound", row.bound.as_ref())?,
                dest_asset: asset("counter_asset", row.counter_asset.as_ref())?,
                dest_amount: decimal("amount", row.amount.as_ref())?,
                hops: hops(row.path.as_ref())?,
            }),
            "data" => Operation::OpaqueDataEntry(OpaqueDataEntry {
                source,
                key: required("key", row.key.as_ref())?.to_owned(),
                value: row.value.unwrap_or_default(),
            }),
            other => {
                return Err(EngineError::InvalidRecord(format!(
                    "unknown operation `{other}`"
                )));
            }
        };
        Ok(operation)
    }
}

fn required<'a>(field: &str, value: Option<&'a String>) -> Result<&'a str> {
    value
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::InvalidRecord(format!("missing `{field}`")))
}

fn parse<T, E: std::fmt::Display>(
    field: &str,
    value: Option<&String>,
    parser: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> Result<T> {
    let raw = required(field, value)?;
    parser(raw).map_err(|e| EngineError::InvalidRecord(format!("bad `{field}` {raw:?}: {e}")))
}

fn account(field: &str, value: Option<&String>) -> Result<AccountId> {
    parse(field, value, AccountId::from_str)
}

fn asset(field: &str, value: Option<&String>) -> Result<Asset> {
    parse(field, value, Asset::from_str)
}

fn decimal(field: &str, value: Option<&String>) -> Result<Decimal> {
    parse(field, value, Decimal::from_str)
}

fn hops(value: Option<&String>) -> Result<Vec<Asset>> {
    match value {
        Some(path) => parse_path(path)
            .map_err(|e| EngineError::InvalidRecord(format!("bad `path` {path:?}: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn flag(value: Option<&String>) -> Result<bool> {
    match value.map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(EngineError::InvalidRecord(format!(
            "bad `passive` {other:?}"
        ))),
    }
}
