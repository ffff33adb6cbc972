use crate::domain::ledger::Ledger;
use crate::error::Result;
use std::io::Write;

/// Writes the ledger state as CSV.
///
/// Decimals are normalized (`1.5`, not `1.5000000`) and rows come out in
/// the ledger's own deterministic order.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per trustline, native balances included.
    pub fn write_balances(&mut self, ledger: &Ledger) -> Result<()> {
        self.writer.write_record([
            "account",
            "asset",
            "balance",
            "limit",
            "selling_liabilities",
            "buying_liabilities",
        ])?;
        for line in ledger.trust.trustlines() {
            self.writer.write_record([
                line.account.to_string(),
                line.asset.to_string(),
                line.balance.normalize().to_string(),
                line.limit.normalize().to_string(),
                line.selling_liabilities.normalize().to_string(),
                line.buying_liabilities.normalize().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// One row per resting offer, in id order.
    pub fn write_offers(&mut self, ledger: &Ledger) -> Result<()> {
        self.writer.write_record([
            "offer_id", "owner", "selling", "buying", "amount", "price", "passive",
        ])?;
        for offer in ledger.offers.iter() {
            self.writer.write_record([
                offer.id.to_string(),
                offer.owner.to_string(),
                offer.selling.to_string(),
                offer.buying.to_string(),
                offer.amount.normalize().to_string(),
                offer.price.to_string(),
                offer.passive.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
