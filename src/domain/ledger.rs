use crate::domain::asset::{AccountId, Asset};
use crate::domain::offer::{Offer, OfferBook, OfferFilter, OfferId};
use crate::domain::trustline::{Account, TrustLedger, TrustLine};
use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The whole accounting state: balances, trustlines and open offers.
///
/// Components receive it by reference; there is no other shared state.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub trust: TrustLedger,
    pub offers: OfferBook,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            trust: TrustLedger::new(),
            offers: OfferBook::new(),
        }
    }

    /// Runs `f` against a scratch copy and keeps the result only if `f` succeeds.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Ledger) -> Result<T, E>) -> Result<T, E> {
        let mut scratch = self.clone();
        let output = f(&mut scratch)?;
        *self = scratch;
        Ok(output)
    }

    /// Genesis funding for accounts created outside the engine.
    pub fn fund_account(&mut self, id: AccountId, native: Decimal) -> Result<(), LedgerError> {
        self.trust.create_account(id, native)
    }

    pub fn get_balance(&self, account: &AccountId, asset: &Asset) -> Result<Decimal, LedgerError> {
        self.trust.get_balance(account, asset)
    }

    pub fn list_offers(&self, filter: &OfferFilter) -> Vec<Offer> {
        self.offers.list(filter)
    }

    pub fn circulating_supply(&self, asset: &Asset) -> Decimal {
        self.trust.circulating_supply(asset)
    }

    /// Checks trustline invariants and that every offer's liabilities are covered.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(line) = self.trust.inconsistent_lines().first() {
            return Err(format!(
                "trustline {}/{} violates its invariants",
                line.account, line.asset
            ));
        }

        let mut selling: std::collections::BTreeMap<(AccountId, Asset), Decimal> =
            Default::default();
        let mut buying: std::collections::BTreeMap<(AccountId, Asset), Decimal> =
            Default::default();
        for offer in self.offers.iter() {
            *selling
                .entry((offer.owner.clone(), offer.selling.clone()))
                .or_default() += offer.selling_liabilities();
            *buying
                .entry((offer.owner.clone(), offer.buying.clone()))
                .or_default() += offer.buying_liabilities().map_err(|e| e.to_string())?;
        }
        for line in self.trust.trustlines() {
            let key = (line.account.clone(), line.asset.clone());
            let expected_selling = selling.get(&key).copied().unwrap_or_default();
            let expected_buying = buying.get(&key).copied().unwrap_or_default();
            if line.selling_liabilities != expected_selling
                || line.buying_liabilities != expected_buying
            {
                return Err(format!(
                    "liabilities of {}/{} do not match its offers",
                    line.account, line.asset
                ));
            }
        }
        Ok(())
    }
}

/// Serializable form of a [`Ledger`], used by persistent stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accounts: Vec<Account>,
    pub trustlines: Vec<TrustLine>,
    pub offers: Vec<Offer>,
    pub next_offer_id: OfferId,
}

impl From<&Ledger> for LedgerSnapshot {
    fn from(ledger: &Ledger) -> Self {
        Self {
            accounts: ledger.trust.accounts().cloned().collect(),
            trustlines: ledger.trust.trustlines().cloned().collect(),
            offers: ledger.offers.iter().cloned().collect(),
            next_offer_id: ledger.offers.next_id(),
        }
    }
}

impl From<LedgerSnapshot> for Ledger {
    fn from(snapshot: LedgerSnapshot) -> Self {
        Self {
            trust: TrustLedger::restore(snapshot.accounts, snapshot.trustlines),
            offers: OfferBook::restore(snapshot.offers, snapshot.next_offer_id),
        }
    }
}
