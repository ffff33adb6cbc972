use crate::domain::amount::{Price, Rounding};
use crate::domain::asset::{AccountId, Asset};
use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub type OfferId = u64;

/// A resting order: sell `amount` of `selling` for `buying` at `price` (buying per selling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub owner: AccountId,
    pub selling: Asset,
    pub buying: Asset,
    pub amount: Decimal,
    pub price: Price,
    pub passive: bool,
    /// Creation order; kept across updates so an offer never loses time priority.
    pub sequence: u64,
}

impl Offer {
    pub fn market(&self) -> Market {
        Market::new(self.selling.clone(), self.buying.clone())
    }

    pub fn selling_liabilities(&self) -> Decimal {
        self.amount
    }

    pub fn buying_liabilities(&self) -> Result<Decimal, LedgerError> {
        self.price.mul_amount(self.amount, Rounding::Up)
    }
}

/// One direction of an asset pair: offers selling `selling` for `buying`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Market {
    pub selling: Asset,
    pub buying: Asset,
}

impl Market {
    pub fn new(selling: Asset, buying: Asset) -> Self {
        Self { selling, buying }
    }

    pub fn opposite(&self) -> Market {
        Market::new(self.buying.clone(), self.selling.clone())
    }
}

/// Matching priority of a resting offer: price ascending, then creation order.
#[derive(Debug, Clone, Copy)]
struct BookKey {
    price: Price,
    sequence: u64,
    id: OfferId,
}

impl Ord for BookKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp_value(&other.price)
            .then(self.sequence.cmp(&other.sequence))
            .then(self.id.cmp(&other.id))
    }
}

impl PartialEq for BookKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BookKey {}

impl PartialOrd for BookKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&Offer> for BookKey {
    fn from(offer: &Offer) -> Self {
        Self {
            price: offer.price,
            sequence: offer.sequence,
            id: offer.id,
        }
    }
}

/// Read-only selection for offer listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferFilter {
    ByAccount(AccountId),
    ByMarket(Market),
    /// Offers selling or buying the asset.
    ByAsset(Asset),
}

/// Arena of open offers keyed by id, with per-market and per-owner indices.
///
/// The indices are updated on every mutation; nothing outside this type can
/// touch them.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    offers: BTreeMap<OfferId, Offer>,
    markets: BTreeMap<Market, BTreeSet<BookKey>>,
    owners: BTreeMap<AccountId, BTreeSet<OfferId>>,
    next_id: OfferId,
}

impl OfferBook {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Hands out the next offer id, which doubles as the creation sequence.
    pub fn allocate_id(&mut self) -> OfferId {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn next_id(&self) -> OfferId {
        self.next_id.max(1)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn get(&self, id: OfferId) -> Option<&Offer> {
        self.offers.get(&id)
    }

    /// Inserts or replaces an offer, re-indexing it under its current price and market.
    pub fn insert(&mut self, offer: Offer) {
        self.remove(offer.id);
        self.markets
            .entry(offer.market())
            .or_default()
            .insert(BookKey::from(&offer));
        self.owners
            .entry(offer.owner.clone())
            .or_default()
            .insert(offer.id);
        self.offers.insert(offer.id, offer);
    }

    pub fn remove(&mut self, id: OfferId) -> Option<Offer> {
        let offer = self.offers.remove(&id)?;
        let market = offer.market();
        if let Some(keys) = self.markets.get_mut(&market) {
            keys.remove(&BookKey::from(&offer));
            if keys.is_empty() {
                self.markets.remove(&market);
            }
        }
        if let Some(ids) = self.owners.get_mut(&offer.owner) {
            ids.remove(&id);
            if ids.is_empty() {
                self.owners.remove(&offer.owner);
            }
        }
        Some(offer)
    }

    /// Reduces an offer by `by`, removing it once nothing remains.
    ///
    /// Returns the offer as it stands afterwards, or `None` if it was removed.
    pub fn decrement(&mut self, id: OfferId, by: Decimal) -> Result<Option<&Offer>, LedgerError> {
        let offer = self.offers.get_mut(&id).ok_or(LedgerError::OfferNotFound(id))?;
        if by > offer.amount {
            return Err(LedgerError::validation(format!(
                "cannot take {by} from offer {id} holding {}",
                offer.amount
            )));
        }
        // Price and sequence are unchanged, so the book key stays valid.
        offer.amount -= by;
        if offer.amount.is_zero() {
            self.remove(id);
            return Ok(None);
        }
        Ok(self.offers.get(&id))
    }

    /// Best offer selling `selling` for `buying`.
    pub fn best(&self, selling: &Asset, buying: &Asset) -> Option<&Offer> {
        let market = Market::new(selling.clone(), buying.clone());
        self.markets
            .get(&market)
            .and_then(|keys| keys.first())
            .and_then(|key| self.offers.get(&key.id))
    }

    /// Offers of one market in matching priority.
    pub fn market(&self, market: &Market) -> impl Iterator<Item = &Offer> {
        self.markets
            .get(market)
            .into_iter()
            .flat_map(|keys| keys.iter())
            .filter_map(|key| self.offers.get(&key.id))
    }

    /// Offers of one owner in id order.
    pub fn by_owner(&self, owner: &AccountId) -> impl Iterator<Item = &Offer> {
        self.owners
            .get(owner)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.offers.get(id))
    }

    /// Markets that currently hold at least one offer.
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.offers.values()
    }

    pub fn list(&self, filter: &OfferFilter) -> Vec<Offer> {
        match filter {
            OfferFilter::ByAccount(owner) => self.by_owner(owner).cloned().collect(),
            OfferFilter::ByMarket(market) => self.market(market).cloned().collect(),
            OfferFilter::ByAsset(asset) => self
                .iter()
                .filter(|o| &o.selling == asset || &o.buying == asset)
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn restore(offers: Vec<Offer>, next_id: OfferId) -> Self {
        let mut book = Self::new();
        for offer in offers {
            book.next_id = book.next_id.max(offer.id + 1);
            book.insert(offer);
        }
        book.next_id = book.next_id.max(next_id);
        book
    }
}
