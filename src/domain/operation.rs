use crate::domain::amount::Price;
use crate::domain::asset::{AccountId, Asset};
use crate::domain::offer::OfferId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishTrust {
    pub account: AccountId,
    pub asset: Asset,
    pub limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub source: AccountId,
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOffer {
    pub owner: AccountId,
    pub selling: Asset,
    pub buying: Asset,
    /// In units of `selling`. Zero deletes `existing_offer_id`.
    pub amount: Decimal,
    pub price: Price,
    pub passive: bool,
    pub existing_offer_id: Option<OfferId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPaymentStrictSend {
    pub source: AccountId,
    pub destination: AccountId,
    pub source_asset: Asset,
    pub source_amount: Decimal,
    pub dest_asset: Asset,
    pub dest_min: Decimal,
    pub hops: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPaymentStrictReceive {
    pub source: AccountId,
    pub destination: AccountId,
    pub source_asset: Asset,
    pub send_max: Decimal,
    pub dest_asset: Asset,
    pub dest_amount: Decimal,
    pub hops: Vec<Asset>,
}

/// Metadata carried through a transaction without touching balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueDataEntry {
    pub source: AccountId,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    EstablishTrust(EstablishTrust),
    Payment(Payment),
    PlaceOffer(PlaceOffer),
    PathPaymentStrictSend(PathPaymentStrictSend),
    PathPaymentStrictReceive(PathPaymentStrictReceive),
    OpaqueDataEntry(OpaqueDataEntry),
}

impl Operation {
    /// The account acting in this operation.
    pub fn source(&self) -> &AccountId {
        match self {
            Operation::EstablishTrust(op) => &op.account,
            Operation::Payment(op) => &op.source,
            Operation::PlaceOffer(op) => &op.owner,
            Operation::PathPaymentStrictSend(op) => &op.source,
            Operation::PathPaymentStrictReceive(op) => &op.source,
            Operation::OpaqueDataEntry(op) => &op.source,
        }
    }
}

/// An ordered batch applied all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Account whose sequence advances when the batch commits.
    pub source: AccountId,
    pub operations: Vec<Operation>,
    /// Free-form note for external auditing; never interpreted.
    pub memo: Option<String>,
}

impl Transaction {
    pub fn new(source: AccountId, operations: Vec<Operation>) -> Self {
        Self {
            source,
            operations,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// One resting offer consumed by a taker, seen from the offer owner's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAtom {
    pub offer_id: OfferId,
    pub seller: AccountId,
    pub asset_sold: Asset,
    pub amount_sold: Decimal,
    pub asset_bought: Asset,
    pub amount_bought: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferResult {
    /// Id of the offer left resting, if any.
    pub offer_id: Option<OfferId>,
    /// The whole amount rests and nothing matched.
    pub is_fully_open: bool,
    /// Some amount matched and the rest rests.
    pub was_partially_filled: bool,
    /// Everything matched; nothing rests.
    pub was_immediately_filled: bool,
    /// An update to zero removed the offer.
    pub was_immediately_deleted: bool,
    pub amount_bought: Decimal,
    pub amount_sold: Decimal,
    pub claims: Vec<ClaimAtom>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPaymentResult {
    pub source_amount: Decimal,
    pub destination_amount: Decimal,
    pub claims: Vec<ClaimAtom>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationResult {
    EstablishTrust,
    Payment { amount: Decimal },
    PlaceOffer(OfferResult),
    PathPaymentStrictSend(PathPaymentResult),
    PathPaymentStrictReceive(PathPaymentResult),
    OpaqueDataEntry { key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub results: Vec<OperationResult>,
    pub memo: Option<String>,
    /// Source account sequence after the commit.
    pub sequence: u64,
}
