use crate::application::exchange::{Bound, convert};
use crate::domain::amount::validate_amount;
use crate::domain::ledger::Ledger;
use crate::domain::offer::{Market, Offer, OfferId};
use crate::domain::operation::{OfferResult, PlaceOffer};
use crate::error::LedgerError;
use rust_decimal::Decimal;

/// Creates, updates and deletes offers, taking liquidity for active ones.
pub struct OfferMatcher;

impl OfferMatcher {
    /// Places `op` against `ledger`. On error the ledger is unchanged.
    pub fn place_offer(ledger: &mut Ledger, op: &PlaceOffer) -> Result<OfferResult, LedgerError> {
        ledger.atomically(|ledger| Self::apply(ledger, op))
    }

    /// Non-atomic body of [`OfferMatcher::place_offer`]; callers own rollback.
    pub(crate) fn apply(ledger: &mut Ledger, op: &PlaceOffer) -> Result<OfferResult, LedgerError> {
        validate(op)?;
        ledger.trust.require_account(&op.owner)?;

        let existing = match op.existing_offer_id {
            Some(id) => Some(Self::withdraw(ledger, op, id)?),
            None => None,
        };

        if op.amount.is_zero() {
            return Ok(OfferResult {
                was_immediately_deleted: existing.is_some(),
                ..OfferResult::default()
            });
        }

        let conversion = if op.passive {
            Default::default()
        } else {
            Self::check_self_cross(ledger, op)?;
            convert(
                ledger,
                &op.selling,
                &op.buying,
                Bound::Send(op.amount),
                Some(op.price),
            )?
        };

        if !conversion.sent.is_zero() {
            ledger.trust.debit(&op.owner, &op.selling, conversion.sent)?;
            ledger.trust.credit(&op.owner, &op.buying, conversion.received)?;
        }

        let mut remaining = op.amount - conversion.sent;
        if remaining > Decimal::ZERO && !op.passive && Self::still_crosses(ledger, op) {
            // Too little is left to buy one unit from the best offer; resting it
            // would leave the book crossed.
            remaining = Decimal::ZERO;
        }
        let offer_id = if remaining > Decimal::ZERO {
            let (id, sequence) = match &existing {
                Some(previous) => (previous.id, previous.sequence),
                None => {
                    let id = ledger.offers.allocate_id();
                    (id, id)
                }
            };
            let offer = Offer {
                id,
                owner: op.owner.clone(),
                selling: op.selling.clone(),
                buying: op.buying.clone(),
                amount: remaining,
                price: op.price,
                passive: op.passive,
                sequence,
            };
            ledger
                .trust
                .reserve_selling(&op.owner, &op.selling, offer.selling_liabilities())?;
            ledger
                .trust
                .reserve_buying(&op.owner, &op.buying, offer.buying_liabilities()?)?;
            ledger.offers.insert(offer);
            Some(id)
        } else {
            None
        };

        let matched = !conversion.sent.is_zero();
        let result = OfferResult {
            offer_id,
            is_fully_open: !matched && offer_id.is_some(),
            was_partially_filled: matched && offer_id.is_some(),
            was_immediately_filled: offer_id.is_none(),
            was_immediately_deleted: false,
            amount_bought: conversion.received,
            amount_sold: conversion.sent,
            claims: conversion.claims,
        };
        tracing::debug!(
            owner = %op.owner,
            offer_id = ?result.offer_id,
            sold = %result.amount_sold,
            bought = %result.amount_bought,
            "offer placed"
        );
        Ok(result)
    }

    /// Takes an existing offer out of the book and frees its liabilities.
    fn withdraw(ledger: &mut Ledger, op: &PlaceOffer, id: OfferId) -> Result<Offer, LedgerError> {
        match ledger.offers.get(id) {
            Some(offer) if offer.owner == op.owner => {}
            _ => return Err(LedgerError::OfferNotFound(id)),
        }
        let offer = ledger
            .offers
            .remove(id)
            .ok_or(LedgerError::OfferNotFound(id))?;
        ledger
            .trust
            .release_selling(&offer.owner, &offer.selling, offer.selling_liabilities())?;
        ledger
            .trust
            .release_buying(&offer.owner, &offer.buying, offer.buying_liabilities()?)?;
        Ok(offer)
    }

    fn still_crosses(ledger: &Ledger, op: &PlaceOffer) -> bool {
        ledger
            .offers
            .best(&op.buying, &op.selling)
            .is_some_and(|best| op.price.crosses(&best.price))
    }

    /// An active offer must not reach any resting offer of its own owner.
    fn check_self_cross(ledger: &Ledger, op: &PlaceOffer) -> Result<(), LedgerError> {
        let opposite = Market::new(op.selling.clone(), op.buying.clone()).opposite();
        let crosses_own = ledger
            .offers
            .by_owner(&op.owner)
            .any(|resting| resting.market() == opposite && op.price.crosses(&resting.price));
        if crosses_own {
            return Err(LedgerError::SelfCrossNotAllowed);
        }
        Ok(())
    }
}

fn validate(op: &PlaceOffer) -> Result<(), LedgerError> {
    if op.selling == op.buying {
        return Err(LedgerError::validation("offer must trade two distinct assets"));
    }
    op.price.validate()?;
    validate_amount("offer amount", op.amount, true)
}
