//! Taking liquidity from the book.
//!
//! Both the offer matcher and the path payment engine consume resting offers
//! through [`convert`]; only the maker side is settled here, the taker's own
//! balances are the caller's business.

use crate::domain::amount::{Price, Rounding};
use crate::domain::asset::Asset;
use crate::domain::ledger::Ledger;
use crate::domain::offer::{Offer, OfferId};
use crate::domain::operation::ClaimAtom;
use crate::error::LedgerError;
use rust_decimal::Decimal;

/// What limits a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// At most this much of the sent asset may be spent, always at the resting price.
    Send(Decimal),
    /// Exactly this much of the sent asset is spent. A final partial crossing
    /// hands the maker whatever is left of the budget.
    SendAll(Decimal),
    /// At most this much of the received asset is wanted.
    Receive(Decimal),
}

impl Bound {
    fn is_exhausted(&self) -> bool {
        match self {
            Bound::Send(left) | Bound::SendAll(left) | Bound::Receive(left) => {
                *left <= Decimal::ZERO
            }
        }
    }

    fn consume(&mut self, sent: Decimal, received: Decimal) {
        match self {
            Bound::Send(left) | Bound::SendAll(left) => *left -= sent,
            Bound::Receive(left) => *left -= received,
        }
    }
}

/// Outcome of trading one asset for another against the book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub sent: Decimal,
    pub received: Decimal,
    pub claims: Vec<ClaimAtom>,
}

/// Sells `send` for `receive` against the best resting offers until `bound`
/// is met, the book runs dry, or the next offer is worse than `limit`.
///
/// `limit` is the taker's own price (receive per send); `None` takes any price.
pub fn convert(
    ledger: &mut Ledger,
    send: &Asset,
    receive: &Asset,
    mut bound: Bound,
    limit: Option<Price>,
) -> Result<Conversion, LedgerError> {
    let mut conversion = Conversion::default();

    while !bound.is_exhausted() {
        let Some(offer) = ledger.offers.best(receive, send) else {
            break;
        };
        if let Some(limit) = limit
            && !limit.crosses(&offer.price)
        {
            break;
        }
        let offer_id = offer.id;
        let Some(claim) = cross_offer(ledger, offer_id, bound)? else {
            break;
        };

        conversion.sent += claim.amount_bought;
        conversion.received += claim.amount_sold;
        bound.consume(claim.amount_bought, claim.amount_sold);
        conversion.claims.push(claim);
    }

    Ok(conversion)
}

/// Sizes a crossing: `(maker delivers, maker receives)`, rounded in the maker's favor.
///
/// A send-bounded taker that cannot clear the offer buys what its budget
/// affords at the resting price and keeps the change, unless the bound is
/// [`Bound::SendAll`].
fn trade_size(offer: &Offer, bound: Bound) -> Result<(Decimal, Decimal), LedgerError> {
    match bound {
        Bound::Send(max_send) | Bound::SendAll(max_send) => {
            let full_cost = offer.price.mul_amount(offer.amount, Rounding::Up)?;
            if full_cost <= max_send {
                return Ok((offer.amount, full_cost));
            }
            let wheat = offer
                .price
                .div_amount(max_send, Rounding::Down)?
                .min(offer.amount);
            if wheat.is_zero() {
                return Ok((wheat, Decimal::ZERO));
            }
            let sheep = match bound {
                Bound::SendAll(_) => max_send,
                _ => offer.price.mul_amount(wheat, Rounding::Up)?,
            };
            Ok((wheat, sheep))
        }
        Bound::Receive(max_receive) => {
            let wheat = offer.amount.min(max_receive);
            Ok((wheat, offer.price.mul_amount(wheat, Rounding::Up)?))
        }
    }
}

/// Largest part of `rest` the owner can keep resting once the crossing is settled.
///
/// The remainder's buying liability is rounded up on its own, so it may no
/// longer fit the line; the offer then shrinks to what the line absorbs.
fn keepable(ledger: &Ledger, offer: &Offer, rest: Decimal) -> Result<Decimal, LedgerError> {
    if rest.is_zero() {
        return Ok(rest);
    }
    let capacity = ledger.trust.buying_capacity(&offer.owner, &offer.buying)?;
    if offer.price.mul_amount(rest, Rounding::Up)? <= capacity {
        return Ok(rest);
    }
    offer.price.div_amount(capacity, Rounding::Down)
}

/// Crosses a single resting offer and settles its owner.
///
/// Returns `None` when the crossing would deliver nothing (dust).
fn cross_offer(
    ledger: &mut Ledger,
    offer_id: OfferId,
    bound: Bound,
) -> Result<Option<ClaimAtom>, LedgerError> {
    let offer = ledger
        .offers
        .get(offer_id)
        .cloned()
        .ok_or(LedgerError::OfferNotFound(offer_id))?;

    let (wheat, sheep) = trade_size(&offer, bound)?;
    if wheat.is_zero() {
        return Ok(None);
    }

    let owner = &offer.owner;
    ledger
        .trust
        .release_selling(owner, &offer.selling, offer.selling_liabilities())?;
    ledger
        .trust
        .release_buying(owner, &offer.buying, offer.buying_liabilities()?)?;
    ledger.trust.debit(owner, &offer.selling, wheat)?;
    ledger.trust.credit(owner, &offer.buying, sheep)?;

    let kept = keepable(ledger, &offer, offer.amount - wheat)?;
    if kept < offer.amount - wheat {
        tracing::debug!(offer_id, %kept, "offer trimmed to the owner's buying capacity");
    }
    if let Some(rest) = ledger.offers.decrement(offer_id, offer.amount - kept)? {
        let (selling_liability, buying_liability) =
            (rest.selling_liabilities(), rest.buying_liabilities()?);
        ledger
            .trust
            .reserve_selling(owner, &offer.selling, selling_liability)?;
        ledger
            .trust
            .reserve_buying(owner, &offer.buying, buying_liability)?;
    }

    tracing::debug!(
        offer_id,
        seller = %owner,
        sold = %wheat,
        bought = %sheep,
        "offer crossed"
    );

    Ok(Some(ClaimAtom {
        offer_id,
        seller: offer.owner.clone(),
        asset_sold: offer.selling.clone(),
        amount_sold: wheat,
        asset_bought: offer.buying.clone(),
        amount_bought: sheep,
    }))
}
