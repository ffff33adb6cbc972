use crate::application::exchange::{Bound, convert};
use crate::domain::amount::validate_amount;
use crate::domain::asset::Asset;
use crate::domain::ledger::Ledger;
use crate::domain::operation::{
    ClaimAtom, PathPaymentResult, PathPaymentStrictReceive, PathPaymentStrictSend,
};
use crate::error::LedgerError;
use rust_decimal::Decimal;

/// Converts a payment across zero or more intermediate assets.
///
/// Every hop is a pure taker against the live book. Self-cross rules do not
/// apply: a path payment never rests, so there is nothing to cross.
pub struct PathPaymentEngine {
    max_hops: usize,
}

impl PathPaymentEngine {
    pub fn new(max_hops: usize) -> Self {
        Self { max_hops }
    }

    /// Sends exactly `source_amount`, delivering at least `dest_min`.
    pub fn strict_send(
        &self,
        ledger: &mut Ledger,
        op: &PathPaymentStrictSend,
    ) -> Result<PathPaymentResult, LedgerError> {
        ledger.atomically(|ledger| self.apply_strict_send(ledger, op))
    }

    /// Delivers exactly `dest_amount`, sending at most `send_max`.
    pub fn strict_receive(
        &self,
        ledger: &mut Ledger,
        op: &PathPaymentStrictReceive,
    ) -> Result<PathPaymentResult, LedgerError> {
        ledger.atomically(|ledger| self.apply_strict_receive(ledger, op))
    }

    pub(crate) fn apply_strict_send(
        &self,
        ledger: &mut Ledger,
        op: &PathPaymentStrictSend,
    ) -> Result<PathPaymentResult, LedgerError> {
        validate_amount("source amount", op.source_amount, false)?;
        validate_amount("destination minimum", op.dest_min, false)?;
        self.validate_hops(&op.hops)?;
        ledger.trust.require_account(&op.source)?;
        ledger.trust.require_account(&op.destination)?;

        ledger
            .trust
            .debit(&op.source, &op.source_asset, op.source_amount)?;

        let path = full_path(&op.source_asset, &op.hops, &op.dest_asset);
        let (destination_amount, claims) = send_along(ledger, &path, op.source_amount)?;
        if destination_amount < op.dest_min {
            return Err(LedgerError::TooFewDestinationAssets);
        }

        ledger
            .trust
            .credit(&op.destination, &op.dest_asset, destination_amount)?;

        tracing::debug!(
            source = %op.source,
            destination = %op.destination,
            sent = %op.source_amount,
            received = %destination_amount,
            hops = op.hops.len(),
            "strict send settled"
        );
        Ok(PathPaymentResult {
            source_amount: op.source_amount,
            destination_amount,
            claims,
        })
    }

    pub(crate) fn apply_strict_receive(
        &self,
        ledger: &mut Ledger,
        op: &PathPaymentStrictReceive,
    ) -> Result<PathPaymentResult, LedgerError> {
        validate_amount("send maximum", op.send_max, false)?;
        validate_amount("destination amount", op.dest_amount, false)?;
        self.validate_hops(&op.hops)?;
        ledger.trust.require_account(&op.source)?;
        ledger.trust.require_account(&op.destination)?;

        let path = full_path(&op.source_asset, &op.hops, &op.dest_asset);
        let (source_amount, claims) = receive_along(ledger, &path, op.dest_amount)?;
        if source_amount > op.send_max {
            return Err(LedgerError::TooMuchSourceAssets);
        }

        ledger
            .trust
            .debit(&op.source, &op.source_asset, source_amount)?;
        ledger
            .trust
            .credit(&op.destination, &op.dest_asset, op.dest_amount)?;

        tracing::debug!(
            source = %op.source,
            destination = %op.destination,
            sent = %source_amount,
            received = %op.dest_amount,
            hops = op.hops.len(),
            "strict receive settled"
        );
        Ok(PathPaymentResult {
            source_amount,
            destination_amount: op.dest_amount,
            claims,
        })
    }

    fn validate_hops(&self, hops: &[Asset]) -> Result<(), LedgerError> {
        if hops.len() > self.max_hops {
            return Err(LedgerError::validation(format!(
                "path has {} hops, at most {} allowed",
                hops.len(),
                self.max_hops
            )));
        }
        Ok(())
    }
}

/// `source → hops… → dest` with consecutive repeats collapsed.
pub(crate) fn full_path(source: &Asset, hops: &[Asset], dest: &Asset) -> Vec<Asset> {
    let mut path: Vec<Asset> = Vec::with_capacity(hops.len() + 2);
    for asset in std::iter::once(source).chain(hops).chain(std::iter::once(dest)) {
        if path.last() != Some(asset) {
            path.push(asset.clone());
        }
    }
    path
}

/// Pushes `amount` of `path[0]` through every hop; returns what arrives at the end.
pub(crate) fn send_along(
    ledger: &mut Ledger,
    path: &[Asset],
    amount: Decimal,
) -> Result<(Decimal, Vec<ClaimAtom>), LedgerError> {
    let mut carried = amount;
    let mut claims = Vec::new();
    for hop in path.windows(2) {
        let (send, receive) = (&hop[0], &hop[1]);
        let conversion = convert(ledger, send, receive, Bound::SendAll(carried), None)?;
        if conversion.sent < carried || conversion.received.is_zero() {
            return Err(LedgerError::InsufficientLiquidity {
                selling: receive.clone(),
                buying: send.clone(),
            });
        }
        carried = conversion.received;
        claims.extend(conversion.claims);
    }
    Ok((carried, claims))
}

/// Finds, last hop first, how much of `path[0]` buys exactly `amount` of the last asset.
pub(crate) fn receive_along(
    ledger: &mut Ledger,
    path: &[Asset],
    amount: Decimal,
) -> Result<(Decimal, Vec<ClaimAtom>), LedgerError> {
    let mut needed = amount;
    let mut hops_claims: Vec<Vec<ClaimAtom>> = Vec::new();
    for hop in path.windows(2).rev() {
        let (send, receive) = (&hop[0], &hop[1]);
        let conversion = convert(ledger, send, receive, Bound::Receive(needed), None)?;
        if conversion.received < needed {
            return Err(LedgerError::InsufficientLiquidity {
                selling: receive.clone(),
                buying: send.clone(),
            });
        }
        needed = conversion.sent;
        hops_claims.push(conversion.claims);
    }
    let claims = hops_claims.into_iter().rev().flatten().collect();
    Ok((needed, claims))
}
