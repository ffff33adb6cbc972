//! Read-only path discovery.
//!
//! Candidates are enumerated from the markets that currently hold offers and
//! each one is priced by running it against a throwaway copy of the ledger,
//! so a quote reflects exactly what a path payment submitted right now would do.

use crate::application::path_payment::{full_path, receive_along, send_along};
use crate::config::EngineConfig;
use crate::domain::amount::validate_amount;
use crate::domain::asset::Asset;
use crate::domain::ledger::Ledger;
use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One priced route from a source asset to a destination asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathQuote {
    /// Intermediate assets, excluding both ends.
    pub hops: Vec<Asset>,
    pub source_amount: Decimal,
    pub destination_amount: Decimal,
}

type Graph<'a> = BTreeMap<&'a Asset, BTreeSet<&'a Asset>>;

pub struct PathFinder {
    max_hops: usize,
    max_results: usize,
}

impl PathFinder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_hops: config.max_path_hops,
            max_results: config.max_path_results,
        }
    }

    /// Routes for spending exactly `source_amount`, most delivered first.
    pub fn strict_send(
        &self,
        ledger: &Ledger,
        source_asset: &Asset,
        source_amount: Decimal,
        dest_asset: &Asset,
    ) -> Result<Vec<PathQuote>, LedgerError> {
        validate_amount("source amount", source_amount, false)?;
        let mut quotes: Vec<PathQuote> = self
            .candidates(ledger, source_asset, dest_asset)
            .into_iter()
            .filter_map(|hops| {
                let mut scratch = ledger.clone();
                let path = full_path(source_asset, &hops, dest_asset);
                let (received, _) = send_along(&mut scratch, &path, source_amount).ok()?;
                Some(PathQuote {
                    hops,
                    source_amount,
                    destination_amount: received,
                })
            })
            .collect();

        quotes.sort_by(|a, b| {
            b.destination_amount
                .cmp(&a.destination_amount)
                .then(a.hops.len().cmp(&b.hops.len()))
        });
        quotes.truncate(self.max_results);
        Ok(quotes)
    }

    /// Routes for delivering exactly `dest_amount`, cheapest first.
    pub fn strict_receive(
        &self,
        ledger: &Ledger,
        source_asset: &Asset,
        dest_asset: &Asset,
        dest_amount: Decimal,
    ) -> Result<Vec<PathQuote>, LedgerError> {
        validate_amount("destination amount", dest_amount, false)?;
        let mut quotes: Vec<PathQuote> = self
            .candidates(ledger, source_asset, dest_asset)
            .into_iter()
            .filter_map(|hops| {
                let mut scratch = ledger.clone();
                let path = full_path(source_asset, &hops, dest_asset);
                let (needed, _) = receive_along(&mut scratch, &path, dest_amount).ok()?;
                Some(PathQuote {
                    hops,
                    source_amount: needed,
                    destination_amount: dest_amount,
                })
            })
            .collect();

        quotes.sort_by(|a, b| {
            a.source_amount
                .cmp(&b.source_amount)
                .then(a.hops.len().cmp(&b.hops.len()))
        });
        quotes.truncate(self.max_results);
        Ok(quotes)
    }

    /// Simple paths from `source` to `dest`, as hop lists, in deterministic order.
    fn candidates<'a>(&self, ledger: &'a Ledger, source: &'a Asset, dest: &Asset) -> Vec<Vec<Asset>> {
        if source == dest {
            return vec![Vec::new()];
        }
        // A market selling X for Y lets a taker turn Y into X.
        let mut graph: Graph<'a> = BTreeMap::new();
        for market in ledger.offers.markets() {
            graph
                .entry(&market.buying)
                .or_default()
                .insert(&market.selling);
        }

        let mut found = Vec::new();
        let mut trail = vec![source];
        self.walk(&graph, dest, &mut trail, &mut found);
        found
    }

    fn walk<'a>(
        &self,
        graph: &Graph<'a>,
        dest: &Asset,
        trail: &mut Vec<&'a Asset>,
        found: &mut Vec<Vec<Asset>>,
    ) {
        let Some(next) = trail.last().and_then(|current| graph.get(current)) else {
            return;
        };
        for &asset in next {
            if asset == dest {
                found.push(trail[1..].iter().map(|hop| (*hop).clone()).collect());
                continue;
            }
            // `trail` holds the source plus every intermediate so far.
            if trail.len() > self.max_hops || trail.contains(&asset) {
                continue;
            }
            trail.push(asset);
            self.walk(graph, dest, trail, found);
            trail.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::matcher::OfferMatcher;
    use crate::domain::amount::Price;
    use crate::domain::asset::AccountId;
    use crate::domain::ledger::LedgerSnapshot;
    use crate::domain::operation::PlaceOffer;
    use rust_decimal_macros::dec;

    struct Book {
        ledger: Ledger,
        usd: Asset,
        eur: Asset,
        gbp: Asset,
    }

    /// USD→EUR directly at 2 USD per EUR, or via GBP at 1:1 on both legs.
    fn book() -> Book {
        let mut ledger = Ledger::new();
        let bank = AccountId::new("bank").unwrap();
        let mm = AccountId::new("mm").unwrap();
        ledger.fund_account(bank.clone(), dec!(0)).unwrap();
        ledger.fund_account(mm.clone(), dec!(0)).unwrap();
        let usd = Asset::issued("USD", bank.clone()).unwrap();
        let eur = Asset::issued("EUR", bank.clone()).unwrap();
        let gbp = Asset::issued("GBP", bank).unwrap();
        for asset in [&usd, &eur, &gbp] {
            ledger.trust.establish_trust(&mm, asset, dec!(10000)).unwrap();
        }
        ledger.trust.credit(&mm, &eur, dec!(200)).unwrap();
        ledger.trust.credit(&mm, &gbp, dec!(50)).unwrap();

        for (selling, buying, amount, price) in [
            (&eur, &usd, dec!(100), Price::new(2, 1).unwrap()),
            (&gbp, &usd, dec!(50), Price::ONE),
            (&eur, &gbp, dec!(100), Price::ONE),
        ] {
            OfferMatcher::place_offer(
                &mut ledger,
                &PlaceOffer {
                    owner: mm.clone(),
                    selling: selling.clone(),
                    buying: buying.clone(),
                    amount,
                    price,
                    passive: true,
                    existing_offer_id: None,
                },
            )
            .unwrap();
        }
        Book {
            ledger,
            usd,
            eur,
            gbp,
        }
    }

    #[test]
    fn test_strict_send_ranks_by_delivered_amount() {
        let b = book();
        let finder = PathFinder::new(&EngineConfig::default());
        let before = LedgerSnapshot::from(&b.ledger);

        let quotes = finder
            .strict_send(&b.ledger, &b.usd, dec!(40), &b.eur)
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].hops, vec![b.gbp.clone()]);
        assert_eq!(quotes[0].destination_amount, dec!(40));
        assert!(quotes[1].hops.is_empty());
        assert_eq!(quotes[1].destination_amount, dec!(20));
        assert_eq!(LedgerSnapshot::from(&b.ledger), before);
    }

    #[test]
    fn test_strict_send_drops_paths_without_depth() {
        let b = book();
        let finder = PathFinder::new(&EngineConfig::default());
        // The GBP leg only holds 50.
        let quotes = finder
            .strict_send(&b.ledger, &b.usd, dec!(80), &b.eur)
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes[0].hops.is_empty());
        assert_eq!(quotes[0].destination_amount, dec!(40));
    }

    #[test]
    fn test_strict_receive_ranks_by_cost() {
        let b = book();
        let finder = PathFinder::new(&EngineConfig::default());
        let quotes = finder
            .strict_receive(&b.ledger, &b.usd, &b.eur, dec!(10))
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].source_amount, dec!(10));
        assert_eq!(quotes[1].source_amount, dec!(20));
    }

    #[test]
    fn test_hop_and_result_bounds() {
        let b = book();
        let direct_only = PathFinder::new(&EngineConfig {
            max_path_hops: 0,
            ..EngineConfig::default()
        });
        let quotes = direct_only
            .strict_send(&b.ledger, &b.usd, dec!(10), &b.eur)
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes[0].hops.is_empty());

        let single = PathFinder::new(&EngineConfig {
            max_path_results: 1,
            ..EngineConfig::default()
        });
        let quotes = single
            .strict_send(&b.ledger, &b.usd, dec!(10), &b.eur)
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].hops, vec![b.gbp.clone()]);
    }

    #[test]
    fn test_no_route_and_bad_amount() {
        let b = book();
        let finder = PathFinder::new(&EngineConfig::default());
        // Nobody sells USD.
        assert!(
            finder
                .strict_send(&b.ledger, &b.eur, dec!(1), &b.usd)
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            finder.strict_send(&b.ledger, &b.usd, dec!(-1), &b.eur),
            Err(LedgerError::ValidationError(_))
        ));
    }
}
