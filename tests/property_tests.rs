use ledger_engine::application::executor::TransactionExecutor;
use ledger_engine::config::EngineConfig;
use ledger_engine::domain::amount::Price;
use ledger_engine::domain::asset::Asset;
use ledger_engine::domain::ledger::{Ledger, LedgerSnapshot};
use ledger_engine::domain::offer::OfferFilter;
use ledger_engine::domain::operation::{Operation, Transaction};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod common;
use common::*;

const ACCOUNTS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

fn assets() -> Vec<Asset> {
    vec![Asset::Native, issued("USD", "bank"), issued("EUR", "bank"), issued("GBP", "bank")]
}

fn amount(rng: &mut StdRng) -> Decimal {
    Decimal::new(rng.gen_range(1..5000), 2)
}

fn random_operation(rng: &mut StdRng, ledger: &Ledger, assets: &[Asset]) -> Operation {
    let source = *ACCOUNTS.choose(rng).unwrap();
    let destination = *ACCOUNTS.choose(rng).unwrap();
    let mut pair: Vec<&Asset> = assets.choose_multiple(rng, 3).collect();
    let (a, b, hop) = (pair.remove(0), pair.remove(0), pair.remove(0));

    match rng.gen_range(0..10) {
        0..=2 => pay(source, destination, a, amount(rng)),
        3..=6 => {
            let mut op = offer(
                source,
                a,
                b,
                amount(rng),
                Price::new(rng.gen_range(1..6), rng.gen_range(1..6)).unwrap(),
            );
            op.passive = rng.gen_bool(0.2);
            let own = ledger.list_offers(&OfferFilter::ByAccount(id(source)));
            if let Some(existing) = own.choose(rng)
                && rng.gen_bool(0.3)
            {
                op.existing_offer_id = Some(existing.id);
                op.selling = existing.selling.clone();
                op.buying = existing.buying.clone();
                if rng.gen_bool(0.5) {
                    op.amount = Decimal::ZERO;
                }
            }
            Operation::PlaceOffer(op)
        }
        7 | 8 => {
            let hops = if rng.gen_bool(0.5) { vec![hop.clone()] } else { vec![] };
            strict_send(source, destination, (a, amount(rng)), (b, dec!(0.0000001)), &hops)
        }
        _ => {
            let hops = if rng.gen_bool(0.5) { vec![hop.clone()] } else { vec![] };
            strict_receive(source, destination, (a, dec!(10000)), (b, amount(rng)), &hops)
        }
    }
}

fn supplies(ledger: &Ledger, assets: &[Asset]) -> Vec<Decimal> {
    assets.iter().map(|a| ledger.circulating_supply(a)).collect()
}

#[test]
fn test_random_workload_preserves_invariants() {
    let assets = assets();
    let mut ledger = world(&ACCOUNTS, &assets[1..], dec!(100000), dec!(1000));
    let executor = TransactionExecutor::new(&EngineConfig::default());
    let supply = supplies(&ledger, &assets);
    let mut rng = StdRng::seed_from_u64(7);
    let (mut committed, mut rejected) = (0, 0);

    for _ in 0..400 {
        let count = rng.gen_range(1..=3);
        let operations = (0..count)
            .map(|_| random_operation(&mut rng, &ledger, &assets))
            .collect();
        let source = id(ACCOUNTS.choose(&mut rng).unwrap());
        let tx = Transaction::new(source.clone(), operations);

        let before = LedgerSnapshot::from(&ledger);
        let sequence = ledger.trust.account(&source).unwrap().sequence;
        match executor.apply(&mut ledger, &tx) {
            Ok(result) => {
                committed += 1;
                assert_eq!(result.sequence, sequence + 1);
            }
            Err(_) => {
                rejected += 1;
                assert_eq!(LedgerSnapshot::from(&ledger), before);
            }
        }

        if let Err(violation) = ledger.check_invariants() {
            panic!("{violation} after {tx:?}");
        }
        assert_eq!(supplies(&ledger, &assets), supply);
    }

    assert!(committed > 0, "workload never committed");
    assert!(rejected > 0, "workload never hit an error path");
}

#[test]
fn test_same_seed_same_ledger() {
    let run = |seed: u64| {
        let assets = assets();
        let mut ledger = world(&ACCOUNTS, &assets[1..], dec!(100000), dec!(1000));
        let executor = TransactionExecutor::new(&EngineConfig::default());
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..150 {
            let op = random_operation(&mut rng, &ledger, &assets);
            let tx = Transaction::new(op.source().clone(), vec![op]);
            let _ = executor.apply(&mut ledger, &tx);
        }
        LedgerSnapshot::from(&ledger)
    };
    assert_eq!(run(11), run(11));
}
