#![allow(dead_code)]

use ledger_engine::domain::amount::Price;
use ledger_engine::domain::asset::{AccountId, Asset};
use ledger_engine::domain::ledger::Ledger;
use ledger_engine::domain::operation::{
    EstablishTrust, Operation, PathPaymentStrictReceive, PathPaymentStrictSend, Payment,
    PlaceOffer,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 15] = [
    "tx",
    "op",
    "source",
    "destination",
    "asset",
    "counter_asset",
    "amount",
    "bound",
    "price",
    "passive",
    "offer_id",
    "path",
    "key",
    "value",
    "memo",
];

pub fn id(name: &str) -> AccountId {
    AccountId::new(name).unwrap()
}

pub fn issued(code: &str, issuer: &str) -> Asset {
    Asset::issued(code, id(issuer)).unwrap()
}

pub fn price(n: u32, d: u32) -> Price {
    Price::new(n, d).unwrap()
}

pub fn trust(account: &str, asset: &Asset, limit: Decimal) -> Operation {
    Operation::EstablishTrust(EstablishTrust {
        account: id(account),
        asset: asset.clone(),
        limit,
    })
}

pub fn pay(source: &str, destination: &str, asset: &Asset, amount: Decimal) -> Operation {
    Operation::Payment(Payment {
        source: id(source),
        destination: id(destination),
        asset: asset.clone(),
        amount,
    })
}

pub fn offer(owner: &str, selling: &Asset, buying: &Asset, amount: Decimal, price: Price) -> PlaceOffer {
    PlaceOffer {
        owner: id(owner),
        selling: selling.clone(),
        buying: buying.clone(),
        amount,
        price,
        passive: false,
        existing_offer_id: None,
    }
}

pub fn strict_send(
    source: &str,
    destination: &str,
    send: (&Asset, Decimal),
    receive: (&Asset, Decimal),
    hops: &[Asset],
) -> Operation {
    Operation::PathPaymentStrictSend(PathPaymentStrictSend {
        source: id(source),
        destination: id(destination),
        source_asset: send.0.clone(),
        source_amount: send.1,
        dest_asset: receive.0.clone(),
        dest_min: receive.1,
        hops: hops.to_vec(),
    })
}

pub fn strict_receive(
    source: &str,
    destination: &str,
    send: (&Asset, Decimal),
    receive: (&Asset, Decimal),
    hops: &[Asset],
) -> Operation {
    Operation::PathPaymentStrictReceive(PathPaymentStrictReceive {
        source: id(source),
        destination: id(destination),
        source_asset: send.0.clone(),
        send_max: send.1,
        dest_asset: receive.0.clone(),
        dest_amount: receive.1,
        hops: hops.to_vec(),
    })
}

/// Funds `accounts` with native, trusts every asset of `assets` up to
/// `limit` and credits each line with `balance` straight from its issuer.
pub fn world(accounts: &[&str], assets: &[Asset], limit: Decimal, balance: Decimal) -> Ledger {
    let mut ledger = Ledger::new();
    for asset in assets {
        if let Some(issuer) = asset.issuer()
            && ledger.trust.account(issuer).is_none()
        {
            ledger
                .fund_account(issuer.clone(), Decimal::from(1000))
                .unwrap();
        }
    }
    for name in accounts {
        ledger.fund_account(id(name), balance).unwrap();
        for asset in assets {
            ledger.trust.establish_trust(&id(name), asset, limit).unwrap();
            ledger.trust.credit(&id(name), asset, balance).unwrap();
        }
    }
    ledger
}

/// One payment transaction per row between two pre-funded accounts.
pub fn generate_operations_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    for i in 1..=rows {
        let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
        let tx = i.to_string();
        wtr.write_record([
            tx.as_str(),
            "payment",
            from,
            to,
            "native",
            "",
            "0.0000001",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn generate_genesis_csv(path: &Path, accounts: &[(&str, &str)]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["account", "native"])?;
    for (account, native) in accounts {
        wtr.write_record([*account, *native])?;
    }
    wtr.flush()?;
    Ok(())
}
