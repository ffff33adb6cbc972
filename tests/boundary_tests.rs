use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

fn run(genesis: &[(&str, &str)], rows: &[[&str; 15]]) -> assert_cmd::assert::Assert {
    let dir = tempfile::tempdir().unwrap();
    let accounts = dir.path().join("genesis.csv");
    common::generate_genesis_csv(&accounts, genesis).unwrap();

    let operations = dir.path().join("operations.csv");
    let mut wtr = csv::Writer::from_path(&operations).unwrap();
    wtr.write_record(common::HEADER).unwrap();
    for row in rows {
        wtr.write_record(row).unwrap();
    }
    wtr.flush().unwrap();
    drop(wtr);

    Command::new(cargo_bin!("ledger-engine"))
        .arg(&operations)
        .arg("--accounts")
        .arg(&accounts)
        .assert()
}

#[test]
fn test_boundary_numerical_values() {
    let e = "";
    run(
        &[("bank", "0"), ("whale", "1")],
        &[
            ["1", "trust", "whale", e, "USD:bank", e, "922337203685.4775807", e, e, e, e, e, e, e, e],
            ["2", "payment", "bank", "whale", "USD:bank", e, "922337203685.4775807", e, e, e, e, e, e, e, e],
            // One unit over the ceiling is not a valid amount.
            ["3", "trust", "whale", e, "EUR:bank", e, "922337203685.4775808", e, e, e, e, e, e, e, e],
        ],
    )
    .success()
    .stdout(predicate::str::contains(
        "account,asset,balance,limit,selling_liabilities,buying_liabilities",
    ))
    .stdout(predicate::str::contains(
        "whale,USD:bank,922337203685.4775807,922337203685.4775807,0,0",
    ))
    .stdout(predicate::str::contains("EUR:bank").not())
    .stderr(predicate::str::contains("Error processing transaction 3"));
}

#[test]
fn test_extreme_decimal_precision() {
    let e = "";
    run(
        &[("alice", "1"), ("bob", "0")],
        &[
            ["1", "payment", "alice", "bob", "native", e, "0.0000001", e, e, e, e, e, e, e, e],
            ["2", "payment", "alice", "bob", "native", e, "0.0000001", e, e, e, e, e, e, e, e],
            // Finer than seven decimals.
            ["3", "payment", "alice", "bob", "native", e, "0.00000001", e, e, e, e, e, e, e, e],
        ],
    )
    .success()
    .stdout(predicate::str::contains("bob,native,0.0000002,"))
    .stdout(predicate::str::contains("alice,native,0.9999998,"))
    .stderr(predicate::str::contains("Error processing transaction 3"));
}

#[test]
fn test_rounding_favors_the_maker() {
    let e = "";
    // bob sells 1 USD at 1/3 native each; alice spends 0.1 native.
    run(
        &[("bank", "0"), ("alice", "1"), ("bob", "0")],
        &[
            ["1", "trust", "bob", e, "USD:bank", e, "100", e, e, e, e, e, e, e, e],
            ["1", "payment", "bank", "bob", "USD:bank", e, "1", e, e, e, e, e, e, e, e],
            ["2", "trust", "alice", e, "USD:bank", e, "100", e, e, e, e, e, e, e, e],
            ["3", "offer", "bob", e, "USD:bank", "native", "1", e, "1/3", e, e, e, e, e, e],
            ["4", "strict_send", "alice", "alice", "native", "USD:bank", "0.1", "0.0000001", e, e, e, e, e, e, e],
        ],
    )
    .success()
    // 0.1 * 3 = 0.3 exactly; nothing is lost to rounding either way.
    .stdout(predicate::str::contains("alice,USD:bank,0.3,100,0,0"))
    .stdout(predicate::str::contains("alice,native,0.9,"))
    .stdout(predicate::str::contains("bob,native,0.1,"));
}
